use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "trk",
    about = "Provenance tracker — append-only supply-chain step ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Path to the tracker configuration file
    #[arg(long, global = true, default_value = "trk.toml")]
    pub config: PathBuf,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a tracker owned by a producer
    Init(InitArgs),
    /// Register a participant (producer only)
    AddParticipant(AddParticipantArgs),
    /// Append a step to an item's track
    AddStep(AddStepArgs),
    /// Print the full step history of one or more items
    Trace(TraceArgs),
    /// Print the number of steps recorded for an item
    Count(CountArgs),
    /// Print the producer address
    Producer,
    /// Check whether an address is a registered participant
    IsParticipant(IsParticipantArgs),
    /// Generate a fresh item UUID and its track id
    Mint,
}

#[derive(Args)]
pub struct InitArgs {
    #[arg(long)]
    pub producer: String,
    #[arg(long)]
    pub journal: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddParticipantArgs {
    /// Calling address
    #[arg(long)]
    pub from: String,
    pub participant: String,
}

#[derive(Args)]
pub struct AddStepArgs {
    /// Calling address
    #[arg(long)]
    pub from: String,
    /// Item label, hashed into a track id; 64 hex digits (optionally
    /// 0x-prefixed) are used as the track id directly
    pub uuid: String,
    pub action: String,
    /// Defaults to the current UTC time
    #[arg(long)]
    pub timestamp: Option<String>,
}

#[derive(Args)]
pub struct TraceArgs {
    pub uuids: Vec<String>,
}

#[derive(Args)]
pub struct CountArgs {
    pub uuid: String,
}

#[derive(Args)]
pub struct IsParticipantArgs {
    pub address: String,
}
