use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};
use trk_ledger::{Tracker, TrackReader, TrackWriter};
use trk_types::{Address, FixedText, TrackId};

use crate::cli::*;
use crate::config::CliConfig;
use crate::journal;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config.as_path();
    let format = &cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(config, args),
        Command::AddParticipant(args) => cmd_add_participant(config, args),
        Command::AddStep(args) => cmd_add_step(config, args),
        Command::Trace(args) => cmd_trace(config, format, args),
        Command::Count(args) => cmd_count(config, format, args),
        Command::Producer => cmd_producer(config, format),
        Command::IsParticipant(args) => cmd_is_participant(config, format, args),
        Command::Mint => cmd_mint(format),
    }
}

/// A tracker rebuilt from its journal, plus where to persist new events.
///
/// The journal lock is held for the lifetime of the deployment.
pub(crate) struct Deployment {
    pub tracker: Tracker,
    journal: PathBuf,
    persisted: usize,
    _lock: journal::JournalLock,
}

impl Deployment {
    /// Open for reading under a shared journal lock.
    pub fn open(config_path: &Path) -> anyhow::Result<Self> {
        Self::open_with(config_path, journal::lock_shared)
    }

    /// Open for a write under an exclusive journal lock, held until drop.
    pub fn open_for_write(config_path: &Path) -> anyhow::Result<Self> {
        Self::open_with(config_path, journal::lock_exclusive)
    }

    fn open_with(
        config_path: &Path,
        lock: fn(&Path) -> anyhow::Result<journal::JournalLock>,
    ) -> anyhow::Result<Self> {
        let config = CliConfig::load(config_path)?;
        let journal = config.journal_path(config_path);
        let guard = lock(&journal)?;
        let events = journal::load(&journal)?;
        let replayed = Tracker::replay(config.producer, &events)
            .with_context(|| format!("replaying journal {}", journal.display()))?;
        debug!(journal = %journal.display(), events = replayed.events_applied, "journal replayed");
        Ok(Self {
            tracker: replayed.tracker,
            journal,
            persisted: replayed.events_applied,
            _lock: guard,
        })
    }

    /// Write events committed since `open` to the journal.
    pub fn persist(&mut self) -> anyhow::Result<()> {
        let events = self.tracker.journal()?;
        let fresh = &events[self.persisted..];
        journal::append(&self.journal, fresh)?;
        info!(journal = %self.journal.display(), written = fresh.len(), "journal appended");
        self.persisted = events.len();
        Ok(())
    }
}

/// 64 hex digits, with or without a `0x`/`0X` prefix, are taken as a track
/// id verbatim; anything else is a label hashed with [`TrackId::derive`].
pub(crate) fn parse_track_id(input: &str) -> anyhow::Result<TrackId> {
    if input.is_empty() {
        return Ok(TrackId::ZERO);
    }
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.len() == 64 && digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(TrackId::from_hex(digits)?);
    }
    Ok(TrackId::derive(input))
}

fn parse_address(input: &str) -> anyhow::Result<Address> {
    Address::from_hex(input).with_context(|| format!("invalid address {input:?}"))
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn show(text: &FixedText) -> String {
    text.decode().unwrap_or_else(|_| text.to_hex())
}

fn cmd_init(config_path: &Path, args: InitArgs) -> anyhow::Result<()> {
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }
    let producer = parse_address(&args.producer)?;
    Tracker::with_producer(producer)?;

    let config = CliConfig::new(producer, args.journal);
    let journal = config.journal_path(config_path);
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&journal)
        .with_context(|| format!("creating journal {}", journal.display()))?;
    config.save(config_path)?;

    println!(
        "{} Initialized tracker in {}",
        "✓".green().bold(),
        config_path.display().to_string().bold()
    );
    println!("  Producer: {}", producer.to_string().cyan());
    println!("  Journal: {}", journal.display());
    Ok(())
}

fn cmd_add_participant(config_path: &Path, args: AddParticipantArgs) -> anyhow::Result<()> {
    let caller = parse_address(&args.from)?;
    let participant = parse_address(&args.participant)?;

    let mut deployment = Deployment::open_for_write(config_path)?;
    deployment.tracker.add_participant(caller, participant)?;
    deployment.persist()?;

    println!(
        "{} Participant added: {}",
        "✓".green().bold(),
        participant.to_string().cyan()
    );
    Ok(())
}

fn cmd_add_step(config_path: &Path, args: AddStepArgs) -> anyhow::Result<()> {
    let caller = parse_address(&args.from)?;
    let uuid = parse_track_id(&args.uuid)?;
    let action = FixedText::encode(&args.action).context("action")?;
    let timestamp = args.timestamp.unwrap_or_else(now_timestamp);
    let timestamp = FixedText::encode(&timestamp).context("timestamp")?;

    let mut deployment = Deployment::open_for_write(config_path)?;
    let index = deployment.tracker.add_step(caller, uuid, action, timestamp)?;
    deployment.persist()?;

    println!(
        "{} Step {} recorded for {} ({})",
        "✓".green().bold(),
        format!("#{index}").yellow(),
        args.uuid.bold(),
        uuid.short_id().dimmed(),
    );
    println!("  {} @ {}", action.to_string().cyan(), show(&timestamp));
    Ok(())
}

#[derive(Serialize)]
struct TraceStep {
    participant: Address,
    action: String,
    timestamp: String,
}

#[derive(Serialize)]
struct TraceEntry {
    uuid: String,
    track_id: TrackId,
    count: u64,
    steps: Vec<TraceStep>,
}

fn trace(tracker: &Tracker, uuids: &[String]) -> anyhow::Result<Vec<TraceEntry>> {
    uuids
        .iter()
        .map(|label| -> anyhow::Result<TraceEntry> {
            let track_id = parse_track_id(label)?;
            let steps = tracker.read_track(&track_id)?;
            Ok(TraceEntry {
                uuid: label.clone(),
                track_id,
                count: steps.len() as u64,
                steps: steps
                    .iter()
                    .map(|s| TraceStep {
                        participant: s.participant,
                        action: show(&s.action),
                        timestamp: show(&s.timestamp),
                    })
                    .collect(),
            })
        })
        .collect()
}

fn cmd_trace(config_path: &Path, format: &OutputFormat, args: TraceArgs) -> anyhow::Result<()> {
    if args.uuids.is_empty() {
        println!("No UUIDs provided, nothing to track.");
        return Ok(());
    }

    let deployment = Deployment::open(config_path)?;
    let entries = trace(&deployment.tracker, &args.uuids)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in &entries {
                println!(
                    "{} ({}) — {} step(s)",
                    entry.uuid.bold(),
                    entry.track_id.short_id().dimmed(),
                    entry.count.to_string().bold(),
                );
                for (i, step) in entry.steps.iter().enumerate() {
                    println!(
                        "  {} {}  {}  by {}",
                        format!("#{i}").yellow(),
                        step.timestamp.dimmed(),
                        step.action.cyan(),
                        step.participant,
                    );
                }
            }
        }
    }
    Ok(())
}

fn cmd_count(config_path: &Path, format: &OutputFormat, args: CountArgs) -> anyhow::Result<()> {
    let deployment = Deployment::open(config_path)?;
    let count = deployment.tracker.tracks(&parse_track_id(&args.uuid)?)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "uuid": args.uuid, "count": count })
        ),
        OutputFormat::Text => println!("{count}"),
    }
    Ok(())
}

fn cmd_producer(config_path: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let deployment = Deployment::open(config_path)?;
    let producer = deployment.tracker.producer();
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "producer": producer })),
        OutputFormat::Text => println!("{producer}"),
    }
    Ok(())
}

fn cmd_is_participant(
    config_path: &Path,
    format: &OutputFormat,
    args: IsParticipantArgs,
) -> anyhow::Result<()> {
    let address = parse_address(&args.address)?;
    let deployment = Deployment::open(config_path)?;
    let member = deployment.tracker.is_participant(&address)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "address": address, "participant": member })
        ),
        OutputFormat::Text if member => println!("{} {} is a participant", "✓".green(), address),
        OutputFormat::Text => println!("{} {} is not a participant", "✗".red(), address),
    }
    Ok(())
}

fn cmd_mint(format: &OutputFormat) -> anyhow::Result<()> {
    let uuid = uuid::Uuid::now_v7();
    let track_id = TrackId::from_uuid(&uuid);
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "uuid": uuid.to_string(), "track_id": track_id })
        ),
        OutputFormat::Text => println!("{uuid}  {}", track_id.to_hex().dimmed()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use trk_ledger::LedgerEvent;

    const PRODUCER: &str = "0x1111111111111111111111111111111111111111";
    const PACKER: &str = "0x2222222222222222222222222222222222222222";

    fn run(config: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["trk", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn initialized() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("trk.toml");
        run(&config, &["init", "--producer", PRODUCER]).unwrap();
        (dir, config)
    }

    #[test]
    fn parse_track_id_hashes_labels_and_accepts_hex() {
        let id = TrackId::derive("box-1");
        assert_eq!(parse_track_id("box-1").unwrap(), id);
        assert_eq!(parse_track_id(&id.to_hex()).unwrap(), id);
        assert!(parse_track_id("").unwrap().is_empty());
    }

    #[test]
    fn parse_track_id_accepts_every_hex_form() {
        let id = TrackId::derive("box-1");
        let bare = id.to_hex().trim_start_matches("0x").to_owned();
        assert_eq!(parse_track_id(&bare).unwrap(), id);
        assert_eq!(parse_track_id(&format!("0X{bare}")).unwrap(), id);
        assert_eq!(parse_track_id(&bare.to_uppercase()).unwrap(), id);
        // 64 characters that are not all hex remain a label.
        let label = "g".repeat(64);
        assert_eq!(parse_track_id(&label).unwrap(), TrackId::derive(&label));
    }

    #[test]
    fn parallel_writers_keep_the_journal_replayable() {
        use std::thread;

        let (dir, config) = initialized();
        let handles: Vec<_> = (0..8)
            .map(|w| {
                let config = config.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        let action = format!("W{w}_STEP_{i}");
                        run(&config, &["add-step", "--from", PRODUCER, "box-1", action.as_str()])
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let deployment = Deployment::open(&config).unwrap();
        let uuid = TrackId::derive("box-1");
        assert_eq!(deployment.tracker.tracks(&uuid).unwrap(), 80);

        let indices: Vec<u64> = journal::load(&dir.path().join("trk-journal.jsonl"))
            .unwrap()
            .into_iter()
            .filter_map(|event| match event {
                LedgerEvent::StepAdded { index, .. } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, (0..80).collect::<Vec<u64>>());
    }

    #[test]
    fn init_writes_config_and_journal() {
        let (dir, config) = initialized();
        assert!(dir.path().join("trk-journal.jsonl").exists());
        let loaded = CliConfig::load(&config).unwrap();
        assert_eq!(loaded.producer, Address::from_hex(PRODUCER).unwrap());
    }

    #[test]
    fn init_refuses_existing_config() {
        let (_dir, config) = initialized();
        assert!(run(&config, &["init", "--producer", PRODUCER]).is_err());
    }

    #[test]
    fn init_rejects_null_producer() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("trk.toml");
        let zero = format!("0x{}", "00".repeat(20));
        let err = run(&config, &["init", "--producer", zero.as_str()]).unwrap_err();
        assert!(err.to_string().contains("producer is zero"));
        assert!(!config.exists());
    }

    #[test]
    fn writes_survive_reopen() {
        let (_dir, config) = initialized();
        run(&config, &["add-participant", "--from", PRODUCER, PACKER]).unwrap();
        run(
            &config,
            &[
                "add-step",
                "--from",
                PRODUCER,
                "box-1",
                "FISH_CAUGHT",
                "--timestamp",
                "2016-06-03T03:56:39Z",
            ],
        )
        .unwrap();
        run(&config, &["add-step", "--from", PACKER, "box-1", "PACKED"]).unwrap();

        let deployment = Deployment::open(&config).unwrap();
        let uuid = TrackId::derive("box-1");
        assert_eq!(deployment.tracker.tracks(&uuid).unwrap(), 2);

        let entries = trace(&deployment.tracker, &["box-1".into(), "box-2".into()]).unwrap();
        assert_eq!(entries[0].count, 2);
        assert_eq!(entries[0].steps[0].action, "FISH_CAUGHT");
        assert_eq!(entries[0].steps[0].timestamp, "2016-06-03T03:56:39Z");
        assert_eq!(entries[0].steps[1].participant, Address::from_hex(PACKER).unwrap());
        assert!(entries[0].steps[1].timestamp.ends_with('Z'));
        assert_eq!(entries[1].count, 0);
    }

    #[test]
    fn rejected_write_is_not_journalled() {
        let (dir, config) = initialized();
        assert!(run(&config, &["add-step", "--from", PACKER, "box-1", "PACKED"]).is_err());
        assert!(run(&config, &["add-participant", "--from", PACKER, PACKER]).is_err());
        assert!(journal::load(&dir.path().join("trk-journal.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn oversized_action_is_rejected_before_opening() {
        let (_dir, config) = initialized();
        let long = "X".repeat(33);
        assert!(run(&config, &["add-step", "--from", PRODUCER, "box-1", long.as_str()]).is_err());
    }

    #[test]
    fn read_commands_succeed() {
        let (_dir, config) = initialized();
        run(&config, &["trace"]).unwrap();
        run(&config, &["trace", "box-1"]).unwrap();
        run(&config, &["--format", "json", "count", "box-1"]).unwrap();
        run(&config, &["producer"]).unwrap();
        run(&config, &["is-participant", PACKER]).unwrap();
        run(&config, &["mint"]).unwrap();
    }
}
