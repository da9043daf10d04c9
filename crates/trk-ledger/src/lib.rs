//! Append-only, access-controlled step ledger for the provenance tracker.
//!
//! This crate is the heart of `trk`. It provides:
//! - `AccessRegistry`: the producer and the set of participants allowed to append
//! - `StepLedger`: per-identifier append-only tracks of steps
//! - `Tracker`: one ledger instance owning both behind a single lock
//! - `TrackWriter` / `TrackReader` trait boundaries
//! - `LedgerEvent` journal and broadcast subscription
//! - Deterministic replay of a journal into a fresh instance

pub mod error;
pub mod event;
pub mod ledger;
pub mod registry;
pub mod replay;
pub mod tracker;
pub mod traits;

pub use error::LedgerError;
pub use event::{EventStream, LedgerEvent};
pub use ledger::StepLedger;
pub use registry::AccessRegistry;
pub use replay::ReplayResult;
pub use tracker::Tracker;
pub use traits::{TrackReader, TrackWriter};
