//! Foundation types for the provenance tracker.
//!
//! Every other `trk` crate depends on `trk-types`.
//!
//! # Key Types
//!
//! - [`Address`] — 20-byte participant identity; the all-zero address is null
//! - [`TrackId`] — 32-byte opaque key naming one tracked item or batch
//! - [`FixedText`] — 32-byte right-zero-padded text buffer for step fields
//! - [`Step`] — one immutable step record within a track

pub mod address;
pub mod error;
pub mod step;
pub mod text;
pub mod track;

pub use address::Address;
pub use error::TypeError;
pub use step::Step;
pub use text::FixedText;
pub use track::TrackId;
