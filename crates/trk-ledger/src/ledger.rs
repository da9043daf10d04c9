use std::collections::HashMap;

use trk_types::{Address, FixedText, Step, TrackId};

use crate::error::{reason, LedgerError};
use crate::registry::AccessRegistry;

/// Per-identifier append-only tracks of steps.
///
/// Tracks only grow. Index 0 is the earliest step and insertion order is
/// never changed. Steps are handed out by value.
#[derive(Clone, Debug, Default)]
pub struct StepLedger {
    tracks: HashMap<TrackId, Vec<Step>>,
}

impl StepLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an append without applying it.
    ///
    /// Checks run in a fixed order: identifier, authorization, action,
    /// timestamp. The first failure wins.
    pub fn check_append(
        registry: &AccessRegistry,
        caller: Address,
        uuid: TrackId,
        action: FixedText,
        timestamp: FixedText,
    ) -> Result<(), LedgerError> {
        if uuid.is_empty() {
            return Err(LedgerError::InvalidArgument(reason::UUID_IS_EMPTY));
        }
        if !registry.is_authorized(&caller) {
            return Err(LedgerError::Unauthorized(reason::NOT_PARTICIPANT));
        }
        if action.is_empty() {
            return Err(LedgerError::InvalidArgument(reason::ACTION_IS_EMPTY));
        }
        if timestamp.is_empty() {
            return Err(LedgerError::InvalidArgument(reason::TIMESTAMP_IS_EMPTY));
        }
        Ok(())
    }

    /// Append a step attributed to `caller`, returning the new track length.
    pub fn append(
        &mut self,
        registry: &AccessRegistry,
        caller: Address,
        uuid: TrackId,
        action: FixedText,
        timestamp: FixedText,
    ) -> Result<u64, LedgerError> {
        Self::check_append(registry, caller, uuid, action, timestamp)?;
        let track = self.tracks.entry(uuid).or_default();
        track.push(Step::new(caller, action, timestamp));
        Ok(track.len() as u64)
    }

    /// Number of steps recorded for `uuid`; 0 for an unseen identifier.
    pub fn count(&self, uuid: &TrackId) -> u64 {
        self.tracks.get(uuid).map_or(0, |t| t.len() as u64)
    }

    pub fn get(&self, uuid: &TrackId, index: u64) -> Result<Step, LedgerError> {
        let count = self.count(uuid);
        if index >= count {
            return Err(LedgerError::OutOfRange { index, count });
        }
        // index < count implies the track exists and the cast fits.
        self.tracks
            .get(uuid)
            .and_then(|t| t.get(index as usize))
            .copied()
            .ok_or(LedgerError::OutOfRange { index, count })
    }

    /// Every step for `uuid`, earliest first.
    pub fn steps(&self, uuid: &TrackId) -> Vec<Step> {
        self.tracks.get(uuid).cloned().unwrap_or_default()
    }

    /// Identifiers with at least one step, in byte order.
    pub fn track_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<_> = self.tracks.keys().copied().collect();
        ids.sort();
        ids
    }
}
