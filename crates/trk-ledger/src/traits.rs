use trk_types::{Address, FixedText, Step, TrackId};

use crate::error::LedgerError;
use crate::event::LedgerEvent;

/// Write boundary for ledger mutations.
///
/// `caller` is the authenticated identity making the call. Implementations
/// serialize writes: each call runs to completion before the next one
/// observes state, and a failed call leaves state untouched.
pub trait TrackWriter: Send + Sync {
    fn add_participant(&self, caller: Address, participant: Address) -> Result<(), LedgerError>;

    /// Append a step and return its zero-based index within the track.
    fn add_step(
        &self,
        caller: Address,
        uuid: TrackId,
        action: FixedText,
        timestamp: FixedText,
    ) -> Result<u64, LedgerError>;
}

/// Read boundary for ledger queries. Readers only see committed writes.
pub trait TrackReader: Send + Sync {
    fn producer(&self) -> Address;

    /// Registry membership; the producer is not implicitly a participant.
    fn is_participant(&self, identity: &Address) -> Result<bool, LedgerError>;

    /// Producer or registered participant.
    fn is_authorized(&self, identity: &Address) -> Result<bool, LedgerError>;

    /// Step count for `uuid`.
    fn tracks(&self, uuid: &TrackId) -> Result<u64, LedgerError>;

    fn get_step(&self, uuid: &TrackId, index: u64) -> Result<Step, LedgerError>;

    /// All steps for `uuid`, earliest first, from one consistent snapshot.
    fn read_track(&self, uuid: &TrackId) -> Result<Vec<Step>, LedgerError>;

    fn track_ids(&self) -> Result<Vec<TrackId>, LedgerError>;

    /// Every event emitted so far, in commit order.
    fn journal(&self) -> Result<Vec<LedgerEvent>, LedgerError>;
}
