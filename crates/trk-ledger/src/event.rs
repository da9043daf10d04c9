use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use trk_types::{Address, FixedText, TrackId};

/// A broadcast channel receiver for ledger events.
pub type EventStream = broadcast::Receiver<LedgerEvent>;

/// Observable record of one successful write.
///
/// Exactly one event is produced per successful `add_participant` or
/// `add_step`; failed calls produce none. The ordered sequence of events is
/// the ledger's journal and is sufficient to rebuild its state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    ParticipantAdded {
        /// The producer that made the registration.
        caller: Address,
        participant: Address,
    },
    StepAdded {
        uuid: TrackId,
        participant: Address,
        action: FixedText,
        timestamp: FixedText,
        /// Zero-based position of the new step in its track.
        index: u64,
        /// Track length after the append (`index + 1`).
        count: u64,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParticipantAdded { .. } => "ParticipantAdded",
            Self::StepAdded { .. } => "StepAdded",
        }
    }
}

impl std::fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParticipantAdded { participant, .. } => {
                write!(f, "ParticipantAdded({participant})")
            }
            Self::StepAdded {
                uuid,
                participant,
                action,
                index,
                ..
            } => write!(f, "StepAdded({uuid}#{index} {action} by {participant})"),
        }
    }
}
