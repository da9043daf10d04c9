use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::text::FixedText;

/// One immutable event in a track, attributed to the identity that
/// appended it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// Who appended the step.
    pub participant: Address,
    /// Event name, e.g. `PACKED`.
    pub action: FixedText,
    /// Caller-supplied timestamp text, e.g. `2020-01-01T00:00:00Z`.
    pub timestamp: FixedText,
}

impl Step {
    pub fn new(participant: Address, action: FixedText, timestamp: FixedText) -> Self {
        Self {
            participant,
            action,
            timestamp,
        }
    }
}
