/// Stable reason strings reported with ledger errors.
pub mod reason {
    pub const PRODUCER_IS_ZERO: &str = "producer is zero";
    pub const NOT_PRODUCER: &str = "msg.sender is not producer";
    pub const PARTICIPANT_IS_ZERO: &str = "participant is zero";
    pub const UUID_IS_EMPTY: &str = "uuid is empty";
    pub const NOT_PARTICIPANT: &str = "msg.sender is not participant";
    pub const ACTION_IS_EMPTY: &str = "action is empty";
    pub const TIMESTAMP_IS_EMPTY: &str = "timestamp is empty";
    pub const INDEX_OUT_OF_RANGE: &str = "index out of range";
}

/// Errors produced by ledger operations.
///
/// A call that returns an error has changed nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A required field is null or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The caller lacks the role the operation requires.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("index out of range: index {index}, count {count}")]
    OutOfRange { index: u64, count: u64 },

    /// A journalled event does not agree with what replaying it produced.
    #[error("integrity violation at event {position}: {reason}")]
    Integrity { position: usize, reason: String },

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// The stable, human-readable reason for this error.
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidArgument(why) | Self::Unauthorized(why) => *why,
            Self::OutOfRange { .. } => reason::INDEX_OUT_OF_RANGE,
            Self::Integrity { reason, .. } => reason.as_str(),
            Self::LockPoisoned => "ledger lock poisoned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_the_bare_condition() {
        assert_eq!(
            LedgerError::InvalidArgument(reason::UUID_IS_EMPTY).reason(),
            "uuid is empty"
        );
        assert_eq!(
            LedgerError::Unauthorized(reason::NOT_PRODUCER).reason(),
            "msg.sender is not producer"
        );
        assert_eq!(
            LedgerError::OutOfRange { index: 3, count: 3 }.reason(),
            "index out of range"
        );
    }

    #[test]
    fn display_carries_category() {
        let err = LedgerError::Unauthorized(reason::NOT_PARTICIPANT);
        assert_eq!(err.to_string(), "unauthorized: msg.sender is not participant");
    }
}
