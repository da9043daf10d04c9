use std::collections::BTreeSet;

use trk_types::Address;

use crate::error::{reason, LedgerError};

/// Decides who may append steps.
///
/// Holds the producer, fixed at construction, and the set of participants
/// the producer has registered. The producer is not a member of the set; it
/// is authorized through [`AccessRegistry::is_authorized`], the single
/// check every write goes through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRegistry {
    authority: Address,
    authorized: BTreeSet<Address>,
}

impl AccessRegistry {
    /// Create a registry owned by `authority`.
    pub fn new(authority: Address) -> Result<Self, LedgerError> {
        if authority.is_zero() {
            return Err(LedgerError::InvalidArgument(reason::PRODUCER_IS_ZERO));
        }
        Ok(Self {
            authority,
            authorized: BTreeSet::new(),
        })
    }

    /// The producer.
    pub fn authority(&self) -> Address {
        self.authority
    }

    /// Register `participant` on behalf of `caller`.
    ///
    /// Only the producer may register participants. Re-registering an
    /// existing participant succeeds; the return value reports whether the
    /// set actually grew.
    pub fn add_participant(
        &mut self,
        caller: Address,
        participant: Address,
    ) -> Result<bool, LedgerError> {
        self.check_add_participant(caller, participant)?;
        Ok(self.authorized.insert(participant))
    }

    /// Validate an `add_participant` call without applying it.
    pub fn check_add_participant(
        &self,
        caller: Address,
        participant: Address,
    ) -> Result<(), LedgerError> {
        if caller != self.authority {
            return Err(LedgerError::Unauthorized(reason::NOT_PRODUCER));
        }
        if participant.is_zero() {
            return Err(LedgerError::InvalidArgument(reason::PARTICIPANT_IS_ZERO));
        }
        Ok(())
    }

    /// Registry membership only; the producer is not implicitly a member.
    pub fn is_participant(&self, identity: &Address) -> bool {
        self.authorized.contains(identity)
    }

    /// `true` iff `identity` is the producer or a registered participant.
    pub fn is_authorized(&self, identity: &Address) -> bool {
        *identity == self.authority || self.authorized.contains(identity)
    }

    /// Registered participants in address order.
    pub fn participants(&self) -> impl Iterator<Item = &Address> {
        self.authorized.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.authorized.len()
    }
}
