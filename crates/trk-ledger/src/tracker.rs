use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use trk_types::{Address, FixedText, Step, TrackId};

use crate::error::LedgerError;
use crate::event::{EventStream, LedgerEvent};
use crate::ledger::StepLedger;
use crate::registry::AccessRegistry;
use crate::traits::{TrackReader, TrackWriter};

/// Capacity of the broadcast channel feeding [`Tracker::subscribe`].
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// One ledger instance: a producer's participant registry and every track
/// appended under it.
///
/// Registry and tracks sit behind a single `RwLock`. Writers hold the write
/// lock for the whole call, so writes are globally serialized and a step can
/// never observe a half-registered participant. Readers share the read lock
/// and only ever see committed state.
pub struct Tracker {
    inner: RwLock<TrackerState>,
    events: broadcast::Sender<LedgerEvent>,
}

struct TrackerState {
    registry: AccessRegistry,
    ledger: StepLedger,
    journal: Vec<LedgerEvent>,
}

impl Tracker {
    /// Create a ledger around an explicitly constructed registry.
    pub fn new(registry: AccessRegistry) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        info!(producer = %registry.authority(), "tracker created");
        Self {
            inner: RwLock::new(TrackerState {
                registry,
                ledger: StepLedger::new(),
                journal: Vec::new(),
            }),
            events,
        }
    }

    /// Create a ledger owned by `producer`. Fails if `producer` is null.
    pub fn with_producer(producer: Address) -> Result<Self, LedgerError> {
        Ok(Self::new(AccessRegistry::new(producer)?))
    }

    /// Receive every event committed after this call.
    ///
    /// A receiver that falls more than [`EVENT_CHANNEL_CAPACITY`] events
    /// behind observes `RecvError::Lagged`; the full history is always
    /// available from [`TrackReader::journal`].
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    /// Registered participants in address order.
    pub fn participants(&self) -> Result<Vec<Address>, LedgerError> {
        Ok(self.read()?.registry.participants().copied().collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TrackerState>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TrackerState>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    fn commit(
        state: &mut TrackerState,
        events: &broadcast::Sender<LedgerEvent>,
        event: LedgerEvent,
    ) {
        state.journal.push(event.clone());
        // No receivers is not an error; the journal keeps the event.
        let _ = events.send(event);
    }
}

impl TrackWriter for Tracker {
    fn add_participant(&self, caller: Address, participant: Address) -> Result<(), LedgerError> {
        let mut state = self.write()?;

        let added = state
            .registry
            .add_participant(caller, participant)
            .inspect_err(|e| {
                warn!(
                    caller = %caller,
                    participant = %participant,
                    reason = e.reason(),
                    "add_participant rejected"
                );
            })?;

        if added {
            info!(participant = %participant, "participant added");
        } else {
            debug!(participant = %participant, "participant already registered");
        }

        Self::commit(
            &mut state,
            &self.events,
            LedgerEvent::ParticipantAdded { caller, participant },
        );
        Ok(())
    }

    fn add_step(
        &self,
        caller: Address,
        uuid: TrackId,
        action: FixedText,
        timestamp: FixedText,
    ) -> Result<u64, LedgerError> {
        let mut state = self.write()?;
        let TrackerState {
            registry, ledger, ..
        } = &mut *state;

        let count = ledger
            .append(registry, caller, uuid, action, timestamp)
            .inspect_err(|e| {
                warn!(
                    caller = %caller,
                    uuid = %uuid,
                    reason = e.reason(),
                    "add_step rejected"
                );
            })?;
        let index = count - 1;

        debug!(uuid = %uuid, participant = %caller, action = %action, index, "step added");

        Self::commit(
            &mut state,
            &self.events,
            LedgerEvent::StepAdded {
                uuid,
                participant: caller,
                action,
                timestamp,
                index,
                count,
            },
        );
        Ok(index)
    }
}

impl TrackReader for Tracker {
    fn producer(&self) -> Address {
        // The producer never changes, but it lives with the rest of the
        // registry; a poisoned lock still holds a valid value.
        match self.inner.read() {
            Ok(state) => state.registry.authority(),
            Err(poisoned) => poisoned.into_inner().registry.authority(),
        }
    }

    fn is_participant(&self, identity: &Address) -> Result<bool, LedgerError> {
        Ok(self.read()?.registry.is_participant(identity))
    }

    fn is_authorized(&self, identity: &Address) -> Result<bool, LedgerError> {
        Ok(self.read()?.registry.is_authorized(identity))
    }

    fn tracks(&self, uuid: &TrackId) -> Result<u64, LedgerError> {
        Ok(self.read()?.ledger.count(uuid))
    }

    fn get_step(&self, uuid: &TrackId, index: u64) -> Result<Step, LedgerError> {
        self.read()?.ledger.get(uuid, index)
    }

    fn read_track(&self, uuid: &TrackId) -> Result<Vec<Step>, LedgerError> {
        Ok(self.read()?.ledger.steps(uuid))
    }

    fn track_ids(&self) -> Result<Vec<TrackId>, LedgerError> {
        Ok(self.read()?.ledger.track_ids())
    }

    fn journal(&self) -> Result<Vec<LedgerEvent>, LedgerError> {
        Ok(self.read()?.journal.clone())
    }
}
