use tracing::info;
use trk_types::Address;

use crate::error::LedgerError;
use crate::event::LedgerEvent;
use crate::tracker::Tracker;
use crate::traits::TrackWriter;

/// Outcome of a successful replay.
pub struct ReplayResult {
    pub tracker: Tracker,
    pub events_applied: usize,
}

impl Tracker {
    /// Rebuild a ledger by re-running a journal through the normal write
    /// path.
    ///
    /// Each event is re-issued by the caller it records, so every admission
    /// and field check is applied again and a journal written under one
    /// producer fails to load under another. A step whose recorded position
    /// disagrees with where it lands on replay is an integrity violation.
    pub fn replay(producer: Address, events: &[LedgerEvent]) -> Result<ReplayResult, LedgerError> {
        let tracker = Tracker::with_producer(producer)?;

        for (position, event) in events.iter().enumerate() {
            match event {
                LedgerEvent::ParticipantAdded {
                    caller,
                    participant,
                } => {
                    tracker
                        .add_participant(*caller, *participant)
                        .map_err(|e| integrity(position, &e))?;
                }
                LedgerEvent::StepAdded {
                    uuid,
                    participant,
                    action,
                    timestamp,
                    index,
                    count,
                } => {
                    let replayed = tracker
                        .add_step(*participant, *uuid, *action, *timestamp)
                        .map_err(|e| integrity(position, &e))?;
                    if replayed != *index || replayed + 1 != *count {
                        return Err(LedgerError::Integrity {
                            position,
                            reason: format!(
                                "step recorded at index {index} (count {count}) \
                                 replayed at index {replayed}"
                            ),
                        });
                    }
                }
            }
        }

        info!(producer = %producer, events = events.len(), "journal replayed");
        Ok(ReplayResult {
            tracker,
            events_applied: events.len(),
        })
    }
}

fn integrity(position: usize, err: &LedgerError) -> LedgerError {
    LedgerError::Integrity {
        position,
        reason: err.reason().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use trk_types::{FixedText, TrackId};

    use super::*;
    use crate::traits::TrackReader;

    fn addr(seed: u8) -> Address {
        Address::from_raw([seed; 20])
    }

    fn text(s: &str) -> FixedText {
        FixedText::encode(s).unwrap()
    }

    fn populated() -> Tracker {
        let tracker = Tracker::with_producer(addr(1)).unwrap();
        tracker.add_participant(addr(1), addr(2)).unwrap();
        tracker
            .add_step(addr(1), TrackId::derive("a"), text("CAUGHT"), text("t1"))
            .unwrap();
        tracker
            .add_step(addr(2), TrackId::derive("a"), text("PACKED"), text("t2"))
            .unwrap();
        tracker
            .add_step(addr(2), TrackId::derive("b"), text("PACKED"), text("t3"))
            .unwrap();
        tracker
    }

    #[test]
    fn replay_reproduces_state() {
        let original = populated();
        let journal = original.journal().unwrap();

        let result = Tracker::replay(addr(1), &journal).unwrap();
        assert_eq!(result.events_applied, 4);

        let replayed = result.tracker;
        assert_eq!(replayed.journal().unwrap(), journal);
        assert!(replayed.is_participant(&addr(2)).unwrap());
        for label in ["a", "b"] {
            let uuid = TrackId::derive(label);
            assert_eq!(
                replayed.read_track(&uuid).unwrap(),
                original.read_track(&uuid).unwrap()
            );
        }
    }

    #[test]
    fn replay_under_wrong_producer_fails() {
        let journal = populated().journal().unwrap();
        let err = Tracker::replay(addr(7), &journal).err().unwrap();
        assert_eq!(
            err,
            LedgerError::Integrity {
                position: 0,
                reason: "msg.sender is not producer".into()
            }
        );
    }

    #[test]
    fn producer_steps_alone_are_bound_to_their_producer() {
        let tracker = Tracker::with_producer(addr(1)).unwrap();
        tracker
            .add_step(addr(1), TrackId::derive("a"), text("CAUGHT"), text("t1"))
            .unwrap();
        let journal = tracker.journal().unwrap();

        let err = Tracker::replay(addr(7), &journal).err().unwrap();
        assert_eq!(
            err,
            LedgerError::Integrity {
                position: 0,
                reason: "msg.sender is not participant".into()
            }
        );
    }

    #[test]
    fn registration_by_non_producer_is_rejected() {
        let journal = vec![LedgerEvent::ParticipantAdded {
            caller: addr(2),
            participant: addr(3),
        }];
        let err = Tracker::replay(addr(1), &journal).err().unwrap();
        assert_eq!(err.reason(), "msg.sender is not producer");
    }

    #[test]
    fn replay_detects_dropped_events() {
        let mut journal = populated().journal().unwrap();
        journal.remove(1);
        let err = Tracker::replay(addr(1), &journal).err().unwrap();
        assert!(matches!(err, LedgerError::Integrity { position: 1, .. }));
    }

    #[test]
    fn replay_detects_unauthorized_step() {
        let mut journal = populated().journal().unwrap();
        journal.remove(0);
        let err = Tracker::replay(addr(1), &journal).err().unwrap();
        assert_eq!(err.reason(), "msg.sender is not participant");
    }
}
