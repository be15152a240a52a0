//! Producer/consumer facade over the nested queue.
//!
//! One relay instance owns the queue behind a mutex and splits into a
//! [`ProducerHandle`] for the control-logic side and a [`ConsumerHandle`]
//! for the presentation side. The handles are deliberately not `Clone`:
//! the queue is a single-producer/single-consumer handoff, and each
//! operation is one short critical section — nothing blocks, suspends, or
//! allocates while the lock is held.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::config::RelayConfig;
use crate::core::errors::Result;
use crate::fsm::identity::{Command, DialogId};
use crate::fsm::record::{ChangeData, EventRecord};
use crate::queue::level::PushEffect;
use crate::queue::nested::{NestedQueue, QueueLevel};

#[cfg(feature = "journal")]
use crate::journal::{JournalEntry, JournalEvent, RelayJournal, Severity};

// ──────────────────── counters ────────────────────

/// Monotonic activity counters, snapshotted through the consumer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    /// Pushes the queue accepted.
    pub accepted: u64,
    /// Pushes rejected with a queue error.
    pub rejected: u64,
    /// Changes merged into a pending record.
    pub merged: u64,
    /// Create/destroy pairs that cancelled out unseen.
    pub annihilated: u64,
    /// Changes evicted to make room on overflow.
    pub evicted: u64,
    /// Records delivered to (popped by) the consumer.
    pub delivered: u64,
}

/// Point-in-time view of the relay for dashboards and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayDiagnostics {
    /// Dialog open at the base level.
    pub base_open: DialogId,
    /// Dialog open at the nested level.
    pub nested_open: DialogId,
    /// Records pending across both levels.
    pub pending: usize,
    /// Base records still queued ahead of the nested create.
    pub prior_base_records: usize,
    /// Activity counters.
    pub counters: Counters,
}

// ──────────────────── shared state ────────────────────

struct RelayState {
    queue: NestedQueue,
    counters: Counters,
    #[cfg(feature = "journal")]
    journal: RelayJournal,
}

impl RelayState {
    /// Account for a push outcome and journal what deserves a line.
    fn observe(&mut self, command: Command, dialog: DialogId, result: &Result<PushEffect>) {
        match result {
            Ok(effect) => {
                self.counters.accepted += 1;
                match effect {
                    PushEffect::Queued => {}
                    PushEffect::Merged => self.counters.merged += 1,
                    PushEffect::Annihilated => {
                        self.counters.annihilated += 1;
                        #[cfg(feature = "journal")]
                        self.journal.record(
                            &JournalEntry::new(JournalEvent::CreateAnnihilated, Severity::Info)
                                .with_subject(command, dialog),
                        );
                    }
                    PushEffect::Evicted => {
                        self.counters.evicted += 1;
                        #[cfg(feature = "journal")]
                        self.journal.record(
                            &JournalEntry::new(JournalEvent::ChangeEvicted, Severity::Info)
                                .with_subject(command, dialog),
                        );
                    }
                }
            }
            Err(error) => {
                self.counters.rejected += 1;
                #[cfg(feature = "journal")]
                {
                    let mut entry = JournalEntry::new(JournalEvent::PushRejected, Severity::Warning)
                        .with_subject(command, dialog);
                    entry.error_code = Some(error.code().to_string());
                    entry.details = Some(error.to_string());
                    self.journal.record(&entry);
                }
                #[cfg(not(feature = "journal"))]
                let _ = error;
            }
        }
        #[cfg(not(feature = "journal"))]
        {
            let _ = (command, dialog);
        }
    }
}

// ──────────────────── relay construction ────────────────────

/// Constructor for the producer/consumer handle pair.
pub struct EventRelay;

impl EventRelay {
    /// Build one relay and split it into its two handles. The relay is
    /// meant to be created once at bring-up and threaded to both sides
    /// explicitly — it is not a global mailbox.
    #[must_use]
    pub fn new(config: RelayConfig) -> (ProducerHandle, ConsumerHandle) {
        #[cfg(feature = "journal")]
        let mut journal = RelayJournal::open(&config.journal);
        #[cfg(feature = "journal")]
        journal.record(&JournalEntry::new(JournalEvent::RelayStarted, Severity::Info));

        let shared = Arc::new(Mutex::new(RelayState {
            queue: NestedQueue::new(),
            counters: Counters::default(),
            #[cfg(feature = "journal")]
            journal,
        }));

        let producer = ProducerHandle {
            shared: Arc::clone(&shared),
        };
        let consumer = ConsumerHandle {
            shared,
            drain_budget: config.drain.max_events_per_tick,
        };
        (producer, consumer)
    }
}

// ──────────────────── producer side ────────────────────

/// Push surface handed to control logic. A rejected push is a caller logic
/// signal, not a fault: the intended transition simply does not happen.
pub struct ProducerHandle {
    shared: Arc<Mutex<RelayState>>,
}

impl ProducerHandle {
    /// Notify that `dialog` opened, starting at `init_phase`.
    pub fn push_create(&self, dialog: DialogId, init_phase: u8) -> Result<PushEffect> {
        let mut state = self.shared.lock();
        let result = state.queue.push_create(dialog, init_phase);
        state.observe(Command::Create, dialog, &result);
        result
    }

    /// Notify that `dialog` closed.
    pub fn push_destroy(&self, dialog: DialogId) -> Result<PushEffect> {
        let mut state = self.shared.lock();
        #[cfg(feature = "journal")]
        let cascades = state.queue.open_dialog(QueueLevel::Base) == dialog
            && !state.queue.open_dialog(QueueLevel::Nested).is_none();
        let result = state.queue.push_destroy(dialog);
        #[cfg(feature = "journal")]
        if cascades && result.is_ok() {
            state.journal.record(
                &JournalEntry::new(JournalEvent::NestedCleared, Severity::Info)
                    .with_subject(Command::Destroy, dialog),
            );
        }
        state.observe(Command::Destroy, dialog, &result);
        result
    }

    /// Notify fresh progress for `dialog`.
    pub fn push_change(&self, dialog: DialogId, data: ChangeData) -> Result<PushEffect> {
        let mut state = self.shared.lock();
        let result = state.queue.push_change(dialog, data);
        state.observe(Command::Change, dialog, &result);
        result
    }

    /// Dispatch an already-encoded record.
    pub fn push(&self, record: EventRecord) -> Result<PushEffect> {
        let mut state = self.shared.lock();
        let result = state.queue.push(record);
        state.observe(record.command(), record.dialog(), &result);
        result
    }
}

// ──────────────────── consumer side ────────────────────

/// Drain surface handed to the presentation layer.
pub struct ConsumerHandle {
    shared: Arc<Mutex<RelayState>>,
    drain_budget: usize,
}

impl ConsumerHandle {
    /// Copy out the oldest deliverable record without removing it.
    #[must_use]
    pub fn front(&self) -> EventRecord {
        self.shared.lock().queue.front()
    }

    /// Remove the oldest record once applied. Returns whether one was
    /// removed.
    pub fn pop(&self) -> bool {
        let mut state = self.shared.lock();
        let popped = state.queue.pop();
        if popped {
            state.counters.delivered += 1;
        }
        popped
    }

    /// Atomically copy out and remove the oldest record, or return the
    /// empty record when nothing pends. One critical section, so a
    /// concurrent producer cannot collapse the record between peek and
    /// removal.
    pub fn take(&self) -> EventRecord {
        let mut state = self.shared.lock();
        let record = state.queue.front();
        if !record.is_empty() && state.queue.pop() {
            state.counters.delivered += 1;
        }
        record
    }

    /// Take and apply records up to the configured per-tick budget.
    /// `apply` runs outside the lock, after its record is already removed.
    /// Returns how many records were applied.
    pub fn drain<F: FnMut(EventRecord)>(&self, mut apply: F) -> usize {
        let mut applied = 0;
        while applied < self.drain_budget {
            let record = self.take();
            if record.is_empty() {
                break;
            }
            apply(record);
            applied += 1;
        }
        applied
    }

    /// Per-tick drain budget this handle was built with.
    #[must_use]
    pub const fn drain_budget(&self) -> usize {
        self.drain_budget
    }

    /// Snapshot of the activity counters.
    #[must_use]
    pub fn counters(&self) -> Counters {
        self.shared.lock().counters
    }

    /// Snapshot of queue state and counters.
    #[must_use]
    pub fn diagnostics(&self) -> RelayDiagnostics {
        let state = self.shared.lock();
        RelayDiagnostics {
            base_open: state.queue.open_dialog(QueueLevel::Base),
            nested_open: state.queue.open_dialog(QueueLevel::Nested),
            pending: state.queue.pending(),
            prior_base_records: state.queue.prior_base_records(),
            counters: state.counters,
        }
    }

    /// Hard reset: drop everything pending and close both levels.
    pub fn clear(&self) {
        let mut state = self.shared.lock();
        state.queue.clear();
        #[cfg(feature = "journal")]
        state
            .journal
            .record(&JournalEntry::new(JournalEvent::QueueCleared, Severity::Info));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::record::EventKind;

    const A: DialogId = DialogId::PrintPreview;
    const B: DialogId = DialogId::LoadUnload;

    fn relay() -> (ProducerHandle, ConsumerHandle) {
        EventRelay::new(RelayConfig::without_journal())
    }

    #[test]
    fn lifecycle_flows_through_the_handles() {
        let (producer, consumer) = relay();
        producer.push_create(A, 0).unwrap();
        producer
            .push_change(A, ChangeData::new(1, [1; 4]))
            .unwrap();

        let mut seen = Vec::new();
        let applied = consumer.drain(|record| seen.push(record.kind()));
        assert_eq!(applied, 2);
        assert_eq!(
            seen,
            vec![
                EventKind::Create {
                    dialog: A,
                    init_phase: 0
                },
                EventKind::Change {
                    dialog: A,
                    data: ChangeData::new(1, [1; 4])
                },
            ]
        );
        assert_eq!(consumer.front(), EventRecord::EMPTY);
    }

    #[test]
    fn rejections_count_and_leave_state_intact() {
        let (producer, consumer) = relay();
        producer.push_create(A, 0).unwrap();
        assert!(producer.push_create(A, 0).is_err());
        assert!(
            producer
                .push_change(B, ChangeData::default())
                .is_err()
        );

        let counters = consumer.counters();
        assert_eq!(counters.accepted, 1);
        assert_eq!(counters.rejected, 2);
        assert_eq!(consumer.diagnostics().base_open, A);
    }

    #[test]
    fn drain_respects_the_tick_budget() {
        let mut config = RelayConfig::without_journal();
        config.drain.max_events_per_tick = 1;
        let (producer, consumer) = EventRelay::new(config);
        producer.push_create(A, 0).unwrap();
        producer
            .push_change(A, ChangeData::new(1, [0; 4]))
            .unwrap();

        assert_eq!(consumer.drain(|_| {}), 1);
        assert_eq!(consumer.drain(|_| {}), 1);
        assert_eq!(consumer.drain(|_| {}), 0);
    }

    #[test]
    fn counters_track_merges_and_annihilations() {
        let (producer, consumer) = relay();
        producer.push_create(A, 0).unwrap();
        producer
            .push_change(A, ChangeData::new(1, [0; 4]))
            .unwrap();
        producer
            .push_change(A, ChangeData::new(2, [0; 4]))
            .unwrap();
        producer.push_destroy(A).unwrap();

        let counters = consumer.counters();
        assert_eq!(counters.accepted, 4);
        assert_eq!(counters.merged, 1);
        assert_eq!(counters.annihilated, 1);
        assert_eq!(consumer.front(), EventRecord::EMPTY);
    }

    #[test]
    fn handles_move_across_threads() {
        let (producer, consumer) = relay();
        let worker = std::thread::spawn(move || {
            producer.push_create(A, 0).unwrap();
            for phase in 0..20 {
                producer
                    .push_change(A, ChangeData::new(phase, [phase; 4]))
                    .unwrap();
            }
            producer.push_create(B, 1).unwrap();
            producer.push_destroy(B).unwrap();
            producer.push_destroy(A).unwrap();
        });
        worker.join().expect("producer thread");

        // The create was never delivered, so the whole session annihilated.
        assert_eq!(consumer.drain(|_| {}), 0);
        let counters = consumer.counters();
        assert_eq!(counters.annihilated, 2);
        assert_eq!(counters.rejected, 0);
        assert!(consumer.diagnostics().base_open.is_none());
    }

    #[test]
    fn clear_hard_resets_the_queue() {
        let (producer, consumer) = relay();
        producer.push_create(A, 0).unwrap();
        producer.push_create(B, 0).unwrap();
        consumer.clear();
        assert_eq!(consumer.front(), EventRecord::EMPTY);
        assert!(consumer.diagnostics().base_open.is_none());
        assert!(consumer.diagnostics().nested_open.is_none());
        // The queue accepts a fresh session afterwards.
        producer.push_create(B, 0).unwrap();
        assert_eq!(consumer.diagnostics().base_open, B);
    }
}
