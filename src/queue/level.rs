//! Single-level smart queue: a fixed three-slot buffer that keeps only the
//! events the consumer still needs.
//!
//! The buffer discards events that a newer event supersedes: a destroy
//! erases every pending record of its dialog (nothing erases a destroy),
//! consecutive changes merge into one record, and a create the consumer
//! never saw annihilates with its destroy. A create or destroy that must
//! reach the consumer is never dropped, on overflow or otherwise.
//!
//! All operations are O(1) in the fixed capacity and allocation-free; the
//! caller provides mutual exclusion (see [`crate::relay`]).

use crate::core::errors::{RelayError, Result};
use crate::fsm::identity::{Command, DialogId};
use crate::fsm::record::{ChangeData, EventRecord};

/// Fixed slot count per nesting level.
pub const QUEUE_CAPACITY: usize = 3;

/// What a successful push did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEffect {
    /// Appended as a new record.
    Queued,
    /// Overwrote the newest pending change in place.
    Merged,
    /// Create and destroy cancelled out; nothing reaches the consumer.
    Annihilated,
    /// Appended after evicting the oldest pending change.
    Evicted,
}

/// Bounded buffer of [`EventRecord`]s for one nesting level.
///
/// Insertion order is logical order: the oldest record sits at the front.
/// `opened` tracks the identity most recently confirmed open by an accepted
/// create and not yet matched by a destroy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelQueue {
    slots: [EventRecord; QUEUE_CAPACITY],
    count: u8,
    opened: DialogId,
}

impl Default for LevelQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelQueue {
    /// An empty queue with no dialog open.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [EventRecord::EMPTY; QUEUE_CAPACITY],
            count: 0,
            opened: DialogId::None,
        }
    }

    // ──────────────────── producer operations ────────────────────

    /// Queue a create for `dialog`, marking it open at this level.
    ///
    /// Rejected while any dialog is open here: one open identity per level.
    pub fn push_create(&mut self, dialog: DialogId, init_phase: u8) -> Result<PushEffect> {
        if dialog.is_none() {
            return Err(RelayError::InvalidIdentity);
        }
        if !self.opened.is_none() {
            return Err(RelayError::AlreadyCreated {
                dialog,
                open: self.opened,
            });
        }
        let effect = self.append(EventRecord::create(dialog, init_phase));
        self.opened = dialog;
        Ok(effect)
    }

    /// Queue a destroy for `dialog`, collapsing everything it supersedes.
    ///
    /// Every pending record of `dialog` is discarded. If an undelivered
    /// create was among them the pair annihilates and nothing is queued —
    /// the consumer never saw the dialog, so it must not see the teardown
    /// either. A pending destroy of a previously closed dialog survives the
    /// collapse untouched.
    pub fn push_destroy(&mut self, dialog: DialogId) -> Result<PushEffect> {
        if dialog.is_none() {
            return Err(RelayError::InvalidIdentity);
        }
        if self.opened.is_none() {
            return Err(RelayError::AlreadyDestroyed { dialog });
        }
        if self.opened != dialog {
            return Err(RelayError::Inconsistent {
                dialog,
                open: self.opened,
            });
        }

        let had_pending_create = self.discard_dialog(dialog);
        self.opened = DialogId::None;
        if had_pending_create {
            return Ok(PushEffect::Annihilated);
        }
        Ok(self.append(EventRecord::destroy(dialog)))
    }

    /// Queue a progress update for `dialog`.
    ///
    /// A pending change at the back merges in place — intermediate progress
    /// values are not observable and only the latest matters.
    pub fn push_change(&mut self, dialog: DialogId, data: ChangeData) -> Result<PushEffect> {
        if dialog.is_none() {
            return Err(RelayError::InvalidIdentity);
        }
        if self.opened != dialog {
            return Err(RelayError::Inconsistent {
                dialog,
                open: self.opened,
            });
        }

        if self.count > 0 {
            let back = &mut self.slots[self.count as usize - 1];
            if back.command() == Command::Change && back.dialog() == dialog {
                *back = EventRecord::change(dialog, data);
                return Ok(PushEffect::Merged);
            }
        }
        Ok(self.append(EventRecord::change(dialog, data)))
    }

    // ──────────────────── consumer operations ────────────────────

    /// The oldest pending record, or the empty record when nothing pends.
    /// Non-destructive; the consumer copies the value out.
    #[must_use]
    pub fn front(&self) -> EventRecord {
        if self.count == 0 {
            EventRecord::EMPTY
        } else {
            self.slots[0]
        }
    }

    /// The newest pending record, or the empty record when nothing pends.
    #[must_use]
    pub fn back(&self) -> EventRecord {
        if self.count == 0 {
            EventRecord::EMPTY
        } else {
            self.slots[self.count as usize - 1]
        }
    }

    /// Remove the oldest record once the consumer has applied it. Returns
    /// whether a record was removed.
    pub fn pop(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.remove_at(0);
        true
    }

    // ──────────────────── maintenance ────────────────────

    /// Buffer position of the pending create, if one exists.
    #[must_use]
    pub fn create_index(&self) -> Option<usize> {
        self.slots[..self.count as usize]
            .iter()
            .position(|record| record.command() == Command::Create)
    }

    /// Drop all pending records. The opened identity is untouched; callers
    /// doing a hard reset pair this with their own open-state handling.
    pub fn clear(&mut self) {
        self.slots = [EventRecord::EMPTY; QUEUE_CAPACITY];
        self.count = 0;
    }

    /// Retract the most recently pushed record before the consumer can
    /// observe it. No-op on an empty buffer.
    pub fn clear_last(&mut self) {
        if self.count > 0 {
            self.count -= 1;
            self.slots[self.count as usize] = EventRecord::EMPTY;
        }
    }

    /// Drop all pending records and close the opened identity. Used when a
    /// parent dialog's destruction tears this level down wholesale.
    pub(crate) fn reset(&mut self) {
        self.clear();
        self.opened = DialogId::None;
    }

    /// Identity currently considered open at this level.
    #[must_use]
    pub const fn open_dialog(&self) -> DialogId {
        self.opened
    }

    /// Number of occupied slots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count as usize
    }

    /// Whether no records pend.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    // ──────────────────── internals ────────────────────

    /// Append a record, evicting the oldest pending change when full.
    fn append(&mut self, record: EventRecord) -> PushEffect {
        let mut effect = PushEffect::Queued;
        if self.count as usize == QUEUE_CAPACITY {
            // At most one create and one destroy can pend at once, so a full
            // buffer always holds a change to give up; creates and destroys
            // must reach the consumer.
            let victim = self.oldest_change_index();
            debug_assert!(victim.is_some(), "full buffer without an evictable change");
            self.remove_at(victim.unwrap_or(QUEUE_CAPACITY - 1));
            effect = PushEffect::Evicted;
        }
        self.slots[self.count as usize] = record;
        self.count += 1;
        effect
    }

    /// Remove every pending record of `dialog`, compacting the buffer.
    /// Returns whether a create was among the removed records.
    fn discard_dialog(&mut self, dialog: DialogId) -> bool {
        let occupied = self.count as usize;
        let mut kept = 0usize;
        let mut saw_create = false;
        for index in 0..occupied {
            let record = self.slots[index];
            if record.dialog() == dialog {
                if record.command() == Command::Create {
                    saw_create = true;
                }
            } else {
                self.slots[kept] = record;
                kept += 1;
            }
        }
        // Vacated slots go back to all-zero so an unused slot stays
        // indistinguishable from "no command".
        for slot in &mut self.slots[kept..occupied] {
            *slot = EventRecord::EMPTY;
        }
        self.count = kept as u8;
        saw_create
    }

    fn oldest_change_index(&self) -> Option<usize> {
        self.slots[..self.count as usize]
            .iter()
            .position(|record| record.command() == Command::Change)
    }

    fn remove_at(&mut self, index: usize) {
        let occupied = self.count as usize;
        for i in index + 1..occupied {
            self.slots[i - 1] = self.slots[i];
        }
        self.count -= 1;
        self.slots[self.count as usize] = EventRecord::EMPTY;
    }
}
