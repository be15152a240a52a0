//! Two-level smart queue: one base level plus one nested level, supporting
//! a single dialog displayed atop another.
//!
//! Creates route to the base level until it holds an open (or pending)
//! dialog, then to the nested level. Changes and destroys follow whichever
//! level has their identity open. Destroying the base dialog tears the
//! nested level down with it — a child cannot outlive its parent — and
//! delivery drains the base level before the nested one, so a parent's
//! create always reaches the consumer before its child's.

use crate::core::errors::{RelayError, Result};
use crate::fsm::identity::DialogId;
use crate::fsm::record::{ChangeData, EventKind, EventRecord};
use crate::queue::level::{LevelQueue, PushEffect};

/// Which of the two composed queues an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueLevel {
    /// The parent dialog's queue.
    Base,
    /// The child dialog's queue.
    Nested,
}

/// Two [`LevelQueue`]s composed to support one level of dialog nesting.
#[derive(Debug, Clone, Default)]
pub struct NestedQueue {
    base: LevelQueue,
    nested: LevelQueue,
    /// Base-level occupancy at the moment the nested create was routed.
    /// A base create counted here was queued before the child and must be
    /// delivered first; base-first draining guarantees that, and the field
    /// tracks how many base records still precede the child's create.
    prior_base_records: usize,
}

impl NestedQueue {
    /// Two empty levels, nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ──────────────────── producer operations ────────────────────

    /// Queue a create, routing it to the base level when that level is
    /// free, otherwise to the nested level. A third concurrent dialog — or
    /// a second instance of an identity already open at the base — is
    /// rejected with `AlreadyCreated`.
    pub fn push_create(&mut self, dialog: DialogId, init_phase: u8) -> Result<PushEffect> {
        if dialog.is_none() {
            return Err(RelayError::InvalidIdentity);
        }
        if self.base.open_dialog().is_none() {
            return self.base.push_create(dialog, init_phase);
        }
        if self.base.open_dialog() == dialog {
            return Err(RelayError::AlreadyCreated { dialog, open: dialog });
        }
        let effect = self.nested.push_create(dialog, init_phase)?;
        self.prior_base_records = self.base.len();
        Ok(effect)
    }

    /// Queue a destroy for whichever level has `dialog` open. Destroying
    /// the base dialog while a child is open clears the nested level too.
    pub fn push_destroy(&mut self, dialog: DialogId) -> Result<PushEffect> {
        if dialog.is_none() {
            return Err(RelayError::InvalidIdentity);
        }
        if self.nested.open_dialog() == dialog {
            return self.nested.push_destroy(dialog);
        }
        if self.base.open_dialog() == dialog {
            let effect = self.base.push_destroy(dialog)?;
            self.nested.reset();
            self.prior_base_records = 0;
            return Ok(effect);
        }
        match self.innermost_open() {
            DialogId::None => Err(RelayError::AlreadyDestroyed { dialog }),
            open => Err(RelayError::Inconsistent { dialog, open }),
        }
    }

    /// Queue a progress update for whichever level has `dialog` open.
    pub fn push_change(&mut self, dialog: DialogId, data: ChangeData) -> Result<PushEffect> {
        if dialog.is_none() {
            return Err(RelayError::InvalidIdentity);
        }
        if self.nested.open_dialog() == dialog {
            return self.nested.push_change(dialog, data);
        }
        if self.base.open_dialog() == dialog {
            return self.base.push_change(dialog, data);
        }
        Err(RelayError::Inconsistent {
            dialog,
            open: self.innermost_open(),
        })
    }

    /// Dispatch a generic record to the matching typed operation, for
    /// callers already holding an encoded record.
    pub fn push(&mut self, record: EventRecord) -> Result<PushEffect> {
        match record.kind() {
            EventKind::None => Err(RelayError::InvalidIdentity),
            EventKind::Create { dialog, init_phase } => self.push_create(dialog, init_phase),
            EventKind::Destroy { dialog } => self.push_destroy(dialog),
            EventKind::Change { dialog, data } => self.push_change(dialog, data),
        }
    }

    // ──────────────────── consumer operations ────────────────────

    /// The oldest deliverable record across both levels, or the empty
    /// record. The base level always delivers first: a child dialog is
    /// meaningless until its parent is instantiated.
    #[must_use]
    pub fn front(&self) -> EventRecord {
        match self.delivery_level() {
            Some(QueueLevel::Base) => self.base.front(),
            Some(QueueLevel::Nested) => self.nested.front(),
            None => EventRecord::EMPTY,
        }
    }

    /// The newest pending record, or the empty record. The nested level
    /// holds the most recently routed dialog when it is non-empty.
    #[must_use]
    pub fn back(&self) -> EventRecord {
        if self.nested.is_empty() {
            self.base.back()
        } else {
            self.nested.back()
        }
    }

    /// Remove the oldest deliverable record. Returns whether one was
    /// removed.
    pub fn pop(&mut self) -> bool {
        match self.delivery_level() {
            Some(QueueLevel::Base) => {
                let popped = self.base.pop();
                if popped {
                    self.prior_base_records = self.prior_base_records.saturating_sub(1);
                }
                popped
            }
            Some(QueueLevel::Nested) => self.nested.pop(),
            None => false,
        }
    }

    // ──────────────────── introspection ────────────────────

    /// Identity open at `level`.
    #[must_use]
    pub const fn open_dialog(&self, level: QueueLevel) -> DialogId {
        match level {
            QueueLevel::Base => self.base.open_dialog(),
            QueueLevel::Nested => self.nested.open_dialog(),
        }
    }

    /// Occupied slots at `level`.
    #[must_use]
    pub const fn len(&self, level: QueueLevel) -> usize {
        match level {
            QueueLevel::Base => self.base.len(),
            QueueLevel::Nested => self.nested.len(),
        }
    }

    /// Total records pending across both levels.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.base.len() + self.nested.len()
    }

    /// Whether neither level has records pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.base.is_empty() && self.nested.is_empty()
    }

    /// Base records still queued ahead of the nested create, for
    /// diagnostics.
    #[must_use]
    pub const fn prior_base_records(&self) -> usize {
        self.prior_base_records
    }

    /// Hard reset: drop all records and close both levels.
    pub fn clear(&mut self) {
        self.base.reset();
        self.nested.reset();
        self.prior_base_records = 0;
    }

    fn delivery_level(&self) -> Option<QueueLevel> {
        if !self.base.is_empty() {
            Some(QueueLevel::Base)
        } else if !self.nested.is_empty() {
            Some(QueueLevel::Nested)
        } else {
            None
        }
    }

    /// The innermost open identity, for error reporting.
    fn innermost_open(&self) -> DialogId {
        if self.nested.open_dialog().is_none() {
            self.base.open_dialog()
        } else {
            self.nested.open_dialog()
        }
    }
}
