//! Fixed-size tagged event records.
//!
//! Every record occupies one common slot shape: the packed tag byte plus a
//! five-byte payload block. `Create` uses payload byte 0 as the initial
//! phase, `Destroy` carries no payload, `Change` uses the whole block.
//! Unused payload bytes stay zero, so record equality is bit-exact and the
//! default record is all zero — indistinguishable from "no command".

use crate::fsm::identity::{Command, DialogId, Tag};

/// Opaque bytes a change carries alongside its phase.
pub const CHANGE_DATA_LEN: usize = 4;

/// Payload block size shared by all record kinds: phase byte + opaque data.
pub const PAYLOAD_LEN: usize = 1 + CHANGE_DATA_LEN;

/// Packed transport size of a record: tag byte + payload block.
pub const RECORD_LEN: usize = 1 + PAYLOAD_LEN;

// ──────────────────── change payload ────────────────────

/// Progress payload of a `Change` record: the dialog's current phase plus a
/// fixed block of bytes the presentation layer interprets. The queue treats
/// the block as opaque; it only needs copy and equality semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeData {
    /// Phase index within the dialog's own state machine.
    pub phase: u8,
    /// Opaque per-dialog progress bytes.
    pub data: [u8; CHANGE_DATA_LEN],
}

impl ChangeData {
    /// Build a payload from a phase and its opaque block.
    #[must_use]
    pub const fn new(phase: u8, data: [u8; CHANGE_DATA_LEN]) -> Self {
        Self { phase, data }
    }
}

// ──────────────────── event record ────────────────────

/// One queue slot: a `(command, dialog)` tag and the fixed payload block.
///
/// Records are plain `Copy` values; consumers copy them out via
/// `front`/`back` before popping. Equality is bit-exact over tag and
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventRecord {
    tag: Tag,
    payload: [u8; PAYLOAD_LEN],
}

/// Decoded view of a record, for exhaustive matching at the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Empty slot / no pending event.
    None,
    /// Open `dialog`, starting at `init_phase`.
    Create {
        /// Dialog to open.
        dialog: DialogId,
        /// Initial phase index.
        init_phase: u8,
    },
    /// Tear down `dialog`.
    Destroy {
        /// Dialog to close.
        dialog: DialogId,
    },
    /// Update `dialog` with fresh progress.
    Change {
        /// Dialog being updated.
        dialog: DialogId,
        /// Latest progress payload.
        data: ChangeData,
    },
}

impl EventRecord {
    /// The all-zero record.
    pub const EMPTY: Self = Self {
        tag: Tag::EMPTY,
        payload: [0; PAYLOAD_LEN],
    };

    /// A create record for `dialog` with its initial phase.
    #[must_use]
    pub const fn create(dialog: DialogId, init_phase: u8) -> Self {
        Self {
            tag: Tag::pack(Command::Create, dialog),
            payload: [init_phase, 0, 0, 0, 0],
        }
    }

    /// A destroy record for `dialog`. Carries no payload.
    #[must_use]
    pub const fn destroy(dialog: DialogId) -> Self {
        Self {
            tag: Tag::pack(Command::Destroy, dialog),
            payload: [0; PAYLOAD_LEN],
        }
    }

    /// A change record for `dialog` carrying the full payload block.
    #[must_use]
    pub const fn change(dialog: DialogId, data: ChangeData) -> Self {
        Self {
            tag: Tag::pack(Command::Change, dialog),
            payload: [
                data.phase,
                data.data[0],
                data.data[1],
                data.data[2],
                data.data[3],
            ],
        }
    }

    /// Command kind of this record.
    #[must_use]
    pub const fn command(&self) -> Command {
        self.tag.command()
    }

    /// Dialog identity of this record. Records built through the
    /// constructors always carry a known identity; a foreign tag with
    /// unknown identity bits reads back as the sentinel.
    #[must_use]
    pub fn dialog(&self) -> DialogId {
        self.tag.dialog().unwrap_or(DialogId::None)
    }

    /// Whether this is the empty/no-event record.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.command(), Command::None)
    }

    /// Decode into the typed view.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self.command() {
            Command::None => EventKind::None,
            Command::Create => EventKind::Create {
                dialog: self.dialog(),
                init_phase: self.payload[0],
            },
            Command::Destroy => EventKind::Destroy {
                dialog: self.dialog(),
            },
            Command::Change => EventKind::Change {
                dialog: self.dialog(),
                data: ChangeData {
                    phase: self.payload[0],
                    data: [
                        self.payload[1],
                        self.payload[2],
                        self.payload[3],
                        self.payload[4],
                    ],
                },
            },
        }
    }

    /// Packed transport form: tag byte followed by the payload block.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; RECORD_LEN] {
        [
            self.tag.raw(),
            self.payload[0],
            self.payload[1],
            self.payload[2],
            self.payload[3],
            self.payload[4],
        ]
    }

    /// Decode a packed record. A `Command::None` tag yields the empty
    /// record regardless of payload bits; a tag naming no known dialog
    /// yields `None`. Payload bytes a command does not define are
    /// normalized back to zero.
    #[must_use]
    pub fn from_bytes(bytes: [u8; RECORD_LEN]) -> Option<Self> {
        let tag = Tag::from_raw(bytes[0]);
        match tag.command() {
            Command::None => Some(Self::EMPTY),
            Command::Create => {
                let dialog = known_dialog(tag)?;
                Some(Self::create(dialog, bytes[1]))
            }
            Command::Destroy => {
                let dialog = known_dialog(tag)?;
                Some(Self::destroy(dialog))
            }
            Command::Change => {
                let dialog = known_dialog(tag)?;
                let data = ChangeData::new(bytes[1], [bytes[2], bytes[3], bytes[4], bytes[5]]);
                Some(Self::change(dialog, data))
            }
        }
    }
}

/// A non-sentinel dialog named by the tag's identity bits, if any.
fn known_dialog(tag: Tag) -> Option<DialogId> {
    match tag.dialog() {
        Some(dialog) if !dialog.is_none() => Some(dialog),
        _ => None,
    }
}
