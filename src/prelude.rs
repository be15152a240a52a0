//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use dialog_relay::prelude::*;
//! ```

// Core
pub use crate::core::config::{DrainConfig, JournalConfig, RelayConfig};
pub use crate::core::errors::{RelayError, Result};

// Records
pub use crate::fsm::identity::{Command, DialogId};
pub use crate::fsm::record::{ChangeData, EventKind, EventRecord};

// Queues
pub use crate::queue::level::{LevelQueue, PushEffect, QUEUE_CAPACITY};
pub use crate::queue::nested::{NestedQueue, QueueLevel};

// Relay
pub use crate::relay::{ConsumerHandle, Counters, EventRelay, ProducerHandle, RelayDiagnostics};
