#![forbid(unsafe_code)]

//! Dialog event relay — bounded cross-context signaling between a device's
//! control logic and its presentation layer.
//!
//! A producer (motion-control/application code) reports dialog lifecycle
//! transitions — create, change, destroy — and a consumer (the presentation
//! tick) drains them later, possibly from a different scheduling context.
//! The relay guarantees three things under a fixed memory budget:
//!
//! 1. **Bounded** — each nesting level holds at most three fixed-size
//!    records; the push/pop path never allocates.
//! 2. **Semantically minimal** — superseded events merge or annihilate;
//!    intermediate progress values are not observable and are dropped.
//! 3. **Lossless where it matters** — a create or destroy the consumer
//!    must see is never discarded.
//!
//! One level of nesting is supported: a child dialog displayed atop a
//! parent, delivered parent-first and torn down with it.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the common types:
//!
//! ```rust,no_run
//! use dialog_relay::prelude::*;
//!
//! let (producer, consumer) = EventRelay::new(RelayConfig::default());
//! producer.push_create(DialogId::PrintPreheat, 0)?;
//! consumer.drain(|record| {
//!     // apply the record to presentation state
//!     let _ = record.kind();
//! });
//! # Ok::<(), RelayError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod fsm;
#[cfg(feature = "journal")]
pub mod journal;
pub mod queue;
pub mod relay;
