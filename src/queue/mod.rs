//! Bounded smart queues: the single-level merge/eviction buffer and the
//! two-level nesting composition.

pub mod level;
pub mod nested;
