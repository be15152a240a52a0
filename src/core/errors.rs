//! DRL-prefixed error types with structured error codes.
//!
//! Queue rejections are ordinary, non-fatal values: every error is surfaced
//! synchronously to the immediate caller, none is retried internally, and a
//! rejected push never corrupts already-accepted state. The producer is
//! expected to log and continue.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fsm::identity::DialogId;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Top-level error type for the dialog relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("[DRL-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DRL-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DRL-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DRL-2001] operation referenced the none dialog identity")]
    InvalidIdentity,

    #[error("[DRL-2002] create rejected: {open} is already open where {dialog} was targeted")]
    AlreadyCreated { dialog: DialogId, open: DialogId },

    #[error("[DRL-2003] destroy rejected: {dialog} is not open")]
    AlreadyDestroyed { dialog: DialogId },

    #[error("[DRL-2004] {dialog} does not match the open dialog {open}")]
    Inconsistent { dialog: DialogId, open: DialogId },

    #[error("[DRL-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RelayError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "DRL-1001",
            Self::MissingConfig { .. } => "DRL-1002",
            Self::ConfigParse { .. } => "DRL-1003",
            Self::InvalidIdentity => "DRL-2001",
            Self::AlreadyCreated { .. } => "DRL-2002",
            Self::AlreadyDestroyed { .. } => "DRL-2003",
            Self::Inconsistent { .. } => "DRL-2004",
            Self::Io { .. } => "DRL-3001",
        }
    }

    /// Whether this is one of the queue-rejection variants a producer is
    /// expected to tolerate (as opposed to a configuration or IO failure).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentity
                | Self::AlreadyCreated { .. }
                | Self::AlreadyDestroyed { .. }
                | Self::Inconsistent { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for RelayError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
