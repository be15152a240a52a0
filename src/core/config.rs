//! Configuration: TOML file + env var overrides + defaults.
//!
//! Only relay-layer knobs live here (journal destination, drain budget).
//! The queue capacity and the record wire format are fixed constants of the
//! protocol, not configuration.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{RelayError, Result};

/// Full relay configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct RelayConfig {
    pub drain: DrainConfig,
    pub journal: JournalConfig,
}

/// Consumer drain behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DrainConfig {
    /// Upper bound on records applied per presentation tick.
    pub max_events_per_tick: usize,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_events_per_tick: 8,
        }
    }
}

/// Activity journal destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JournalConfig {
    /// Master switch — when false, nothing is written anywhere.
    pub enabled: bool,
    /// Primary journal file path.
    pub path: PathBuf,
    /// Optional fallback path (e.g. a RAM-backed filesystem).
    pub fallback_path: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("/var/log/dialog_relay/activity.jsonl"),
            fallback_path: Some(PathBuf::from("/dev/shm/dialog_relay.jsonl")),
        }
    }
}

impl RelayConfig {
    /// Load config from the default or an explicit path, then apply env
    /// overrides. An explicit path that does not exist is an error; the
    /// default path falls back to defaults when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| RelayError::io(&path_buf, source))?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(RelayError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// A config suitable for embedded use with no journal output.
    #[must_use]
    pub fn without_journal() -> Self {
        let mut cfg = Self::default();
        cfg.journal.enabled = false;
        cfg
    }

    fn default_path() -> PathBuf {
        env::var_os("DRL_CONFIG_PATH").map_or_else(
            || PathBuf::from("/etc/dialog_relay/config.toml"),
            PathBuf::from,
        )
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        let vars: HashMap<String, String> = env::vars().collect();
        self.apply_env_from(&vars)
    }

    fn apply_env_from(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        set_env_usize(
            vars,
            "DRL_DRAIN_MAX_EVENTS_PER_TICK",
            &mut self.drain.max_events_per_tick,
        )?;
        set_env_bool(vars, "DRL_JOURNAL_ENABLED", &mut self.journal.enabled)?;
        set_env_path(vars, "DRL_JOURNAL_PATH", &mut self.journal.path);
        if let Some(raw) = vars.get("DRL_JOURNAL_FALLBACK_PATH") {
            self.journal.fallback_path = if raw.is_empty() {
                None
            } else {
                Some(PathBuf::from(raw))
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.drain.max_events_per_tick == 0 {
            return Err(RelayError::InvalidConfig {
                details: "drain.max_events_per_tick must be at least 1".to_string(),
            });
        }
        if self.journal.enabled && self.journal.path.as_os_str().is_empty() {
            return Err(RelayError::InvalidConfig {
                details: "journal.path must not be empty while the journal is enabled".to_string(),
            });
        }
        Ok(())
    }
}

fn set_env_usize(vars: &HashMap<String, String>, name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = vars.get(name) {
        *slot = raw
            .parse::<usize>()
            .map_err(|error| RelayError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}

fn set_env_bool(vars: &HashMap<String, String>, name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = vars.get(name) {
        *slot = match raw.as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(RelayError::ConfigParse {
                    context: "env",
                    details: format!("{name}={other:?}: expected true/false/1/0"),
                });
            }
        };
    }
    Ok(())
}

fn set_env_path(vars: &HashMap<String, String>, name: &str, slot: &mut PathBuf) {
    if let Some(raw) = vars.get(name) {
        *slot = PathBuf::from(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = RelayConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.journal.enabled);
    }

    #[test]
    fn without_journal_disables_output() {
        let cfg = RelayConfig::without_journal();
        assert!(!cfg.journal.enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_drain_budget_rejected() {
        let mut cfg = RelayConfig::default();
        cfg.drain.max_events_per_tick = 0;
        let err = cfg.validate().expect_err("expected validation error");
        assert!(err.to_string().contains("max_events_per_tick"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = RelayConfig::default();
        cfg.apply_env_from(&vars(&[
            ("DRL_DRAIN_MAX_EVENTS_PER_TICK", "3"),
            ("DRL_JOURNAL_ENABLED", "false"),
            ("DRL_JOURNAL_PATH", "/tmp/relay.jsonl"),
            ("DRL_JOURNAL_FALLBACK_PATH", ""),
        ]))
        .expect("overrides should parse");
        assert_eq!(cfg.drain.max_events_per_tick, 3);
        assert!(!cfg.journal.enabled);
        assert_eq!(cfg.journal.path, PathBuf::from("/tmp/relay.jsonl"));
        assert_eq!(cfg.journal.fallback_path, None);
    }

    #[test]
    fn malformed_env_value_is_a_parse_error() {
        let mut cfg = RelayConfig::default();
        let err = cfg
            .apply_env_from(&vars(&[("DRL_DRAIN_MAX_EVENTS_PER_TICK", "lots")]))
            .expect_err("expected parse failure");
        assert!(matches!(err, RelayError::ConfigParse { .. }));
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = RelayConfig::load(Some(Path::new("/nonexistent/dialog_relay/config.toml")));
        let err = result.expect_err("expected missing-config error");
        assert!(matches!(err, RelayError::MissingConfig { .. }));
    }

    #[test]
    fn toml_round_trip_preserves_config() {
        let cfg = RelayConfig::default();
        let raw = toml::to_string(&cfg).expect("serialize");
        let parsed: RelayConfig = toml::from_str(&raw).expect("parse");
        assert_eq!(parsed, cfg);
    }
}
