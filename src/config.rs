//! Tuning configuration for the heuristic backoff sleeps used by the slot
//! ring and reader workers. These sleeps are heuristic, not
//! correctness-critical.
//!
//! These are not session parameters (those are `StartParams`, validated in
//! `session::start`); they are process-wide defaults a host can override
//! from a TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ChipError;

/// Backoff durations used by the Slot Ring and Reader Worker.
#[derive(Debug, Clone, Copy)]
pub struct TuningConfig {
    /// Sleep after a failed (contended) slot trylock, before retrying.
    pub slot_contention_backoff: Duration,
    /// Sleep a worker takes after publishing a slot, before resuming its loop.
    pub post_publish_backoff: Duration,
    /// Sleep a worker takes after a backend read failure, before resampling.
    pub read_retry_backoff: Duration,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            slot_contention_backoff: Duration::from_micros(100),
            post_publish_backoff: Duration::from_millis(1),
            read_retry_backoff: Duration::from_millis(1),
        }
    }
}

/// On-disk representation; all fields optional so a partial file only
/// overrides what it mentions.
#[derive(Debug, Deserialize, Default)]
struct RawTuningConfig {
    backoff: Option<RawBackoff>,
}

#[derive(Debug, Deserialize, Default)]
struct RawBackoff {
    slot_contention: Option<String>,
    post_publish: Option<String>,
    read_retry: Option<String>,
}

impl TuningConfig {
    /// Loads overrides from a TOML file, falling back to `Default` for any
    /// field the file omits.
    pub fn load(path: &Path) -> Result<Self, ChipError> {
        let text = fs::read_to_string(path).map_err(|e| {
            ChipError::Configuration(format!("reading tuning config `{}`: {e}", path.display()))
        })?;
        Self::from_str(&text)
    }

    /// Parses a TOML document directly; used by `load` and by tests.
    pub fn from_str(text: &str) -> Result<Self, ChipError> {
        let raw: RawTuningConfig = toml::from_str(text)
            .map_err(|e| ChipError::Configuration(format!("parsing tuning config: {e}")))?;

        let mut cfg = TuningConfig::default();
        if let Some(backoff) = raw.backoff {
            if let Some(s) = backoff.slot_contention {
                cfg.slot_contention_backoff = parse_duration(&s)?;
            }
            if let Some(s) = backoff.post_publish {
                cfg.post_publish_backoff = parse_duration(&s)?;
            }
            if let Some(s) = backoff.read_retry {
                cfg.read_retry_backoff = parse_duration(&s)?;
            }
        }
        Ok(cfg)
    }
}

fn parse_duration(s: &str) -> Result<Duration, ChipError> {
    humantime::parse_duration(s)
        .map_err(|e| ChipError::Configuration(format!("invalid duration `{s}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_heuristics() {
        let cfg = TuningConfig::default();
        assert_eq!(cfg.slot_contention_backoff, Duration::from_micros(100));
        assert_eq!(cfg.post_publish_backoff, Duration::from_millis(1));
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = TuningConfig::from_str(
            r#"
            [backoff]
            slot_contention = "50us"
            "#,
        )
        .expect("should parse");
        assert_eq!(cfg.slot_contention_backoff, Duration::from_micros(50));
        assert_eq!(cfg.post_publish_backoff, Duration::from_millis(1));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = TuningConfig::from_str("").expect("empty document is valid");
        assert_eq!(cfg.slot_contention_backoff, TuningConfig::default().slot_contention_backoff);
    }

    #[test]
    fn bad_duration_is_rejected() {
        let err = TuningConfig::from_str(
            r#"
            [backoff]
            post_publish = "not-a-duration"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ChipError::Configuration(_)));
    }
}
