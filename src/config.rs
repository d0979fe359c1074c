//! Engine configuration, loaded from `~/.contextos/config.json`.
//!
//! Every field has a serde default so a partial (or missing) file yields a
//! working engine.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_synthesis_interval_secs")]
    pub synthesis_interval_secs: u64,
    #[serde(default = "default_true")]
    pub synthesize_on_change: bool,
    #[serde(default = "default_recent_transition_window")]
    pub recent_transition_window: usize,
    #[serde(default = "default_min_transitions_for_pattern")]
    pub min_transitions_for_pattern: usize,
    #[serde(default = "default_min_pattern_repeats")]
    pub min_pattern_repeats: usize,
    #[serde(default = "default_pattern_confidence_divisor")]
    pub pattern_confidence_divisor: f64,
    #[serde(default = "default_pattern_confidence_cap")]
    pub pattern_confidence_cap: f64,
    #[serde(default = "default_connection_window_hours")]
    pub connection_window_hours: i64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_transition_history")]
    pub max_transition_history: usize,
    #[serde(default = "default_max_ambient_patterns")]
    pub max_ambient_patterns: usize,
    #[serde(default = "default_prediction_confidence_threshold")]
    pub prediction_confidence_threshold: f64,
    #[serde(default)]
    pub suppress_repeat_pattern_insights: bool,
    /// IANA zone name, e.g. "Europe/Berlin". Host local time when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default = "default_view")]
    pub default_view: String,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_synthesis_interval_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_recent_transition_window() -> usize {
    10
}
fn default_min_transitions_for_pattern() -> usize {
    5
}
fn default_min_pattern_repeats() -> usize {
    2
}
fn default_pattern_confidence_divisor() -> f64 {
    5.0
}
fn default_pattern_confidence_cap() -> f64 {
    0.95
}
fn default_connection_window_hours() -> i64 {
    24
}
fn default_max_connections() -> usize {
    3
}
fn default_max_transition_history() -> usize {
    10_000
}
fn default_max_ambient_patterns() -> usize {
    200
}
fn default_prediction_confidence_threshold() -> f64 {
    0.6
}
fn default_view() -> String {
    "hub".to_string()
}
fn default_event_channel_capacity() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            synthesis_interval_secs: default_synthesis_interval_secs(),
            synthesize_on_change: true,
            recent_transition_window: default_recent_transition_window(),
            min_transitions_for_pattern: default_min_transitions_for_pattern(),
            min_pattern_repeats: default_min_pattern_repeats(),
            pattern_confidence_divisor: default_pattern_confidence_divisor(),
            pattern_confidence_cap: default_pattern_confidence_cap(),
            connection_window_hours: default_connection_window_hours(),
            max_connections: default_max_connections(),
            max_transition_history: default_max_transition_history(),
            max_ambient_patterns: default_max_ambient_patterns(),
            prediction_confidence_threshold: default_prediction_confidence_threshold(),
            suppress_repeat_pattern_insights: false,
            timezone: None,
            default_view: default_view(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl EngineConfig {
    /// Parse the configured zone. An unknown name is a config error, not a
    /// silent fallback to host time.
    pub fn tz(&self) -> Result<Option<Tz>, EngineError> {
        match self.timezone.as_deref() {
            None | Some("") => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|_| EngineError::Config(format!("Unknown timezone '{}'", name))),
        }
    }

    /// Periodic synthesis interval.
    pub fn synthesis_interval(&self) -> Result<TimeDelta, EngineError> {
        i64::try_from(self.synthesis_interval_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "synthesisIntervalSecs out of range: {}",
                    self.synthesis_interval_secs
                ))
            })
    }

    /// Look-back window for title-overlap connections. Must not be negative.
    pub fn connection_window(&self) -> Result<TimeDelta, EngineError> {
        if self.connection_window_hours < 0 {
            return Err(EngineError::Config(format!(
                "connectionWindowHours must not be negative, got {}",
                self.connection_window_hours
            )));
        }
        TimeDelta::try_hours(self.connection_window_hours).ok_or_else(|| {
            EngineError::Config(format!(
                "connectionWindowHours out of range: {}",
                self.connection_window_hours
            ))
        })
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.synthesis_interval()?;
        self.connection_window()?;

        let divisor = self.pattern_confidence_divisor;
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(EngineError::Config(format!(
                "patternConfidenceDivisor must be a positive number, got {}",
                divisor
            )));
        }
        if !(0.0..=1.0).contains(&self.pattern_confidence_cap) {
            return Err(EngineError::Config(format!(
                "patternConfidenceCap must be within [0, 1], got {}",
                self.pattern_confidence_cap
            )));
        }

        self.tz()?;
        Ok(())
    }
}

/// Get the engine state directory (~/.contextos)
pub fn state_dir() -> Result<PathBuf, EngineError> {
    let home = dirs::home_dir().ok_or_else(|| EngineError::Config("Could not find home directory".into()))?;
    Ok(home.join(".contextos"))
}

/// Get the canonical config file path (~/.contextos/config.json)
pub fn config_path() -> Result<PathBuf, EngineError> {
    Ok(state_dir()?.join("config.json"))
}

/// Load configuration from ~/.contextos/config.json, defaults when absent.
pub fn load_config() -> Result<EngineConfig, EngineError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<EngineConfig, EngineError> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)
        .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.synthesis_interval_secs, 30);
        assert_eq!(config.recent_transition_window, 10);
        assert_eq!(config.min_transitions_for_pattern, 5);
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.connection_window_hours, 24);
        assert!((config.pattern_confidence_cap - 0.95).abs() < 1e-9);
        assert_eq!(config.default_view, "hub");
        assert!(config.synthesize_on_change);
        assert!(!config.suppress_repeat_pattern_insights);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"synthesisIntervalSecs": 120, "timezone": "Europe/Berlin"}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.synthesis_interval_secs, 120);
        assert_eq!(config.max_ambient_patterns, 200);
        assert_eq!(config.tz().unwrap(), Some(chrono_tz::Europe::Berlin));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_unknown_timezone_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"timezone": "Mars/Olympus_Mons"}"#).unwrap();
        assert!(matches!(load_config_from(&path), Err(EngineError::Config(_))));
    }

    fn load_raw(raw: &str) -> Result<EngineConfig, EngineError> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, raw).unwrap();
        load_config_from(&path)
    }

    #[test]
    fn test_interval_beyond_chrono_range_is_config_error() {
        let err = load_raw(r#"{"synthesisIntervalSecs": 18446744073709551615}"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(ref m) if m.contains("synthesisIntervalSecs")));
    }

    #[test]
    fn test_connection_window_out_of_range_or_negative_is_config_error() {
        assert!(matches!(
            load_raw(r#"{"connectionWindowHours": 9000000000000000}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            load_raw(r#"{"connectionWindowHours": -1}"#),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_non_positive_divisor_is_config_error() {
        assert!(matches!(
            load_raw(r#"{"patternConfidenceDivisor": 0}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            load_raw(r#"{"patternConfidenceDivisor": -5.0}"#),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_cap_outside_unit_interval_is_config_error() {
        assert!(matches!(
            load_raw(r#"{"patternConfidenceCap": 1.5}"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            load_raw(r#"{"patternConfidenceCap": -0.1}"#),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_default_config_validates() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.synthesis_interval().unwrap(), TimeDelta::seconds(30));
        assert_eq!(config.connection_window().unwrap(), TimeDelta::hours(24));
    }
}
