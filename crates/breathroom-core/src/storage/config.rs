//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Timer frame rate and default breathing pattern
//! - Default meditation length
//! - Terminal display options
//! - Custom breathing patterns
//!
//! Configuration is stored at `~/.config/breathroom/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::timer::{find_pattern, BreathingPattern};

/// Breathing timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Progress refresh period of the live driver.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_pattern")]
    pub default_pattern: String,
}

/// Meditation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeditationConfig {
    #[serde(default = "default_meditation_minutes")]
    pub default_minutes: u64,
}

/// Terminal display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub show_progress_bar: bool,
    #[serde(default = "default_bar_width")]
    pub bar_width: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathroom/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Record finished sessions in the local database.
    #[serde(default = "default_true")]
    pub record_sessions: bool,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub meditation: MeditationConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// User-defined patterns. Shadow built-ins with the same id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<BreathingPattern>,
}

fn default_frame_interval_ms() -> u64 {
    33
}
fn default_pattern() -> String {
    "box".into()
}
fn default_meditation_minutes() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_bar_width() -> u32 {
    30
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            default_pattern: default_pattern(),
        }
    }
}

impl Default for MeditationConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_meditation_minutes(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_progress_bar: true,
            bar_width: default_bar_width(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            record_sessions: true,
            timer: TimerConfig::default(),
            meditation: MeditationConfig::default(),
            display: DisplayConfig::default(),
            patterns: Vec::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; writing defaults");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// as the key's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        if let Some(obj) = json.as_object_mut() {
            obj.entry("patterns")
                .or_insert_with(|| serde_json::Value::Array(Vec::new()));
        }
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        for pattern in &updated.patterns {
            pattern
                .validate()
                .map_err(|e| invalid(format!("pattern '{}': {e}", pattern.id)))?;
        }
        *self = updated;
        Ok(())
    }

    /// Update a value by key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Resolve a pattern id against custom patterns, then built-ins.
    pub fn find_pattern(&self, id: &str) -> Result<BreathingPattern, ValidationError> {
        find_pattern(id, &self.patterns)
    }

    /// The configured default pattern, falling back to box breathing.
    pub fn default_pattern(&self) -> BreathingPattern {
        self.find_pattern(&self.timer.default_pattern)
            .or_else(|e| {
                warn!("{e}; falling back to box breathing");
                find_pattern("box", &[])
            })
            .unwrap_or_else(|_| {
                BreathingPattern::new("box", 4.0, 4.0, 8)
                    .with_hold(4.0)
                    .with_pause(4.0)
            })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("{e}; using default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.frame_interval_ms, 33);
        assert_eq!(parsed.timer.default_pattern, "box");
        assert!(parsed.patterns.is_empty());
    }

    #[test]
    fn custom_patterns_roundtrip_through_toml() {
        let mut cfg = Config::default();
        cfg.patterns
            .push(BreathingPattern::new("slow", 6.0, 8.0, 5).with_pause(2.0));
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.patterns, cfg.patterns);
        assert_eq!(parsed.find_pattern("slow").unwrap().pause, Some(2.0));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\ndefault_pattern = \"belly\"\n").unwrap();
        assert_eq!(parsed.timer.default_pattern, "belly");
        assert_eq!(parsed.timer.frame_interval_ms, 33);
        assert_eq!(parsed.meditation.default_minutes, 10);
        assert_eq!(parsed.default_pattern().id, "belly");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("display.show_progress_bar").as_deref(), Some("true"));
        assert_eq!(cfg.get("timer.frame_interval_ms").as_deref(), Some("33"));
        assert_eq!(cfg.get("timer.default_pattern").as_deref(), Some("box"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.apply("display.show_progress_bar", "false").unwrap();
        cfg.apply("meditation.default_minutes", "20").unwrap();
        cfg.apply("timer.default_pattern", "4-7-8").unwrap();
        assert!(!cfg.display.show_progress_bar);
        assert_eq!(cfg.meditation.default_minutes, 20);
        assert_eq!(cfg.default_pattern().id, "4-7-8");
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.apply("display.show_progress_bar", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.apply("timer.frame_interval_ms", "fast"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn apply_rejects_invalid_custom_pattern() {
        let mut cfg = Config::default();
        cfg.patterns.push(BreathingPattern::new("mine", 4.0, 4.0, 2));
        let bad = r#"[{"id":"mine","inhale":0,"exhale":4,"cycles":2}]"#;
        assert!(cfg.apply("patterns", bad).is_err());
        assert_eq!(cfg.patterns[0].inhale, 4.0);
    }

    #[test]
    fn apply_accepts_patterns_on_fresh_config() {
        let mut cfg = Config::default();
        cfg.apply("patterns", r#"[{"id":"calm","inhale":4,"exhale":6,"cycles":8}]"#)
            .unwrap();
        assert_eq!(cfg.find_pattern("calm").unwrap().exhale, 6.0);
    }

    #[test]
    fn unknown_default_pattern_falls_back_to_box() {
        let mut cfg = Config::default();
        cfg.timer.default_pattern = "nope".into();
        assert_eq!(cfg.default_pattern().id, "box");
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.timer.default_pattern, "box");

        std::fs::write(&path, "record_sessions = false\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert!(!cfg.record_sessions);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
