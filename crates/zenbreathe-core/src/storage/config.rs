//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Guided voice on/off and voice volume
//! - Ambient soundscape and its volume
//! - Haptic pulse length
//! - Pre-session countdown and tick interval
//! - Custom breathing patterns
//!
//! Configuration is stored at `~/.config/zenbreathe/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::breath::{find_preset, presets, BreathingPattern};
use crate::cues::{VoiceSettings, DEFAULT_PULSE_MS};
use crate::error::{ConfigError, CoreError, PatternError, Result};
use crate::platform::AmbientMode;

/// Spoken guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_true")]
    pub guided_enabled: bool,
    #[serde(default = "default_voice_volume")]
    pub volume: u8,
}

/// Background soundscape. Only plays while guided meditation is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientConfig {
    #[serde(default)]
    pub mode: AmbientMode,
    #[serde(default = "default_50")]
    pub volume: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HapticsConfig {
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Spoken "3, 2, 1" before the first phase. 0 disables it.
    #[serde(default)]
    pub countdown_secs: u32,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/zenbreathe/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
    #[serde(default)]
    pub haptics: HapticsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// User-defined patterns, looked up after the presets.
    #[serde(default)]
    pub custom_patterns: Vec<BreathingPattern>,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_voice_volume() -> u8 {
    80
}
fn default_50() -> u8 {
    50
}
fn default_pulse_ms() -> u32 {
    DEFAULT_PULSE_MS
}
fn default_tick_interval_ms() -> u64 {
    100
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            guided_enabled: true,
            volume: default_voice_volume(),
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            mode: AmbientMode::Off,
            volume: 50,
        }
    }
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            pulse_ms: default_pulse_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 0,
            tick_interval_ms: default_tick_interval_ms(),
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
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if key.is_empty() {
            return Err(unknown());
        }

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
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

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there when it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
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

    /// Update a value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.check_ranges()?;
        *self = updated;
        Ok(())
    }

    /// Volumes are percentages.
    fn check_ranges(&self) -> std::result::Result<(), ConfigError> {
        for (key, volume) in [
            ("voice.volume", self.voice.volume),
            ("ambient.volume", self.ambient.volume),
        ] {
            if volume > 100 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{volume} is outside 0..=100"),
                });
            }
        }
        Ok(())
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Flattened `key = value` pairs for every leaf setting.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings::new(self.voice.guided_enabled, self.voice.volume)
    }

    /// Every pattern available to a session: presets first, then custom ones.
    pub fn patterns(&self) -> Vec<BreathingPattern> {
        let mut all = presets();
        all.extend(self.custom_patterns.iter().cloned());
        all
    }

    /// Look up a preset or custom pattern by id.
    pub fn find_pattern(&self, id: &str) -> std::result::Result<BreathingPattern, PatternError> {
        if let Some(p) = find_preset(id) {
            return Ok(p);
        }
        let pattern = self
            .custom_patterns
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| PatternError::Unknown(id.to_string()))?;
        pattern.validate()?;
        Ok(pattern)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
