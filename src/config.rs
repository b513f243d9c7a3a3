use crate::error::Result;
use crate::subtype_matcher::SubtypeMatcher;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Device policy for the doze trigger sensors, read once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DozeConfig {
    pub pulse_on_sig_motion: bool,
    pub pickup_gesture_supported: bool,
    pub ambient_display_available: bool,
    /// Vendor string type of the double tap sensor. Empty when the device has none.
    pub double_tap_sensor_type: String,
    /// Subtype spec for pickup gestures that already ran a proximity check.
    pub pickup_subtype_performs_prox_check: String,
}

impl Default for DozeConfig {
    fn default() -> Self {
        Self {
            pulse_on_sig_motion: false,
            pickup_gesture_supported: true,
            ambient_display_available: true,
            double_tap_sensor_type: String::new(),
            pickup_subtype_performs_prox_check: "!*".to_string(),
        }
    }
}

impl DozeConfig {
    pub fn pulse_on_pickup_available(&self) -> bool {
        self.pickup_gesture_supported && self.ambient_display_available
    }

    pub fn pickup_prox_matcher(&self) -> Result<SubtypeMatcher> {
        SubtypeMatcher::parse(&self.pickup_subtype_performs_prox_check)
    }

    /// Default config file location, e.g. `~/.config/doze-sensors/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("doze-sensors")
            .join("config.json")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from `path` if it exists (defaults otherwise), then apply env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("DOZE_PULSE_ON_SIG_MOTION").and_then(|v| parse_bool(&v)) {
            self.pulse_on_sig_motion = v;
        }
        if let Some(v) = lookup("DOZE_PICKUP_SUPPORTED").and_then(|v| parse_bool(&v)) {
            self.pickup_gesture_supported = v;
        }
        if let Some(v) = lookup("DOZE_AMBIENT_AVAILABLE").and_then(|v| parse_bool(&v)) {
            self.ambient_display_available = v;
        }
        if let Some(sensor_type) = lookup("DOZE_DOUBLE_TAP_TYPE") {
            self.double_tap_sensor_type = sensor_type;
        }
        if let Some(spec) = lookup("DOZE_PICKUP_PROX_SUBTYPES") {
            self.pickup_subtype_performs_prox_check = spec;
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
