use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use agetally_core::shared::constants::{AGE_MODEL_NAME, DETECTOR_MODEL_NAME};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub age_model: String,
    pub detector_model: String,
    pub model_dir: Option<PathBuf>,
    pub age_model_url: Option<String>,
    pub detector_model_url: Option<String>,
    /// Detector confidence threshold in percent.
    pub confidence: u32,
    pub camera_command: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            age_model: AGE_MODEL_NAME.to_string(),
            detector_model: DETECTOR_MODEL_NAME.to_string(),
            model_dir: None,
            age_model_url: None,
            detector_model_url: None,
            confidence: 50,
            camera_command: None,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("AgeTally").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            log::warn!("No config directory; settings not saved");
            return;
        };
        match self.save_to(&path) {
            Ok(()) => log::info!("Saved settings to {}", path.display()),
            Err(e) => log::warn!("Failed to save settings to {}: {e}", path.display()),
        }
    }

    /// Missing or malformed files fall back to defaults.
    fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence.min(100) as f64 / 100.0
    }
}
