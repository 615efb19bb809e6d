//! Hull extraction settings
//!
//! Settings are plain TOML so they can live next to a project or in the
//! user's config directory:
//!
//! ```toml
//! alpha_threshold = 0
//! hull_scale = 1.0
//! material_tag = "tile"
//!
//! [unassigned_color]
//! r = 0.75
//! g = 0.75
//! b = 0.75
//! a = 1.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tilehull_core::{Color, HullExtractor, DEFAULT_ALPHA_THRESHOLD};

/// Errors that can occur when loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Tunables for hull extraction and display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullSettings {
    /// Alpha values strictly above this count as solid
    pub alpha_threshold: u8,
    /// Pixel-to-physics-unit multiplier for every hull vertex
    pub hull_scale: f32,
    /// Material tag given to new tile sets
    pub material_tag: String,
    /// Hull color of tiles without a collision group
    pub unassigned_color: Color,
}

impl Default for HullSettings {
    fn default() -> Self {
        Self {
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            hull_scale: 1.0,
            material_tag: "tile".to_string(),
            unassigned_color: Color::UNASSIGNED,
        }
    }
}

impl HullSettings {
    /// Parse settings from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: HullSettings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.hull_scale.is_finite() || self.hull_scale <= 0.0 {
            return Err(SettingsError::Invalid(format!(
                "hull_scale must be a positive number, got {}",
                self.hull_scale
            )));
        }
        if self.material_tag.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "material_tag must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The extractor these settings describe
    pub fn extractor(&self) -> HullExtractor {
        HullExtractor::new(self.alpha_threshold, self.hull_scale)
    }
}
