//! Viewer settings and preferences
//!
//! Edited in the settings panel and persisted separately from the cart and
//! wishlist.

use serde::{Deserialize, Serialize};

use crate::consts::SETTINGS_KEY;
use crate::platform::KeyValueStore;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Highest device pixel ratio the viewer should render at
    pub fn pixel_ratio_cap(&self) -> f32 {
        match self {
            QualityPreset::Low => 1.0,
            QualityPreset::Medium => 1.5,
            QualityPreset::High => 2.0,
        }
    }

    /// Whether the viewer should compute shadows
    pub fn shadows_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Viewer settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render quality preset
    pub quality: QualityPreset,
    /// Slowly spin models in the viewer
    pub auto_rotate: bool,
    /// Reduced motion (disables auto-rotate)
    pub reduced_motion: bool,
    /// Show success toasts (errors are always shown)
    pub toasts: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            auto_rotate: true,
            reduced_motion: false,
            toasts: true,
        }
    }
}

/// What the page's viewer actually applies, derived from `Settings`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerOptions {
    pub quality: QualityPreset,
    pub auto_rotate: bool,
    pub pixel_ratio_cap: f32,
    pub shadows: bool,
}

impl Settings {
    /// Effective auto-rotate (respects reduced_motion)
    pub fn effective_auto_rotate(&self) -> bool {
        self.auto_rotate && !self.reduced_motion
    }

    /// Options handed to the viewer
    pub fn viewer_options(&self) -> ViewerOptions {
        ViewerOptions {
            quality: self.quality,
            auto_rotate: self.effective_auto_rotate(),
            pixel_ratio_cap: self.quality.pixel_ratio_cap(),
            shadows: self.quality.shadows_enabled(),
        }
    }

    /// Load settings, falling back to defaults
    pub fn load(storage: &impl KeyValueStore) -> Self {
        if let Ok(Some(json)) = storage.get_item(SETTINGS_KEY) {
            if let Ok(settings) = serde_json::from_str(&json) {
                log::info!("Loaded settings");
                return settings;
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings. Failures are logged.
    pub fn save(&self, storage: &impl KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                storage
                    .set_item(SETTINGS_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}
