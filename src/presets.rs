//! Label Presets - named physical sizes loaded from JSON

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::dimensions::PhysicalSize;
use crate::print::{PrintSettings, DEFAULT_DPI};
use crate::ENGINE_VERSION;

pub type PresetId = String;

pub const DEFAULT_PRESET: &str = "label-5x3";

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Preset not found: {0}")]
    NotFound(String),

    #[error("Preset {id} requires engine >= {required}, current is {current}")]
    EngineVersionMismatch {
        id: String,
        required: String,
        current: String,
    },

    #[error("Invalid version string: {0}")]
    InvalidVersion(#[from] semver::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelPreset {
    pub id: PresetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub width_cm: f64,
    pub height_cm: f64,
    #[serde(default = "default_dpi")]
    pub default_dpi: u32,
    #[serde(default = "default_true")]
    pub include_text: bool,
    #[serde(default = "default_engine_min")]
    pub engine_min_version: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub superseded_by: Option<String>,
}

fn default_dpi() -> u32 { DEFAULT_DPI }
fn default_true() -> bool { true }
fn default_engine_min() -> String { "1.0.0".to_string() }

impl LabelPreset {
    pub fn size(&self) -> PhysicalSize {
        PhysicalSize::new(self.width_cm, self.height_cm)
    }

    /// Settings for this preset, optionally at a different resolution
    pub fn settings(&self, dpi: Option<u32>) -> PrintSettings {
        PrintSettings::from_preset(self.size(), dpi.unwrap_or(self.default_dpi), self.include_text)
    }
}

fn builtin_label() -> LabelPreset {
    LabelPreset {
        id: DEFAULT_PRESET.to_string(),
        name: "Product label 5 x 3 cm".to_string(),
        description: "Default shelf label".to_string(),
        width_cm: 5.0,
        height_cm: 3.0,
        default_dpi: DEFAULT_DPI,
        include_text: true,
        engine_min_version: default_engine_min(),
        deprecated: false,
        superseded_by: None,
    }
}

/// Preset registry; always holds the built-in 5 x 3 cm label
pub struct PresetRegistry {
    presets: BTreeMap<PresetId, LabelPreset>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        let mut registry = Self { presets: BTreeMap::new() };
        registry.register(builtin_label());
        registry
    }

    /// Load every `*.json` preset in `dir` on top of the built-ins.
    /// Unreadable or malformed files are skipped with a warning.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut registry = Self::new();
        if !dir.exists() {
            return Ok(registry);
        }
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<LabelPreset>(&content).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(preset) => registry.register(preset),
                Err(e) => log::warn!("skipping preset {}: {}", path.display(), e),
            }
        }
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&LabelPreset> {
        self.presets.get(id)
    }

    /// Look up a preset and check it is usable with this engine
    pub fn resolve(&self, id: &str) -> Result<&LabelPreset, PresetError> {
        let preset = self.get(id).ok_or_else(|| PresetError::NotFound(id.to_string()))?;

        let engine = semver::Version::parse(ENGINE_VERSION)?;
        let required = semver::Version::parse(&preset.engine_min_version)?;
        if engine < required {
            return Err(PresetError::EngineVersionMismatch {
                id: preset.id.clone(),
                required: preset.engine_min_version.clone(),
                current: ENGINE_VERSION.to_string(),
            });
        }

        if preset.deprecated {
            log::warn!(
                "preset {} is deprecated{}",
                preset.id,
                preset
                    .superseded_by
                    .as_deref()
                    .map(|s| format!(", use {}", s))
                    .unwrap_or_default()
            );
        }
        Ok(preset)
    }

    pub fn list(&self) -> Vec<&LabelPreset> {
        self.presets.values().collect()
    }

    pub fn register(&mut self, preset: LabelPreset) {
        self.presets.insert(preset.id.clone(), preset);
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
