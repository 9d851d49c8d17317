//! Print Settings
//!
//! The parameters one export consumes: physical size, resolution and
//! whether the encoder should draw human-readable text.

use serde::{Deserialize, Serialize};

use crate::dimensions::{compute_canvas_px, PhysicalSize, PixelCanvasSize};
use crate::validation::{ValidationResult, Validator};

pub const DEFAULT_DPI: u32 = 300;
pub const MIN_USER_DPI: u32 = 72;
pub const MAX_USER_DPI: u32 = 1200;

/// Where a set of print settings came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintAuthority {
    /// Built-in defaults
    System,
    /// A label preset
    Preset,
    /// User-provided values, validated at the boundary
    User,
}

impl Default for PrintAuthority {
    fn default() -> Self {
        Self::System
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    #[serde(default)]
    pub authority: PrintAuthority,
    pub dpi: u32,
    #[serde(flatten)]
    pub size: PhysicalSize,
    #[serde(default = "default_true")]
    pub include_text: bool,
}

fn default_true() -> bool { true }

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            authority: PrintAuthority::System,
            dpi: DEFAULT_DPI,
            size: PhysicalSize::default(),
            include_text: true,
        }
    }
}

impl PrintSettings {
    pub fn from_preset(size: PhysicalSize, dpi: u32, include_text: bool) -> Self {
        Self {
            authority: PrintAuthority::Preset,
            dpi,
            size,
            include_text,
        }
    }

    /// Create from user input; rejected unless every validation rule passes
    pub fn from_user(size: PhysicalSize, dpi: u32, include_text: bool) -> Result<Self, ValidationResult> {
        let settings = Self {
            authority: PrintAuthority::User,
            dpi,
            size,
            include_text,
        };
        let result = Validator::new().validate(&settings);
        if result.valid {
            Ok(settings)
        } else {
            Err(result)
        }
    }

    pub fn canvas(&self) -> PixelCanvasSize {
        compute_canvas_px(self.size.width_cm, self.size.height_cm, self.dpi)
    }
}
