//! Export Error Taxonomy
//!
//! Every failure of an export attempt maps to exactly one variant, and the
//! `Display` text is the user-visible message.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("No symbol to export: {0}")]
    SymbolUnavailable(String),

    #[error("Failed to serialize symbol: {0}")]
    SerializationFailure(String),

    #[error("Unable to decode symbol image: {0}")]
    DecodeFailure(String),

    #[error("Decoded symbol has zero extent ({width}x{height})")]
    DegenerateGeometry { width: f64, height: f64 },

    #[error("Failed to encode bitmap: {0}")]
    EncodeFailure(String),

    #[error("Canvas {width}x{height} px exceeds the raster limits; lower the DPI")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("Invalid export settings: {0}")]
    InvalidSettings(String),

    #[error("An export is already in progress")]
    Busy,
}

impl ExportError {
    /// Short machine-readable code, used in CLI output and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::SymbolUnavailable(_) => "symbol_unavailable",
            Self::SerializationFailure(_) => "serialization_failure",
            Self::DecodeFailure(_) => "decode_failure",
            Self::DegenerateGeometry { .. } => "degenerate_geometry",
            Self::EncodeFailure(_) => "encode_failure",
            Self::CanvasTooLarge { .. } => "canvas_too_large",
            Self::InvalidSettings(_) => "invalid_settings",
            Self::Busy => "busy",
        }
    }
}
