//! Barcode Raster - physical-size-aware barcode export
//!
//! Turns the vector surface produced by a barcode symbol encoder into a PNG
//! of exactly `round(cm * dpi / 2.54)` pixels per side: white background,
//! quiet zone on every edge, symbol scaled to fit and centered.
//!
//! Pipeline: [`snapshot`] -> [`compositor`] -> [`encoder`], sequenced by
//! [`export::ExportOrchestrator`].

pub mod dimensions;
pub mod error;
pub mod symbol;
pub mod resource;
pub mod snapshot;
pub mod compositor;
pub mod encoder;
pub mod print;
pub mod validation;
pub mod presets;
pub mod hashing;
pub mod export;

pub use dimensions::{compute_canvas_px, CanvasLimits, PhysicalSize, PixelCanvasSize};
pub use error::ExportError;
pub use symbol::{SymbolEncoder, SymbolError, SymbolFormat, SymbolRequest, VectorSurface};
pub use resource::{Blob, ResourceHandle, ResourceStore};
pub use compositor::{compute_placement, Placement, RasterCompositor};
pub use encoder::BitmapEncoder;
pub use snapshot::{VectorSnapshot, VectorSnapshotSerializer};
pub use print::{PrintAuthority, PrintSettings};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};
pub use presets::{LabelPreset, PresetRegistry};
pub use hashing::{canonical_json, compute_job_hash, compute_manifest_hash};
pub use export::{Download, ExportOrchestrator, ExportPhase, OrchestratorConfig};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
