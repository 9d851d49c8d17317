//! Raster Compositor
//!
//! Decodes a vector snapshot and draws it scale-to-fit, centered, over an
//! opaque white canvas of an exact pixel size.
//!
//! Padding only shrinks the box used to compute the scale. Centering is
//! always against the full canvas.

use std::sync::Arc;

use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{self, fontdb};
use serde::Serialize;

use crate::error::ExportError;
use crate::resource::{ResourceHandle, ResourceStore};

/// Fraction of the shorter canvas side reserved as quiet zone on every edge
pub const QUIET_ZONE_RATIO: f64 = 0.04;

/// Where the symbol lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub pad: u32,
    pub avail_width: u32,
    pub avail_height: u32,
    pub scale: f64,
    pub final_width: u32,
    pub final_height: u32,
    pub dx: i64,
    pub dy: i64,
}

/// `round(min(w, h) * 0.04)`
pub fn quiet_zone_px(canvas_width: u32, canvas_height: u32) -> u32 {
    (f64::from(canvas_width.min(canvas_height)) * QUIET_ZONE_RATIO).round() as u32
}

/// Compute the scale-to-fit rectangle for an image of intrinsic size
/// `(image_width, image_height)` on a `(canvas_width, canvas_height)` canvas.
///
/// Upscaling is allowed: a small image is stretched to fill the available
/// box. A zero, negative or non-finite image extent is `DegenerateGeometry`,
/// as is a placement that rounds down to nothing.
pub fn compute_placement(
    canvas_width: u32,
    canvas_height: u32,
    image_width: f64,
    image_height: f64,
) -> Result<Placement, ExportError> {
    let degenerate = || ExportError::DegenerateGeometry {
        width: image_width,
        height: image_height,
    };
    if !(image_width.is_finite() && image_height.is_finite())
        || image_width <= 0.0
        || image_height <= 0.0
    {
        return Err(degenerate());
    }

    let pad = quiet_zone_px(canvas_width, canvas_height);
    let avail_width = canvas_width.saturating_sub(2 * pad);
    let avail_height = canvas_height.saturating_sub(2 * pad);

    let scale = (f64::from(avail_width) / image_width).min(f64::from(avail_height) / image_height);
    let final_width = (image_width * scale).round() as u32;
    let final_height = (image_height * scale).round() as u32;
    if final_width == 0 || final_height == 0 {
        return Err(degenerate());
    }

    let dx = ((i64::from(canvas_width) - i64::from(final_width)) as f64 / 2.0).round() as i64;
    let dy = ((i64::from(canvas_height) - i64::from(final_height)) as f64 / 2.0).round() as i64;

    Ok(Placement {
        pad,
        avail_width,
        avail_height,
        scale,
        final_width,
        final_height,
        dx,
        dy,
    })
}

/// A snapshot decoded to an intrinsic-sized, drawable image
pub struct DecodedSymbol {
    tree: usvg::Tree,
    pub width: f64,
    pub height: f64,
}

impl std::fmt::Debug for DecodedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedSymbol")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// The opaque canvas with the symbol drawn on it
#[derive(Debug)]
pub struct CompositedRaster {
    pixmap: Pixmap,
    pub placement: Placement,
}

impl CompositedRaster {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }
}

#[derive(Debug, Clone)]
pub struct RasterCompositor {
    fontdb: Arc<fontdb::Database>,
}

impl Default for RasterCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterCompositor {
    /// Compositor without fonts; text nodes in a symbol are skipped
    pub fn new() -> Self {
        Self {
            fontdb: Arc::new(fontdb::Database::new()),
        }
    }

    pub fn with_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("loaded {} font faces", db.len());
        Self { fontdb: Arc::new(db) }
    }

    /// Decode the resource behind `handle` into an intrinsic-sized image.
    ///
    /// `declared` is the size the document was written with. A document
    /// the decoder rejects for its size is reported as `DegenerateGeometry`
    /// with that size.
    pub async fn decode(
        &self,
        store: &ResourceStore,
        handle: &ResourceHandle,
        declared: (f64, f64),
    ) -> Result<DecodedSymbol, ExportError> {
        let blob = store
            .resolve(handle)
            .ok_or_else(|| ExportError::DecodeFailure(format!("{} is not a live resource", handle)))?;
        let fontdb = Arc::clone(&self.fontdb);

        let tree = tokio::task::spawn_blocking(move || {
            let mut options = usvg::Options::default();
            options.fontdb = fontdb;
            usvg::Tree::from_data(&blob.bytes, &options)
        })
        .await
        .map_err(|e| ExportError::DecodeFailure(format!("decoder task failed: {}", e)))?
        .map_err(|e| match e {
            usvg::Error::InvalidSize => ExportError::DegenerateGeometry {
                width: declared.0,
                height: declared.1,
            },
            e => ExportError::DecodeFailure(e.to_string()),
        })?;

        let size = tree.size();
        let (width, height) = (f64::from(size.width()), f64::from(size.height()));
        if width <= 0.0 || height <= 0.0 {
            return Err(ExportError::DegenerateGeometry { width, height });
        }

        Ok(DecodedSymbol { tree, width, height })
    }

    /// Draw a decoded symbol onto a fresh white canvas of exactly `canvas`
    pub fn compose(
        &self,
        symbol: &DecodedSymbol,
        canvas: (u32, u32),
    ) -> Result<CompositedRaster, ExportError> {
        let (canvas_width, canvas_height) = canvas;
        let placement = compute_placement(canvas_width, canvas_height, symbol.width, symbol.height)?;

        let mut pixmap = Pixmap::new(canvas_width, canvas_height).ok_or(ExportError::CanvasTooLarge {
            width: u64::from(canvas_width),
            height: u64::from(canvas_height),
        })?;
        pixmap.fill(Color::WHITE);

        // Stretch to the rounded rectangle, like drawImage(img, dx, dy, w, h).
        let sx = f64::from(placement.final_width) / symbol.width;
        let sy = f64::from(placement.final_height) / symbol.height;
        let transform = Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            placement.dx as f32,
            placement.dy as f32,
        );
        resvg::render(&symbol.tree, transform, &mut pixmap.as_mut());

        log::debug!(
            "composited {}x{} symbol into {}x{} canvas at ({}, {}), pad {}",
            placement.final_width,
            placement.final_height,
            canvas_width,
            canvas_height,
            placement.dx,
            placement.dy,
            placement.pad
        );

        Ok(CompositedRaster { pixmap, placement })
    }

    /// Decode then compose
    pub async fn rasterize(
        &self,
        store: &ResourceStore,
        handle: &ResourceHandle,
        declared: (f64, f64),
        canvas: (u32, u32),
    ) -> Result<CompositedRaster, ExportError> {
        let symbol = self.decode(store, handle, declared).await?;
        self.compose(&symbol, canvas)
    }
}
