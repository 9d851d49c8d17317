//! Bitmap Encoder - composited canvas to PNG
//!
//! Output is lossless 8-bit RGB. The canvas is always opaque, so alpha is
//! dropped. A `pHYs` chunk records the DPI so the file prints at its
//! physical size.

use resvg::tiny_skia::Pixmap;

use crate::compositor::CompositedRaster;
use crate::dimensions::CM_PER_INCH;
use crate::error::ExportError;

/// Pixels per meter for a DPI, as stored in `pHYs`
pub fn pixels_per_meter(dpi: u32) -> u32 {
    (f64::from(dpi) / (CM_PER_INCH / 100.0)).round() as u32
}

#[derive(Debug, Clone, Default)]
pub struct BitmapEncoder;

impl BitmapEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode off the calling task and await the bytes
    pub async fn encode(&self, raster: CompositedRaster, dpi: u32) -> Result<Vec<u8>, ExportError> {
        let pixmap = raster.into_pixmap();
        let bytes = tokio::task::spawn_blocking(move || encode_png(&pixmap, dpi))
            .await
            .map_err(|e| ExportError::EncodeFailure(format!("encoder task failed: {}", e)))??;
        non_empty(bytes)
    }
}

fn non_empty(bytes: Vec<u8>) -> Result<Vec<u8>, ExportError> {
    if bytes.is_empty() {
        return Err(ExportError::EncodeFailure("encoder produced no data".into()));
    }
    Ok(bytes)
}

/// Encode a pixmap as RGB PNG with physical resolution metadata
pub fn encode_png(pixmap: &Pixmap, dpi: u32) -> Result<Vec<u8>, ExportError> {
    let (width, height) = (pixmap.width(), pixmap.height());

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgb.extend_from_slice(&[color.red(), color.green(), color.blue()]);
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = pixels_per_meter(dpi);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::EncodeFailure(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(&rgb)
            .map_err(|e| ExportError::EncodeFailure(format!("PNG data: {}", e)))?;
        writer
            .finish()
            .map_err(|e| ExportError::EncodeFailure(format!("PNG trailer: {}", e)))?;
    }

    Ok(png_data)
}
