//! Shared fixtures for integration tests

use barcode_raster::{
    symbol::{SymbolEncoder, SymbolError, SymbolFormat, SymbolRequest},
    VectorSurface,
};

/// Draws one module per data bit between `101` guard patterns.
/// Not a real symbology; it only has to be deterministic and symmetric.
pub struct StripeEncoder;

impl SymbolEncoder for StripeEncoder {
    fn encode(&self, request: &SymbolRequest) -> Result<VectorSurface, SymbolError> {
        if request.format != SymbolFormat::Code128 {
            return Err(SymbolError::UnsupportedFormat(request.format));
        }

        let mut modules = vec![true, false, true];
        for byte in request.data.bytes() {
            modules.extend((0..8).rev().map(|bit| (byte >> bit) & 1 == 1));
        }
        modules.extend([true, false, true]);

        let text_height = if request.display_value { request.font_size + 2.0 } else { 0.0 };
        let width = 2.0 * request.margin + modules.len() as f64 * request.module_width;
        let height = 2.0 * request.margin + request.height + text_height;

        let mut surface = VectorSurface::new(width, height).with_background("#ffffff");
        for (i, _) in modules.iter().enumerate().filter(|(_, on)| **on) {
            surface.push_bar(
                request.margin + i as f64 * request.module_width,
                request.margin,
                request.module_width,
                request.height,
            );
        }
        if request.display_value {
            surface.push_text(
                width / 2.0,
                request.margin + request.height + request.font_size,
                request.data.clone(),
                request.font_size,
            );
        }
        Ok(surface)
    }
}

pub fn request(data: &str) -> SymbolRequest {
    SymbolRequest {
        display_value: false,
        ..SymbolRequest::new(data, SymbolFormat::Code128)
    }
}

pub fn surface(data: &str) -> VectorSurface {
    StripeEncoder.encode(&request(data)).unwrap()
}

/// Decoded PNG as (width, height, rgb bytes)
pub fn decode_png(bytes: &[u8]) -> (u32, u32, Vec<u8>) {
    let decoder = png::Decoder::new(bytes);
    let mut reader = decoder.read_info().expect("decode");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("frame");
    assert_eq!(info.color_type, png::ColorType::Rgb);
    buf.truncate(info.buffer_size());
    (info.width, info.height, buf)
}

pub fn rgb_at(pixels: &[u8], width: u32, x: u32, y: u32) -> [u8; 3] {
    let i = ((y * width + x) * 3) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2]]
}
