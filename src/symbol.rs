//! Symbol Surface - the vector drawing surface handed over by a symbol encoder
//!
//! Encoding rules and checksums live in the encoder, not here. This module
//! only defines what a populated surface looks like.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymbolFormat {
    Code128,
    Ean13,
    Upc,
    Code39,
    Itf,
}

impl Default for SymbolFormat {
    fn default() -> Self {
        Self::Code128
    }
}

/// Input to a symbol encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRequest {
    pub data: String,
    #[serde(default)]
    pub format: SymbolFormat,
    #[serde(default = "default_true")]
    pub display_value: bool,
    #[serde(default = "default_module_width")]
    pub module_width: f64,
    #[serde(default = "default_bar_height")]
    pub height: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
}

fn default_true() -> bool { true }
fn default_module_width() -> f64 { 2.0 }
fn default_bar_height() -> f64 { 100.0 }
fn default_margin() -> f64 { 10.0 }
fn default_font_size() -> f64 { 20.0 }

impl SymbolRequest {
    pub fn new(data: impl Into<String>, format: SymbolFormat) -> Self {
        Self {
            data: data.into(),
            format,
            display_value: true,
            module_width: default_module_width(),
            height: default_bar_height(),
            margin: default_margin(),
            font_size: default_font_size(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("Data {data:?} cannot be encoded as {format:?}: {reason}")]
    InvalidData {
        data: String,
        format: SymbolFormat,
        reason: String,
    },

    #[error("Symbol format {0:?} is not supported by this encoder")]
    UnsupportedFormat(SymbolFormat),
}

/// External capability that draws a barcode onto a vector surface
pub trait SymbolEncoder {
    fn encode(&self, request: &SymbolRequest) -> Result<VectorSurface, SymbolError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub content: String,
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_anchor")]
    pub anchor: TextAnchor,
}

fn default_font_family() -> String { "monospace".to_string() }
fn default_anchor() -> TextAnchor { TextAnchor::Middle }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SurfaceNode {
    Rect(Rect),
    Text(TextRun),
}

/// A populated vector drawing surface, in user units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSurface {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default = "default_foreground")]
    pub foreground: String,
    #[serde(default)]
    pub nodes: Vec<SurfaceNode>,
}

fn default_foreground() -> String { "#000000".to_string() }

impl VectorSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: None,
            foreground: default_foreground(),
            nodes: vec![],
        }
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    pub fn push_bar(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.nodes.push(SurfaceNode::Rect(Rect { x, y, width, height }));
    }

    pub fn push_text(&mut self, x: f64, y: f64, content: impl Into<String>, font_size: f64) {
        self.nodes.push(SurfaceNode::Text(TextRun {
            x,
            y,
            content: content.into(),
            font_size,
            font_family: default_font_family(),
            anchor: TextAnchor::Middle,
        }));
    }

    /// A surface with nothing drawable on it counts as "no symbol"
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
