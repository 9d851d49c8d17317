//! Vector Snapshot Serializer
//!
//! Captures a populated surface as a standalone SVG document and registers
//! it in the resource store. The snapshot handle is revoked when the
//! snapshot is dropped.

use std::fmt::Write as _;

use crate::error::ExportError;
use crate::resource::{Blob, ResourceHandle, ResourceStore, ScopedResource, MIME_SVG};
use crate::symbol::{SurfaceNode, VectorSurface};

/// A serialized surface owned by one export attempt
#[derive(Debug)]
pub struct VectorSnapshot {
    resource: ScopedResource,
    pub declared_size: (f64, f64),
    pub byte_len: usize,
}

impl VectorSnapshot {
    pub fn handle(&self) -> ResourceHandle {
        self.resource.handle()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VectorSnapshotSerializer;

impl VectorSnapshotSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize the surface and register it as an SVG blob.
    ///
    /// An absent or empty surface yields `SymbolUnavailable` and creates no
    /// handle.
    pub fn capture(
        &self,
        store: &ResourceStore,
        surface: Option<&VectorSurface>,
    ) -> Result<VectorSnapshot, ExportError> {
        let surface = surface
            .ok_or_else(|| ExportError::SymbolUnavailable("no drawing surface".into()))?;
        if surface.is_empty() {
            return Err(ExportError::SymbolUnavailable("drawing surface is empty".into()));
        }

        let document = serialize_svg(surface)?;
        let byte_len = document.len();
        let resource = store.create_scoped(Blob::new(MIME_SVG, document.into_bytes()));

        Ok(VectorSnapshot {
            resource,
            declared_size: (surface.width, surface.height),
            byte_len,
        })
    }
}

/// Render the surface as a self-contained SVG document
pub fn serialize_svg(surface: &VectorSurface) -> Result<String, ExportError> {
    check_finite("surface size", &[surface.width, surface.height])?;

    let mut out = String::new();
    write_document(&mut out, surface)
        .map_err(|e| ExportError::SerializationFailure(e.to_string()))?;
    Ok(out)
}

fn write_document(out: &mut String, surface: &VectorSurface) -> Result<(), SerializeError> {
    let (w, h) = (surface.width, surface.height);
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    )?;

    if let Some(background) = &surface.background {
        writeln!(
            out,
            r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}"/>"#,
            escape_xml(background)
        )?;
    }

    writeln!(out, r#"<g fill="{}">"#, escape_xml(&surface.foreground))?;
    for node in &surface.nodes {
        match node {
            SurfaceNode::Rect(r) => {
                finite("bar", &[r.x, r.y, r.width, r.height])?;
                writeln!(
                    out,
                    r#"  <rect x="{}" y="{}" width="{}" height="{}"/>"#,
                    r.x, r.y, r.width, r.height
                )?;
            }
            SurfaceNode::Text(t) => {
                finite("text", &[t.x, t.y, t.font_size])?;
                writeln!(
                    out,
                    r#"  <text x="{}" y="{}" font-family="{}" font-size="{}" text-anchor="{}">{}</text>"#,
                    t.x,
                    t.y,
                    escape_xml(&t.font_family),
                    t.font_size,
                    t.anchor.as_svg(),
                    escape_xml(&t.content)
                )?;
            }
        }
    }
    writeln!(out, "</g>")?;
    write!(out, "</svg>")?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum SerializeError {
    #[error("formatter error")]
    Format(#[from] std::fmt::Error),
    #[error("{0} has non-finite geometry")]
    NonFinite(&'static str),
}

fn finite(what: &'static str, values: &[f64]) -> Result<(), SerializeError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SerializeError::NonFinite(what))
    }
}

fn check_finite(what: &'static str, values: &[f64]) -> Result<(), ExportError> {
    finite(what, values).map_err(|e| ExportError::SerializationFailure(e.to_string()))
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
