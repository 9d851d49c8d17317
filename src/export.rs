//! Export Orchestrator - Single Entry Point
//!
//! Sequences serialize -> rasterize -> encode for one export attempt and
//! owns the single "current download" slot.
//!
//! Every temporary handle of an attempt is released before the attempt
//! returns, whether it succeeded or not. Only the final PNG outlives it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::compositor::{Placement, RasterCompositor};
use crate::dimensions::CanvasLimits;
use crate::encoder::BitmapEncoder;
use crate::error::ExportError;
use crate::hashing::{compute_job_hash, compute_manifest_hash, sha256_hex};
use crate::print::PrintSettings;
use crate::resource::{Blob, ResourceHandle, ResourceStore, MIME_PNG};
use crate::snapshot::VectorSnapshotSerializer;
use crate::symbol::{SymbolEncoder, SymbolRequest, VectorSurface};
use crate::ENGINE_VERSION;

pub const DEFAULT_FILE_STEM: &str = "barcode";

/// `{data}_{width}x{height}cm.png`, with `barcode` standing in for empty data
pub fn suggested_filename(data: &str, settings: &PrintSettings) -> String {
    let stem: String = if data.is_empty() {
        DEFAULT_FILE_STEM.to_string()
    } else {
        data.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    };
    format!(
        "{}_{}x{}cm.png",
        stem, settings.size.width_cm, settings.size.height_cm
    )
}

fn manifest_failure(e: serde_json::Error) -> ExportError {
    ExportError::SerializationFailure(format!("manifest: {}", e))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportPhase {
    Idle,
    Serializing,
    Rasterizing,
    Encoding,
    Ready(ResourceHandle),
    Failed(ExportError),
}

/// A finished export: the PNG's handle plus everything needed to reproduce it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub id: String,
    pub handle: ResourceHandle,
    pub filename: String,
    pub mime: String,
    pub size: [u32; 2],
    pub dpi: u32,
    pub physical_size_cm: [f64; 2],
    pub placement: PlacementRecord,
    pub byte_len: usize,
    pub sha256: String,
    pub job_hash: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub manifest_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    pub pad: u32,
    pub dx: i64,
    pub dy: i64,
    pub width: u32,
    pub height: u32,
}

impl From<Placement> for PlacementRecord {
    fn from(p: Placement) -> Self {
        Self {
            pad: p.pad,
            dx: p.dx,
            dy: p.dy,
            width: p.final_width,
            height: p.final_height,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub limits: CanvasLimits,
    #[serde(default)]
    pub system_fonts: bool,
}

struct SlotState {
    phase: ExportPhase,
    download: Option<Download>,
}

/// Clears the in-flight flag when an attempt ends, however it ends
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ExportOrchestrator {
    store: ResourceStore,
    serializer: VectorSnapshotSerializer,
    compositor: RasterCompositor,
    encoder: BitmapEncoder,
    limits: CanvasLimits,
    state: Mutex<SlotState>,
    in_flight: AtomicBool,
}

impl ExportOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let compositor = if config.system_fonts {
            RasterCompositor::with_system_fonts()
        } else {
            RasterCompositor::new()
        };
        Self {
            store: ResourceStore::new(),
            serializer: VectorSnapshotSerializer::new(),
            compositor,
            encoder: BitmapEncoder::new(),
            limits: config.limits,
            state: Mutex::new(SlotState {
                phase: ExportPhase::Idle,
                download: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    fn slot(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: ExportPhase) {
        log::debug!("export phase -> {:?}", phase);
        self.slot().phase = phase;
    }

    pub fn phase(&self) -> ExportPhase {
        self.slot().phase.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Metadata of the current download, if any
    pub fn current_download(&self) -> Option<Download> {
        self.slot().download.clone()
    }

    /// The current download together with its bytes, read under one lock
    pub fn fetch_download(&self) -> Option<(Download, Arc<Blob>)> {
        let slot = self.slot();
        let download = slot.download.clone()?;
        let blob = self.store.resolve(&download.handle)?;
        Some((download, blob))
    }

    /// Swap in a new download and revoke the one it replaces
    fn replace_download(&self, download: Download) {
        let mut slot = self.slot();
        slot.phase = ExportPhase::Ready(download.handle);
        if let Some(previous) = slot.download.replace(download) {
            self.store.revoke(&previous.handle);
            log::debug!("replaced download {}", previous.filename);
        }
    }

    /// Drop the current download, if any
    pub fn clear_download(&self) {
        let mut slot = self.slot();
        if let Some(previous) = slot.download.take() {
            self.store.revoke(&previous.handle);
        }
        if matches!(slot.phase, ExportPhase::Ready(_)) {
            slot.phase = ExportPhase::Idle;
        }
    }

    fn begin(&self) -> Result<FlightGuard<'_>, ExportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| FlightGuard(&self.in_flight))
            .map_err(|_| {
                log::warn!("export rejected: another export is in flight");
                ExportError::Busy
            })
    }

    fn settle(&self, result: Result<Download, ExportError>) -> Result<Download, ExportError> {
        match result {
            Ok(download) => {
                log::info!(
                    "exported {} ({}x{} px, {} bytes)",
                    download.filename,
                    download.size[0],
                    download.size[1],
                    download.byte_len
                );
                self.replace_download(download.clone());
                Ok(download)
            }
            Err(err) => {
                log::warn!("export failed: {}", err);
                self.set_phase(ExportPhase::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Ask the symbol encoder for a surface, then export it
    pub async fn export_symbol<E: SymbolEncoder + ?Sized>(
        &self,
        encoder: &E,
        request: &SymbolRequest,
        settings: &PrintSettings,
    ) -> Result<Download, ExportError> {
        let _flight = self.begin()?;
        let request = SymbolRequest {
            display_value: request.display_value && settings.include_text,
            ..request.clone()
        };
        let result = match encoder.encode(&request) {
            Ok(surface) => self.run(Some(&surface), &request.data, settings).await,
            Err(e) => Err(ExportError::SymbolUnavailable(e.to_string())),
        };
        self.settle(result)
    }

    /// Export a populated surface as a PNG download.
    ///
    /// Rejects with `Busy` while another export is in flight. On failure
    /// the previous download, if any, stays available.
    pub async fn export(
        &self,
        surface: Option<&VectorSurface>,
        data: &str,
        settings: &PrintSettings,
    ) -> Result<Download, ExportError> {
        let _flight = self.begin()?;
        let result = self.run(surface, data, settings).await;
        self.settle(result)
    }

    async fn run(
        &self,
        surface: Option<&VectorSurface>,
        data: &str,
        settings: &PrintSettings,
    ) -> Result<Download, ExportError> {
        if settings.dpi == 0 {
            return Err(ExportError::InvalidSettings("resolution must be a positive DPI".into()));
        }
        if !settings.size.is_valid() {
            return Err(ExportError::InvalidSettings(format!(
                "label size {}x{} cm is not positive",
                settings.size.width_cm, settings.size.height_cm
            )));
        }
        let canvas = settings.canvas();
        let (width, height) = self.limits.check(canvas).ok_or(ExportError::CanvasTooLarge {
            width: canvas.width,
            height: canvas.height,
        })?;
        log::debug!("canvas {}x{} px at {} dpi", width, height, settings.dpi);

        self.set_phase(ExportPhase::Serializing);
        let snapshot = self.serializer.capture(&self.store, surface)?;

        self.set_phase(ExportPhase::Rasterizing);
        let raster = self
            .compositor
            .rasterize(&self.store, &snapshot.handle(), snapshot.declared_size, (width, height))
            .await?;
        drop(snapshot);
        let placement = raster.placement;

        self.set_phase(ExportPhase::Encoding);
        let png = self.encoder.encode(raster, settings.dpi).await?;

        let job_hash = surface
            .map(|surface| compute_job_hash(surface, settings, ENGINE_VERSION))
            .transpose()
            .map_err(manifest_failure)?
            .unwrap_or_default();

        let sha256 = sha256_hex(&png);
        let byte_len = png.len();
        let resource = self.store.create_scoped(Blob::new(MIME_PNG, png));

        let mut download = Download {
            id: Uuid::new_v4().to_string(),
            handle: resource.handle(),
            filename: suggested_filename(data, settings),
            mime: MIME_PNG.to_string(),
            size: [width, height],
            dpi: settings.dpi,
            physical_size_cm: [settings.size.width_cm, settings.size.height_cm],
            placement: placement.into(),
            byte_len,
            sha256,
            job_hash,
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            manifest_hash: String::new(),
        };
        download.manifest_hash = compute_manifest_hash(&download)
            .map_err(manifest_failure)?;

        resource.persist();
        Ok(download)
    }
}

impl Default for ExportOrchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}
