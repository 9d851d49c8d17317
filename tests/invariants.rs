//! Export Contract Invariants
//!
//! End-to-end behaviour of the orchestrator: exact pixel sizes, quiet zone,
//! centering, determinism, and no leaked resource handles on any path.

mod common;

use barcode_raster::{
    symbol::{SymbolFormat, SymbolRequest},
    CanvasLimits, ExportError, ExportOrchestrator, ExportPhase, OrchestratorConfig,
    PhysicalSize, PrintSettings, VectorSurface,
};
use common::{decode_png, request, rgb_at, surface, StripeEncoder};

const WHITE: [u8; 3] = [255, 255, 255];

fn at_dpi(dpi: u32) -> PrintSettings {
    PrintSettings {
        dpi,
        ..PrintSettings::default()
    }
}

fn is_dark(rgb: [u8; 3]) -> bool {
    rgb.iter().all(|&c| c < 128)
}

#[tokio::test]
async fn invariant_end_to_end_code128_at_300_dpi() {
    let _ = env_logger::builder().is_test(true).try_init();
    let orchestrator = ExportOrchestrator::default();

    let download = orchestrator
        .export_symbol(&StripeEncoder, &request("ABC-12345"), &at_dpi(300))
        .await
        .unwrap();

    assert_eq!(download.filename, "ABC-12345_5x3cm.png");
    assert_eq!(download.mime, "image/png");
    assert_eq!(download.size, [591, 354]);
    assert_eq!(orchestrator.phase(), ExportPhase::Ready(download.handle));

    let (_, blob) = orchestrator.fetch_download().unwrap();
    assert_eq!(blob.len(), download.byte_len);
    let (width, height, pixels) = decode_png(&blob.bytes);
    assert_eq!((width, height), (591, 354));

    // Quiet zone: nothing but white within `pad` of any edge
    let pad = download.placement.pad;
    assert_eq!(pad, 14);
    for y in 0..height {
        for x in 0..width {
            let in_margin = x < pad || y < pad || x >= width - pad || y >= height - pad;
            if in_margin {
                assert_eq!(rgb_at(&pixels, width, x, y), WHITE, "pixel ({x}, {y}) in quiet zone");
            }
        }
    }

    // Dark bars exist and their bounding box is centered
    let dark: Vec<(u32, u32)> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .filter(|&(x, y)| is_dark(rgb_at(&pixels, width, x, y)))
        .collect();
    assert!(!dark.is_empty());
    let left = dark.iter().map(|p| p.0).min().unwrap();
    let right = width - 1 - dark.iter().map(|p| p.0).max().unwrap();
    let top = dark.iter().map(|p| p.1).min().unwrap();
    let bottom = height - 1 - dark.iter().map(|p| p.1).max().unwrap();
    assert!(left.abs_diff(right) <= 2, "left {left} right {right}");
    assert!(top.abs_diff(bottom) <= 2, "top {top} bottom {bottom}");
    assert!(left >= pad && top >= pad);
}

#[tokio::test]
async fn invariant_max_ui_dpi_is_exact() {
    let orchestrator = ExportOrchestrator::default();
    let download = orchestrator
        .export(Some(&surface("HIGH")), "HIGH", &at_dpi(1200))
        .await
        .unwrap();
    assert_eq!(download.size, [2362, 1417]);

    let (_, blob) = orchestrator.fetch_download().unwrap();
    let (width, height, _) = decode_png(&blob.bytes);
    assert_eq!((width, height), (2362, 1417));
}

#[tokio::test]
async fn invariant_identical_inputs_give_identical_png() {
    let orchestrator = ExportOrchestrator::default();
    let symbol = surface("REPEAT-1");

    let first = orchestrator.export(Some(&symbol), "REPEAT-1", &at_dpi(300)).await.unwrap();
    let first_bytes = orchestrator.fetch_download().unwrap().1.bytes.clone();

    let second = orchestrator.export(Some(&symbol), "REPEAT-1", &at_dpi(300)).await.unwrap();
    let second_bytes = orchestrator.fetch_download().unwrap().1.bytes.clone();

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.sha256, second.sha256);
    assert_eq!(first.job_hash, second.job_hash);
    assert_ne!(first.handle, second.handle);
}

#[tokio::test]
async fn invariant_new_download_revokes_previous() {
    let orchestrator = ExportOrchestrator::default();

    let first = orchestrator.export(Some(&surface("ONE")), "ONE", &at_dpi(150)).await.unwrap();
    let second = orchestrator.export(Some(&surface("TWO")), "TWO", &at_dpi(150)).await.unwrap();

    assert!(orchestrator.store().resolve(&first.handle).is_none());
    assert!(orchestrator.store().resolve(&second.handle).is_some());
    assert_eq!(orchestrator.store().live_count(), 1);
    assert_eq!(orchestrator.current_download().unwrap().filename, "TWO_5x3cm.png");
}

#[tokio::test]
async fn invariant_failed_reexport_keeps_previous_download() {
    let orchestrator = ExportOrchestrator::default();
    let ok = orchestrator.export(Some(&surface("KEEP")), "KEEP", &at_dpi(300)).await.unwrap();

    let err = orchestrator.export(None, "KEEP", &at_dpi(300)).await.unwrap_err();
    assert!(matches!(err, ExportError::SymbolUnavailable(_)));

    assert_eq!(orchestrator.phase(), ExportPhase::Failed(err));
    assert_eq!(orchestrator.current_download().unwrap().handle, ok.handle);
    assert!(orchestrator.fetch_download().is_some());
    assert_eq!(orchestrator.store().live_count(), 1);
}

#[tokio::test]
async fn invariant_absent_surface_creates_no_handles() {
    let orchestrator = ExportOrchestrator::default();

    let err = orchestrator.export(None, "", &at_dpi(300)).await.unwrap_err();
    assert!(matches!(err, ExportError::SymbolUnavailable(_)));

    let empty = VectorSurface::new(100.0, 50.0);
    let err = orchestrator.export(Some(&empty), "", &at_dpi(300)).await.unwrap_err();
    assert!(matches!(err, ExportError::SymbolUnavailable(_)));

    assert_eq!(orchestrator.store().live_count(), 0);
    assert!(orchestrator.current_download().is_none());
}

#[tokio::test]
async fn invariant_encoder_failure_is_symbol_unavailable() {
    let orchestrator = ExportOrchestrator::default();
    let ean = SymbolRequest::new("5901234123457", SymbolFormat::Ean13);

    let err = orchestrator
        .export_symbol(&StripeEncoder, &ean, &at_dpi(300))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::SymbolUnavailable(_)));
    assert_eq!(orchestrator.store().live_count(), 0);
}

#[tokio::test]
async fn invariant_failures_release_every_handle() {
    let orchestrator = ExportOrchestrator::default();

    // Serialization: non-finite geometry
    let mut broken = surface("NAN");
    broken.push_bar(f64::NAN, 0.0, 1.0, 1.0);
    let err = orchestrator.export(Some(&broken), "NAN", &at_dpi(300)).await.unwrap_err();
    assert!(matches!(err, ExportError::SerializationFailure(_)));
    assert_eq!(orchestrator.store().live_count(), 0);

    // The document has no usable extent on one axis
    let mut flat = surface("FLAT");
    flat.width = 0.0;
    let err = orchestrator.export(Some(&flat), "FLAT", &at_dpi(300)).await.unwrap_err();
    assert!(matches!(err, ExportError::DegenerateGeometry { width, .. } if width == 0.0), "{err:?}");
    assert_eq!(orchestrator.store().live_count(), 0);

    let mut flat = surface("FLAT");
    flat.height = 0.0;
    let err = orchestrator.export(Some(&flat), "FLAT", &at_dpi(300)).await.unwrap_err();
    assert!(matches!(err, ExportError::DegenerateGeometry { height, .. } if height == 0.0), "{err:?}");
    assert_eq!(err.code(), "degenerate_geometry");
    assert_eq!(orchestrator.store().live_count(), 0);

    // Resolution past canvas limits is reported, not clamped
    let err = orchestrator
        .export(Some(&surface("BIG")), "BIG", &at_dpi(100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::CanvasTooLarge { width: 196_850, .. }));
    assert_eq!(orchestrator.store().live_count(), 0);

    // Zero DPI
    let err = orchestrator.export(Some(&surface("ZERO")), "ZERO", &at_dpi(0)).await.unwrap_err();
    assert!(matches!(err, ExportError::InvalidSettings(_)));
    assert_eq!(orchestrator.store().live_count(), 0);

    assert!(!orchestrator.is_busy());
    assert!(orchestrator.current_download().is_none());
}

#[tokio::test]
async fn invariant_custom_limits_apply() {
    let orchestrator = ExportOrchestrator::new(OrchestratorConfig {
        limits: CanvasLimits { max_side: 1000, max_area: 1_000_000 },
        ..OrchestratorConfig::default()
    });
    let err = orchestrator
        .export(Some(&surface("LIM")), "LIM", &at_dpi(1200))
        .await
        .unwrap_err();
    assert_eq!(err, ExportError::CanvasTooLarge { width: 2362, height: 1417 });
}

#[tokio::test]
async fn invariant_overlapping_export_is_rejected() {
    let orchestrator = ExportOrchestrator::default();
    let symbol = surface("OVERLAP");
    let settings = at_dpi(600);

    let (first, second) = tokio::join!(
        orchestrator.export(Some(&symbol), "OVERLAP", &settings),
        orchestrator.export(Some(&symbol), "OVERLAP", &settings),
    );

    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), ExportError::Busy);
    assert!(!orchestrator.is_busy());
    assert!(matches!(orchestrator.phase(), ExportPhase::Ready(_)));
    assert_eq!(orchestrator.store().live_count(), 1);
}

#[tokio::test]
async fn invariant_physical_size_is_a_parameter() {
    let orchestrator = ExportOrchestrator::default();
    let settings = PrintSettings {
        size: PhysicalSize::new(10.0, 2.5),
        ..at_dpi(254)
    };
    let download = orchestrator
        .export(Some(&surface("WIDE")), "", &settings)
        .await
        .unwrap();
    assert_eq!(download.size, [1000, 250]);
    assert_eq!(download.filename, "barcode_10x2.5cm.png");
}

#[tokio::test]
async fn invariant_text_request_still_exports() {
    let orchestrator = ExportOrchestrator::default();
    let with_text = SymbolRequest {
        display_value: true,
        ..request("TEXT")
    };
    let download = orchestrator
        .export_symbol(&StripeEncoder, &with_text, &at_dpi(300))
        .await
        .unwrap();
    assert_eq!(download.size, [591, 354]);
}
