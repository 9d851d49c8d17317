//! Barcode Raster CLI - JSON bridge to the export pipeline
//!
//! Commands: presets, dimensions, validate, export
//! Outputs JSON to stdout
//! Exit code 2 on validation or export failure

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use barcode_raster::{
    compositor::quiet_zone_px,
    presets::DEFAULT_PRESET,
    print::DEFAULT_DPI,
    validation::Validator,
    ExportOrchestrator, OrchestratorConfig, PhysicalSize, PresetRegistry, PrintAuthority,
    PrintSettings, VectorSurface,
};

#[derive(Parser)]
#[command(name = "barcode-raster-cli")]
#[command(about = "Rasterize barcode symbols to print-accurate PNG files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory with label preset JSON files
    #[arg(short, long, default_value = "presets")]
    presets_dir: PathBuf,
}

#[derive(Args)]
struct SizeArgs {
    /// Label preset ID
    #[arg(long, default_value = DEFAULT_PRESET)]
    preset: String,

    /// Resolution in dots per inch (defaults to the preset's)
    #[arg(long)]
    dpi: Option<u32>,

    /// Label width in cm (overrides the preset, requires --height-cm)
    #[arg(long, requires = "height_cm")]
    width_cm: Option<f64>,

    /// Label height in cm (overrides the preset, requires --width-cm)
    #[arg(long, requires = "width_cm")]
    height_cm: Option<f64>,

    /// Ask the encoder to omit the human-readable line
    #[arg(long)]
    no_text: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available label presets
    Presets,

    /// Show the pixel canvas and quiet zone for a size and resolution
    Dimensions(SizeArgs),

    /// Validate print settings
    Validate(SizeArgs),

    /// Export a symbol surface to PNG
    Export {
        #[command(flatten)]
        size: SizeArgs,

        /// JSON payload (VectorSurface)
        #[arg(long)]
        payload: String,

        /// Barcode data, used for the file name
        #[arg(long, default_value = "")]
        data: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Embed the PNG as base64 in the JSON output
        #[arg(long)]
        inline: bool,

        /// Load system fonts so human-readable text is drawn
        #[arg(long)]
        system_fonts: bool,
    },
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => println!(r#"{{"success": false, "error": "Failed to serialize output: {}"}}"#, e),
    }
}

fn failure(error: impl std::fmt::Display) -> ExitCode {
    print_json(&serde_json::json!({ "success": false, "error": error.to_string() }));
    ExitCode::FAILURE
}

fn resolve_settings(registry: &PresetRegistry, args: &SizeArgs) -> Result<PrintSettings, String> {
    let mut settings = match (args.width_cm, args.height_cm) {
        (Some(w), Some(h)) => PrintSettings {
            authority: PrintAuthority::User,
            dpi: args.dpi.unwrap_or(DEFAULT_DPI),
            size: PhysicalSize::new(w, h),
            include_text: true,
        },
        _ => registry
            .resolve(&args.preset)
            .map_err(|e| e.to_string())?
            .settings(args.dpi),
    };
    if args.no_text {
        settings.include_text = false;
    }
    Ok(settings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let registry = match PresetRegistry::load_from_dir(&cli.presets_dir) {
        Ok(r) => r,
        Err(e) => return failure(format!("Failed to load presets: {}", e)),
    };

    match cli.command {
        Commands::Presets => {
            print_json(&registry.list());
            ExitCode::SUCCESS
        }

        Commands::Dimensions(args) => {
            let settings = match resolve_settings(&registry, &args) {
                Ok(s) => s,
                Err(e) => return failure(e),
            };
            let canvas = settings.canvas();
            let pad = match (u32::try_from(canvas.width), u32::try_from(canvas.height)) {
                (Ok(w), Ok(h)) => Some(quiet_zone_px(w, h)),
                _ => None,
            };
            print_json(&serde_json::json!({
                "dpi": settings.dpi,
                "widthCm": settings.size.width_cm,
                "heightCm": settings.size.height_cm,
                "canvas": [canvas.width, canvas.height],
                "pad": pad,
            }));
            ExitCode::SUCCESS
        }

        Commands::Validate(args) => {
            let settings = match resolve_settings(&registry, &args) {
                Ok(s) => s,
                Err(e) => return failure(e),
            };
            let result = Validator::new().validate(&settings);
            print_json(&result);
            if result.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Export { size, payload, data, out, inline, system_fonts } => {
            let surface: VectorSurface = match serde_json::from_str(&payload) {
                Ok(s) => s,
                Err(e) => return failure(format!("Invalid payload: {}", e)),
            };
            let settings = match resolve_settings(&registry, &size) {
                Ok(s) => s,
                Err(e) => return failure(e),
            };

            let validation = Validator::new().validate(&settings);
            if !validation.valid {
                print_json(&serde_json::json!({ "success": false, "validation": validation }));
                return ExitCode::from(2);
            }

            let orchestrator = ExportOrchestrator::new(OrchestratorConfig {
                system_fonts,
                ..OrchestratorConfig::default()
            });
            if let Err(e) = orchestrator.export(Some(&surface), &data, &settings).await {
                print_json(&serde_json::json!({
                    "success": false,
                    "code": e.code(),
                    "error": e.to_string(),
                }));
                return ExitCode::from(2);
            }

            let Some((download, blob)) = orchestrator.fetch_download() else {
                return failure("Export finished without a download");
            };
            let path = out.join(&download.filename);
            if let Err(e) = std::fs::write(&path, &blob.bytes) {
                return failure(format!("Failed to write {}: {}", path.display(), e));
            }

            let mut output = serde_json::json!({
                "success": true,
                "path": path,
                "download": download,
            });
            if inline {
                output["dataBase64"] = serde_json::Value::String(base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    &blob.bytes,
                ));
            }
            print_json(&output);
            ExitCode::SUCCESS
        }
    }
}
