//! detect_gps - project object detections on one aerial image to GPS
//! coordinates and write them as KML placemarks.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use detect_gps::config::{GeotagConfig, Overrides};
use detect_gps::frame::load_image;
use detect_gps::pipeline::{build_registry, default_output_path, geotag};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert object detections on an aerial image to GPS placemarks"
)]
struct Args {
    /// Path to the image file.
    #[arg(long = "impath", visible_alias = "image")]
    impath: PathBuf,

    /// Camera heading in degrees, counter-clockwise from north.
    #[arg(long, allow_negative_numbers = true)]
    cam_angle: Option<f64>,

    /// Camera height above ground in meters.
    #[arg(long, allow_negative_numbers = true)]
    height: Option<f64>,

    /// Diagonal field of view in degrees.
    #[arg(long, allow_negative_numbers = true)]
    fov: Option<f64>,

    /// Latitude of the point below the camera.
    #[arg(long, allow_negative_numbers = true)]
    origin_lat: Option<f64>,

    /// Longitude of the point below the camera.
    #[arg(long, allow_negative_numbers = true)]
    origin_lon: Option<f64>,

    /// Config file (.toml or .json). Falls back to GEOTAG_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with precomputed detections; skips model inference.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// ONNX model path (requires the backend-tract feature).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Output KML path. Defaults to <image name>_locations.kml.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// UI mode for stderr progress.
    #[arg(long, value_enum, default_value_t = ui::UiMode::Auto, value_name = "MODE")]
    ui: ui::UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = ui::Ui::new(
        args.ui,
        std::io::stderr().is_terminal(),
        !std::io::stdout().is_terminal(),
    );

    let overrides = Overrides {
        height_m: args.height,
        fov_deg: args.fov,
        heading_deg: args.cam_angle,
        origin_latitude: args.origin_lat,
        origin_longitude: args.origin_lon,
        model_path: args.model.clone(),
    };
    let cfg = {
        let _stage = ui.stage("load configuration");
        GeotagConfig::load(args.config.as_deref(), &overrides)?
    };
    let cal = &cfg.calibration;
    log::info!(
        "camera: height={}m fov={}deg heading={}deg origin=({}, {})",
        cal.height_m(),
        cal.fov_deg(),
        cal.heading_deg(),
        cal.origin().latitude,
        cal.origin().longitude
    );

    let image = {
        let _stage = ui.stage("decode image");
        load_image(&args.impath)?
    };

    let mut registry = build_registry(args.detections.as_deref(), &cfg.detector)?;
    let result = {
        let backend = registry.default_name().unwrap_or("detector").to_string();
        let _stage = ui.stage(&format!("detect objects ({})", backend));
        registry.detect_with(None, image.pixels(), image.frame.width, image.frame.height)?
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.impath));
    let summary = {
        let _stage = ui.stage("project detections + write KML");
        geotag(&result.detections, image.frame, &cfg, &output)?
    };

    println!("detect_gps summary:");
    println!("  image: {}", args.impath.display());
    println!("  placemarks written: {}", summary.placed);
    println!("  detections skipped: {}", summary.skipped);
    println!("  output: {}", summary.output.display());
    Ok(())
}
