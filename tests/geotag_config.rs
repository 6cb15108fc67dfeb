use std::io::Write;
use std::sync::Mutex;

use tempfile::Builder;

use detect_gps::config::{GeotagConfig, Overrides};
use detect_gps::GeoError;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "GEOTAG_CONFIG",
        "GEOTAG_CAMERA_HEIGHT",
        "GEOTAG_FOV_DEG",
        "GEOTAG_HEADING_DEG",
        "GEOTAG_ORIGIN_LAT",
        "GEOTAG_ORIGIN_LON",
        "GEOTAG_MODEL_PATH",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_match_field_deployment() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = GeotagConfig::load(None, &Overrides::default()).expect("load defaults");
    let cal = cfg.calibration;
    assert_eq!(cal.height_m(), 25.0);
    assert_eq!(cal.fov_deg(), 79.52);
    assert_eq!(cal.heading_deg(), 0.0);
    assert_eq!(cal.origin().latitude, 37.540683333333334);
    assert_eq!(cal.origin().longitude, 127.07928611111111);
    assert_eq!(cfg.detector.model_path, None);
    assert_eq!(cfg.detector.class_names.len(), 10);
    assert!(cfg.markers.icon_for("person").ends_with("green-dot.png"));
}

#[test]
fn loads_json_file_with_env_and_cli_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".json").tempfile().expect("temp config");
    let json = r#"{
        "camera": { "height_m": 40.0, "fov_deg": 84.0, "heading_deg": 15.0 },
        "origin": { "latitude": 35.1, "longitude": 129.04 },
        "detector": {
            "model_path": "models/v8x_visdrone.onnx",
            "confidence_threshold": 0.4,
            "class_names": ["person", "car"]
        },
        "markers": {
            "default_icon": "http://example.test/grey.png",
            "icons": { "car": "http://example.test/blue.png" }
        }
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("GEOTAG_CONFIG", file.path());
    std::env::set_var("GEOTAG_FOV_DEG", "70");
    std::env::set_var("GEOTAG_ORIGIN_LON", "  ");

    let overrides = Overrides {
        heading_deg: Some(-30.0),
        ..Overrides::default()
    };
    let cfg = GeotagConfig::load(None, &overrides).expect("load config");

    let cal = cfg.calibration;
    assert_eq!(cal.height_m(), 40.0);
    assert_eq!(cal.fov_deg(), 70.0);
    assert_eq!(cal.heading_deg(), -30.0);
    assert_eq!(cal.origin().latitude, 35.1);
    assert_eq!(cal.origin().longitude, 129.04);
    assert_eq!(
        cfg.detector.model_path.as_deref(),
        Some(std::path::Path::new("models/v8x_visdrone.onnx"))
    );
    assert_eq!(cfg.detector.params.confidence_threshold, 0.4);
    assert_eq!(cfg.detector.params.iou_threshold, 0.45);
    assert_eq!(cfg.detector.class_names, vec!["person", "car"]);
    assert_eq!(cfg.markers.icon_for("car"), "http://example.test/blue.png");
    assert!(cfg.markers.icon_for("bus").ends_with("purple-dot.png"));
    assert_eq!(cfg.markers.icon_for("tricycle"), "http://example.test/grey.png");

    clear_env();
}

#[test]
fn loads_toml_file_from_explicit_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp config");
    let toml = r#"
        [camera]
        height_m = 60.5

        [origin]
        latitude = -33.86
        longitude = 151.21

        [markers.icons]
        pedestrian = "http://maps.google.com/mapfiles/ms/icons/green-dot.png"
    "#;
    file.write_all(toml.as_bytes()).expect("write config");
    std::env::set_var("GEOTAG_MODEL_PATH", "/opt/models/env.onnx");

    let overrides = Overrides {
        model_path: Some("/opt/models/cli.onnx".into()),
        ..Overrides::default()
    };
    let cfg = GeotagConfig::load(Some(file.path()), &overrides).expect("load toml");
    assert_eq!(cfg.calibration.height_m(), 60.5);
    assert_eq!(cfg.calibration.fov_deg(), 79.52);
    assert_eq!(cfg.calibration.origin().latitude, -33.86);
    assert!(cfg.markers.icon_for("pedestrian").ends_with("green-dot.png"));
    assert_eq!(
        cfg.detector.model_path.as_deref(),
        Some(std::path::Path::new("/opt/models/cli.onnx"))
    );

    clear_env();
}

#[test]
fn invalid_calibration_is_fatal() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let overrides = Overrides {
        fov_deg: Some(180.0),
        ..Overrides::default()
    };
    let err = GeotagConfig::load(None, &overrides).expect_err("fov of 180 must fail");
    assert!(matches!(
        err.downcast_ref::<GeoError>(),
        Some(GeoError::InvalidCalibration { .. })
    ));

    std::env::set_var("GEOTAG_CAMERA_HEIGHT", "tall");
    let err = GeotagConfig::load(None, &Overrides::default()).expect_err("bad number");
    assert!(err.to_string().contains("GEOTAG_CAMERA_HEIGHT"));

    clear_env();
}

#[test]
fn unreadable_config_names_the_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let err = GeotagConfig::load(
        Some(std::path::Path::new("/nonexistent/geotag.toml")),
        &Overrides::default(),
    )
    .expect_err("missing config");
    assert!(err.to_string().contains("/nonexistent/geotag.toml"));
}

#[cfg(unix)]
#[test]
fn non_utf8_env_values_are_fatal() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    for key in ["GEOTAG_ORIGIN_LAT", "GEOTAG_MODEL_PATH"] {
        std::env::set_var(key, OsString::from_vec(vec![b'3', 0xff]));
        let err = GeotagConfig::load(None, &Overrides::default()).expect_err("non-UTF-8 value");
        assert!(err.to_string().contains(key), "{err}");
        std::env::remove_var(key);
    }

    clear_env();
}
