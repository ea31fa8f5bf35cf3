use super::*;
use crate::render::ctx::MAX_OPACITY_EPSILON;

#[test]
fn empty_document_is_the_default() {
    let cfg = EngineConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, EngineConfig::default());
    assert_eq!(cfg.playback.fps.num, 30);
    assert!(cfg.playback.loop_playback);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg = EngineConfig::from_json_str(
        r#"{ "render": { "threads": 2, "canvas": { "width": 64, "height": 32 } },
             "playback": { "fps": { "num": 24000, "den": 1001 } } }"#,
    )
    .unwrap();
    assert_eq!(cfg.render.threads, Some(2));
    assert_eq!(cfg.render.canvas.width, 64);
    assert!(!cfg.render.force_offscreen_layers);
    assert_eq!(cfg.playback.fps.den, 1001);
    assert_eq!(cfg.playback.idle_sleep_ms, 20);
}

#[test]
fn zero_threads_is_rejected() {
    let err = EngineConfig::from_json_str(r#"{ "render": { "threads": 0 } }"#).unwrap_err();
    assert!(matches!(err, MontageError::Config(_)));
}

#[test]
fn zero_fps_is_rejected() {
    let err = EngineConfig::from_json_str(r#"{ "playback": { "fps": { "num": 0, "den": 1 } } }"#)
        .unwrap_err();
    assert!(matches!(err, MontageError::Config(_)));
}

#[test]
fn epsilon_is_capped_at_half_an_eight_bit_step() {
    let mut cfg = EngineConfig::default();
    cfg.render.opacity_epsilon = MAX_OPACITY_EPSILON;
    cfg.validate().unwrap();
    cfg.render.opacity_epsilon = 1.0 / 512.0;
    cfg.validate().unwrap();

    for bad in [0.0, -0.1, 1.0 / 509.0, 0.01, 0.4, f64::NAN] {
        cfg.render.opacity_epsilon = bad;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, MontageError::Config(_)), "{bad}");
    }
}

#[test]
fn malformed_json_is_a_config_error() {
    let err = EngineConfig::from_json_str("{ render: ").unwrap_err();
    assert!(matches!(err, MontageError::Config(_)));
}

#[test]
fn missing_file_is_a_config_error() {
    let err = EngineConfig::from_path(Path::new("/nonexistent/montage.json")).unwrap_err();
    assert!(matches!(err, MontageError::Config(_)));
}
