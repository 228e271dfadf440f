use super::*;

#[test]
fn defaults_match_reference_values() {
    let s = PlayerSettings::default();
    assert_eq!(s.canvas, Canvas::HD);
    assert_eq!(s.transition_ms, 1000);
    assert_eq!(s.capture_fps, 30);
    assert_eq!(s.video_bitrate, 8_000_000);
    assert_eq!(s.export_file_name, "reelcast-export.webm");
    s.validate().unwrap();
}

#[test]
fn partial_documents_fill_in_defaults() {
    let s: PlayerSettings =
        serde_json::from_str(r#"{"transition_ms": 500, "autoplay": "require-gesture"}"#).unwrap();
    assert_eq!(s.transition_ms, 500);
    assert_eq!(s.autoplay, AutoplayPolicy::RequireGesture);
    assert_eq!(s.sample_rate, 48_000);
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(serde_json::from_str::<PlayerSettings>(r#"{"transition": 5}"#).is_err());
}

#[test]
fn validate_rejects_bad_ranges() {
    let mut s = PlayerSettings::default();
    s.ken_burns_max_scale = 0.9;
    assert!(s.validate().is_err());

    let mut s = PlayerSettings::default();
    s.title_fade_out_start_secs = 5.0;
    assert!(s.validate().is_err());

    let mut s = PlayerSettings::default();
    s.capture_fps = 0;
    assert!(s.validate().is_err());

    let mut s = PlayerSettings::default();
    s.sample_rate = 44_100;
    assert!(s.validate().is_err());
}
