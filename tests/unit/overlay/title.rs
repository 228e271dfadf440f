use super::*;

fn op(t: f64) -> Option<f32> {
    title_opacity(t, TitleTiming::default())
}

#[test]
fn fades_in_over_first_second() {
    assert_eq!(op(0.0), Some(0.0));
    assert!((op(0.5).unwrap() - 0.5).abs() < 1e-6);
    assert_eq!(op(1.0), Some(1.0));
}

#[test]
fn holds_then_fades_out() {
    assert_eq!(op(2.0), Some(1.0));
    assert_eq!(op(2.999), Some(1.0));
    assert!((op(3.5).unwrap() - 0.5).abs() < 1e-6);
}

#[test]
fn gone_after_window() {
    assert_eq!(op(4.0), None);
    assert_eq!(op(10.0), None);
    assert_eq!(op(-0.1), None);
}

#[test]
fn styles_map_to_families() {
    assert_eq!(TitleStyle::Classic.font_class(), FontClass::Serif);
    assert_eq!(TitleStyle::Scifi.font_class(), FontClass::Monospace);
    assert_eq!(TitleStyle::Bold.weight(), 700);
    assert_eq!(TitleStyle::Scifi.display_text("Intro"), "INTRO");
    assert_eq!(TitleStyle::Modern.display_text("Intro"), "Intro");
}

#[test]
fn positions_place_blocks() {
    let (x, y) = TitlePosition::Center.origin(1280.0, 720.0, 200.0, 100.0);
    assert_eq!((x, y), (540.0, 310.0));
    let (x, _) = TitlePosition::BottomLeft.origin(1280.0, 720.0, 200.0, 100.0);
    assert!(x > 0.0 && x < 100.0);
    let (_, y) = TitlePosition::BottomCenter.origin(1280.0, 720.0, 200.0, 100.0);
    assert!(y + 100.0 < 720.0 && y > 360.0);
}

#[test]
fn design_deserializes_with_defaults() {
    let d: TitleDesign =
        serde_json::from_str(r#"{"text": "Intro", "position": "bottom-left"}"#).unwrap();
    assert_eq!(d.style, TitleStyle::Modern);
    assert_eq!(d.position, TitlePosition::BottomLeft);
    assert_eq!(d.color, Rgb::WHITE);
}
