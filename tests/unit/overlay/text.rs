use super::*;

#[test]
fn missing_font_file_without_system_fonts_resolves_to_none() {
    let mut book = FontBook::without_system_fonts(FontPaths {
        serif: Some(PathBuf::from("/nonexistent/reelcast/serif.ttf")),
        ..FontPaths::default()
    });
    assert!(book.resolve(FontClass::Serif, 400).is_none());
    assert!(book.resolve(FontClass::SansSerif, 700).is_none());
}

#[test]
fn misses_are_cached() {
    let mut book = FontBook::without_system_fonts(FontPaths::default());
    assert!(book.resolve(FontClass::Monospace, 400).is_none());
    assert_eq!(book.cache.len(), 1);
    assert!(book.resolve(FontClass::Monospace, 400).is_none());
    assert_eq!(book.cache.len(), 1);
}

#[test]
fn font_paths_deserialize_partially() {
    let p: FontPaths = serde_json::from_str(r#"{"cursive": "fonts/hand.ttf"}"#).unwrap();
    assert_eq!(p.cursive, Some(PathBuf::from("fonts/hand.ttf")));
    assert!(p.serif.is_none());
}

#[test]
fn layout_rejects_bad_sizes() {
    let mut engine = TextLayoutEngine::new();
    let font = ResolvedFont {
        key: FontKey {
            class: FontClass::SansSerif,
            weight: 400,
        },
        bytes: Arc::new(Vec::new()),
        index: 0,
    };
    let brush = TextBrushRgba8::opaque([255, 255, 255]);
    assert!(engine
        .layout_plain("x", &font, 0.0, brush, None)
        .is_err());
    assert!(engine
        .layout_plain("x", &font, f32::NAN, brush, None)
        .is_err());
}

#[test]
fn layout_with_system_font_has_width() {
    let mut book = FontBook::new(FontPaths::default());
    let Some(font) = book.resolve(FontClass::SansSerif, 400) else {
        eprintln!("no system sans-serif font, skipping");
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let layout = engine
        .layout_plain(
            "Intro",
            &font,
            48.0,
            TextBrushRgba8::opaque([255, 255, 255]),
            None,
        )
        .unwrap();
    assert!(layout.width() > 0.0);
    assert!(layout.height() > 0.0);
}
