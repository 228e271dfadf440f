use super::*;

const SLATES: &str = r#"{
    "settings": { "canvas": { "width": 64, "height": 36 }, "transition_ms": 500 },
    "clips": [
        { "color": [255, 0, 0], "duration_secs": 2.0, "name": "red" },
        { "color": [0, 0, 255], "duration_secs": 1.5 }
    ],
    "transitions": ["dissolve"],
    "title": { "text": "Intro", "style": "classic", "position": "center" },
    "credits": { "enabled": true, "lines": [{ "role": "Editor", "name": "A" }] }
}"#;

#[test]
fn parses_clip_variants_by_shape() {
    let p: Production = serde_json::from_str(
        r#"{"clips": [
            {"video": "a.mp4"},
            {"image": "b.png", "duration_secs": 3.0},
            {"color": [1, 2, 3], "duration_secs": 1.0}
        ]}"#,
    )
    .unwrap();
    assert!(matches!(p.clips[0], ClipSpec::Video { .. }));
    assert!(matches!(p.clips[1], ClipSpec::Image { .. }));
    assert!(matches!(p.clips[2], ClipSpec::Color { color, .. } if color == Rgb::new(1, 2, 3)));
    assert_eq!(p.default_transition, Transition::Cut);
}

#[test]
fn display_names_fall_back_to_stem_or_hex() {
    let p = Production::from_json_str(
        r#"{"clips": [
            {"video": "clips/beach.mp4"},
            {"color": [255, 16, 0], "duration_secs": 1.0}
        ]}"#,
    )
    .unwrap();
    assert_eq!(p.clips[0].display_name(), "beach");
    assert_eq!(p.clips[1].display_name(), "#ff1000");
}

#[test]
fn validate_rejects_bad_durations_and_paths() {
    assert!(
        Production::from_json_str(r#"{"clips": [{"color": [0,0,0], "duration_secs": 0.0}]}"#)
            .is_err()
    );
    assert!(Production::from_json_str(r#"{"clips": [{"video": "../x.mp4"}]}"#).is_err());
    assert!(Production::from_json_str(r#"{"clips": [{"video": "/abs.mp4"}]}"#).is_err());
    assert!(
        Production::from_json_str(
            r#"{"clips": [], "backing_track": {"path": "m.wav", "volume": 2.0}}"#
        )
        .is_err()
    );
    assert!(Production::from_json_str(r#"{"clips": [], "title": {"text": "  "}}"#).is_err());
}

#[test]
fn unknown_top_level_fields_are_rejected() {
    assert!(Production::from_json_str(r#"{"clips": [], "speed": 2}"#).is_err());
}

#[test]
fn normalize_rel_path_cleans_separators() {
    assert_eq!(normalize_rel_path("a\\b/./c.png").unwrap(), "a/b/c.png");
    assert_eq!(normalize_rel_path("a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
    assert!(normalize_rel_path("a/../b").is_err());
}

#[test]
fn suggestions_override_only_present_fields() {
    let mut p = Production::from_json_str(SLATES).unwrap();
    let before_title = p.title.clone();
    let s = Suggestions::from_json_str(
        r#"{"transitions": ["fade-to-black"], "credits": [{"role": "Music", "name": "B"}]}"#,
    )
    .unwrap();
    p.apply_suggestions(s);
    assert_eq!(p.transitions, vec![Transition::FadeToBlack]);
    assert_eq!(p.title, before_title);
    assert!(p.credits.enabled);
    assert_eq!(p.credits.lines[0].role, "Music");

    p.apply_suggestions(Suggestions {
        credits: Some(Vec::new()),
        ..Suggestions::default()
    });
    assert!(!p.credits.enabled);
}

#[test]
fn from_path_resolves_against_document_dir() {
    let dir = std::env::temp_dir().join(format!("reelcast-model-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let doc = dir.join("show.json");
    std::fs::write(&doc, SLATES).unwrap();

    let p = Production::from_path(&doc).unwrap();
    assert_eq!(p.base_dir, dir);
    assert_eq!(p.resolve("media\\a.png").unwrap(), dir.join("media/a.png"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn builds_registry_and_controller_from_color_slates() {
    let p = Production::from_json_str(SLATES).unwrap();
    let registry = p.build_registry().unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(0).unwrap().display_name(), "red");
    assert!((registry.total_duration_secs() - 3.5).abs() < 1e-9);

    let controller = p.build_controller().unwrap();
    assert_eq!(controller.registry().len(), 2);
    assert_eq!(controller.settings().transition_ms, 500);
    assert!(controller.active_index().is_none());
}

#[test]
fn overlay_config_mirrors_production() {
    let p = Production::from_json_str(SLATES).unwrap();
    let cfg = p.overlay_config();
    assert_eq!(cfg.title.as_ref().map(|t| t.text.as_str()), Some("Intro"));
    assert!(cfg.credits.enabled);
    assert!(!cfg.visualizer);
}
