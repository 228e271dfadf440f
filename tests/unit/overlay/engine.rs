use super::*;
use crate::foundation::core::Canvas;
use crate::overlay::credits::CreditLine;
use crate::overlay::text::FontPaths;
use crate::overlay::title::{TitlePosition, TitleStyle};

fn engine(config: OverlayConfig) -> OverlayEngine {
    OverlayEngine::new(
        config,
        &PlayerSettings::default(),
        FontBook::without_system_fonts(FontPaths::default()),
    )
}

fn with_title_and_credits() -> OverlayConfig {
    OverlayConfig {
        title: Some(TitleDesign {
            text: "Intro".to_string(),
            style: TitleStyle::Modern,
            position: TitlePosition::Center,
            color: crate::foundation::core::Rgb::WHITE,
        }),
        credits: ClosingCredits {
            enabled: true,
            lines: vec![CreditLine {
                role: "Editor".to_string(),
                name: "A".to_string(),
            }],
        },
        ..OverlayConfig::default()
    }
}

fn cx(
    role: ClipRole,
    clip_time: f64,
    clip_duration: f64,
    playing: bool,
) -> OverlayContext<'static> {
    OverlayContext {
        role: Some(role),
        clip_time,
        clip_duration,
        playing,
        spectrum: &[],
        frame_index: 0,
    }
}

#[test]
fn title_only_on_first_clip_while_playing() {
    let e = engine(with_title_and_credits());
    assert_eq!(e.title_opacity_for(&cx(ClipRole::First, 2.0, 4.0, true)), Some(1.0));
    assert_eq!(e.title_opacity_for(&cx(ClipRole::Only, 2.0, 4.0, true)), Some(1.0));
    assert_eq!(e.title_opacity_for(&cx(ClipRole::Middle, 2.0, 5.0, true)), None);
    assert_eq!(e.title_opacity_for(&cx(ClipRole::First, 2.0, 4.0, false)), None);
    assert_eq!(e.title_opacity_for(&cx(ClipRole::First, 4.0, 6.0, true)), None);
}

#[test]
fn no_title_configured_means_no_title() {
    let e = engine(OverlayConfig::default());
    assert_eq!(e.title_opacity_for(&cx(ClipRole::First, 2.0, 4.0, true)), None);
}

#[test]
fn credits_only_on_last_clip_in_final_window() {
    let e = engine(with_title_and_credits());
    assert!(e.credits_progress_for(&cx(ClipRole::Last, 4.0, 10.0, true)).is_none());
    assert!(e.credits_progress_for(&cx(ClipRole::Last, 6.0, 10.0, true)).is_some());
    assert!(e.credits_progress_for(&cx(ClipRole::Middle, 9.0, 10.0, true)).is_none());
    assert!(e.credits_progress_for(&cx(ClipRole::Last, 9.0, 10.0, false)).is_none());
    assert!(e.credits_progress_for(&cx(ClipRole::Only, 9.0, 10.0, true)).is_some());

    let mut disabled = with_title_and_credits();
    disabled.credits.enabled = false;
    let e = engine(disabled);
    assert!(e.credits_progress_for(&cx(ClipRole::Last, 9.0, 10.0, true)).is_none());
}

#[test]
fn credits_dim_background_even_without_fonts() {
    let mut e = engine(with_title_and_credits());
    let mut s = Surface::new(Canvas {
        width: 64,
        height: 36,
    })
    .unwrap();
    s.fill([200, 200, 200, 255]);
    e.draw(&mut s, &cx(ClipRole::Last, 10.0, 10.0, true)).unwrap();
    // Full progress dims by 0.8.
    let px = s.pixel(32, 18);
    assert!(px[0] >= 38 && px[0] <= 42, "{px:?}");
    assert!(e.warned_missing_font);
}

#[test]
fn idle_frame_draws_nothing_without_effects() {
    let mut e = engine(with_title_and_credits());
    let mut s = Surface::new(Canvas {
        width: 32,
        height: 18,
    })
    .unwrap();
    s.fill([10, 20, 30, 255]);
    let before = s.clone();
    let idle = OverlayContext {
        role: None,
        clip_time: 0.0,
        clip_duration: 0.0,
        playing: false,
        spectrum: &[],
        frame_index: 3,
    };
    e.draw(&mut s, &idle).unwrap();
    assert_eq!(s, before);
}

#[test]
fn letterbox_raises_visualizer_baseline() {
    let mut config = OverlayConfig {
        visualizer: true,
        ..OverlayConfig::default()
    };
    config.effects.letterbox = true;
    let mut e = engine(config);
    let mut s = Surface::new(Canvas {
        width: 480,
        height: 200,
    })
    .unwrap();
    s.fill([0, 0, 0, 255]);
    let spectrum = [255u8; 64];
    let playing = OverlayContext {
        role: Some(ClipRole::Middle),
        clip_time: 1.0,
        clip_duration: 5.0,
        playing: true,
        spectrum: &spectrum,
        frame_index: 0,
    };
    e.draw(&mut s, &playing).unwrap();
    // Bars end at the top of the 24 px bottom bar.
    assert_eq!(s.pixel(5, 190), [0, 0, 0, 255]);
    assert!(s.pixel(5, 170)[2] > 100);
}
