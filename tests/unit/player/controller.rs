use super::*;
use crate::capture::memory::RecordingManifest;
use crate::capture::recorder::RecordingProfile;
use crate::foundation::core::Canvas;
use crate::media::still::StillSource;
use crate::overlay::text::FontPaths;
use crate::player::state::AutoplayPolicy;

const DT: f64 = 1.0 / 30.0;

fn settings() -> PlayerSettings {
    PlayerSettings {
        canvas: Canvas {
            width: 64,
            height: 36,
        },
        ..PlayerSettings::default()
    }
}

fn controller_with(
    settings: PlayerSettings,
    clips: &[([u8; 3], f64)],
    gaps: &[Transition],
) -> PlaybackController {
    let mut registry = ClipRegistry::new();
    for (i, (rgb, secs)) in clips.iter().enumerate() {
        let source = StillSource::solid(64, 36, *rgb, *secs).unwrap();
        registry.add(format!("clip {i}"), Box::new(source)).unwrap();
    }
    let plan = TransitionPlan::from_positional(&registry, gaps, Transition::Cut);
    PlaybackController::new(
        settings,
        registry,
        plan,
        OverlayConfig::default(),
        FontBook::without_system_fonts(FontPaths::default()),
    )
    .unwrap()
}

fn three_clips() -> PlaybackController {
    controller_with(
        settings(),
        &[([255, 0, 0], 4.0), ([0, 255, 0], 5.0), ([0, 0, 255], 3.0)],
        &[Transition::Dissolve, Transition::Cut],
    )
}

fn center(frame: &FrameRGBA) -> [u8; 4] {
    frame.pixel(32, 18)
}

#[test]
fn play_activates_first_clip() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    assert_eq!(c.playback_state(), PlaybackState::Playing);
    assert_eq!(c.active_index(), Some(0));
    let frame = c.tick(DT).unwrap();
    assert_eq!(center(&frame), [255, 0, 0, 255]);
    assert!(matches!(
        c.drain_events().as_slice(),
        [ControllerEvent::ClipChanged { index: 0, .. }]
    ));
}

#[test]
fn empty_registry_cannot_play_or_record() {
    let mut c = controller_with(settings(), &[], &[]);
    assert!(c.play(PlayOrigin::UserGesture).is_err());
    assert!(c.start_recording(PlayOrigin::UserGesture).is_err());
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert_eq!(c.capture_state(), CaptureState::Idle);
}

#[test]
fn select_clip_is_always_a_hard_cut() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    for _ in 0..10 {
        c.tick(DT).unwrap();
    }
    // Clip 0 -> 1 has a dissolve in the plan, but a direct jump never blends.
    c.select_clip(1).unwrap();
    let frame = c.tick(DT).unwrap();
    assert_eq!(center(&frame), [0, 255, 0, 255]);
    assert!(!c.render.has_ghost());
    assert!((c.global_time_secs() - (4.0 + DT)).abs() < 1e-9);
    assert!(c.select_clip(3).is_err());
}

#[test]
fn sequential_dissolve_lasts_transition_length() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    while c.active_index() == Some(0) {
        c.tick(DT).unwrap();
    }
    assert!(c.render.transition_active());
    let switch_ms = c.clock_ms();
    while c.render.transition_active() {
        c.tick(DT).unwrap();
    }
    let elapsed = c.clock_ms() - switch_ms;
    assert!(elapsed >= 1000.0 && elapsed < 1000.0 + DT * 1000.0 + 1e-6, "{elapsed}");
    assert!(!c.render.has_ghost());
    assert_eq!(center(&c.last_frame()), [0, 255, 0, 255]);
}

#[test]
fn cut_gap_switches_without_ghost() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    c.select_clip(1).unwrap();
    while c.active_index() == Some(1) {
        c.tick(DT).unwrap();
    }
    assert_eq!(c.active_index(), Some(2));
    assert!(!c.render.has_ghost());
}

#[test]
fn playback_completes_after_last_clip() {
    let mut c = controller_with(settings(), &[([9, 9, 9], 0.5)], &[]);
    c.play(PlayOrigin::UserGesture).unwrap();
    let frames = c
        .run(&mut crate::player::scheduler::FixedStep::new(DT), 5.0)
        .unwrap();
    assert!((15..=17).contains(&frames), "{frames}");
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert_eq!(c.active_index(), None);
    assert!(c.drain_events().contains(&ControllerEvent::PlaybackCompleted));
}

#[test]
fn autoplay_blocked_leaves_state_unchanged() {
    let s = PlayerSettings {
        autoplay: AutoplayPolicy::RequireGesture,
        ..settings()
    };
    let mut c = controller_with(s, &[([1, 2, 3], 2.0)], &[]);
    let err = c.play(PlayOrigin::Programmatic).unwrap_err();
    assert!(matches!(err, ReelError::AutoplayBlocked(_)));
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert_eq!(c.active_index(), None);

    c.play(PlayOrigin::UserGesture).unwrap();
    c.pause();
    c.play(PlayOrigin::Programmatic).unwrap();
    assert_eq!(c.playback_state(), PlaybackState::Playing);
}

#[test]
fn pause_and_stop_leave_capture_alone() {
    let mut c = three_clips();
    c.start_recording(PlayOrigin::UserGesture).unwrap();
    c.tick(DT).unwrap();
    c.pause();
    assert_eq!(c.playback_state(), PlaybackState::Paused);
    assert_eq!(c.capture_state(), CaptureState::Recording);
    c.stop();
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert_eq!(c.capture_state(), CaptureState::Recording);
    c.stop_recording().unwrap();
    assert_eq!(c.capture_state(), CaptureState::Stopped);
}

#[test]
fn paused_clip_holds_position() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    for _ in 0..15 {
        c.tick(DT).unwrap();
    }
    c.pause();
    let at = c.global_time_secs();
    for _ in 0..15 {
        c.tick(DT).unwrap();
    }
    assert_eq!(c.global_time_secs(), at);
}

#[test]
fn failed_play_aborts_recording_start() {
    let s = PlayerSettings {
        autoplay: AutoplayPolicy::RequireGesture,
        ..settings()
    };
    let recorder = InMemoryRecorder::new();
    let log = recorder.log();
    let mut c = controller_with(s, &[([1, 2, 3], 2.0)], &[]).with_recorder(Box::new(recorder));
    assert!(c.start_recording(PlayOrigin::Programmatic).is_err());
    assert_eq!(c.capture_state(), CaptureState::Idle);
    assert_eq!(log.lock().unwrap().aborts, 1);
}

#[test]
fn recording_falls_back_to_generic_webm() {
    let recorder = InMemoryRecorder::with_profiles(vec![RecordingProfile::Webm]);
    let log = recorder.log();
    let mut c = three_clips().with_recorder(Box::new(recorder));
    c.start_recording(PlayOrigin::UserGesture).unwrap();
    assert_eq!(log.lock().unwrap().starts[0].profile, RecordingProfile::Webm);
}

#[test]
fn unsupported_recorder_fails_cleanly() {
    let mut c = three_clips().with_recorder(Box::new(InMemoryRecorder::with_profiles(Vec::new())));
    let err = c.start_recording(PlayOrigin::UserGesture).unwrap_err();
    assert!(matches!(err, ReelError::UnsupportedProfile(_)));
    assert_eq!(c.capture_state(), CaptureState::Idle);
    assert_eq!(c.playback_state(), PlaybackState::Idle);
}

#[test]
fn recording_is_saved_when_playback_completes() {
    let saver = MemorySaver::default();
    let saved = saver.handle();
    let mut c = controller_with(settings(), &[([9, 9, 9], 1.0), ([1, 1, 1], 1.0)], &[])
        .with_saver(Box::new(saver));
    c.start_recording(PlayOrigin::UserGesture).unwrap();
    c.run(&mut crate::player::scheduler::FixedStep::new(DT), 10.0)
        .unwrap();

    assert_eq!(c.capture_state(), CaptureState::Stopped);
    let events = c.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ControllerEvent::RecordingSaved { file_name, .. } if file_name == "reelcast-export.webm"
    )));

    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    let manifest = RecordingManifest::from_blob(&saved[0].bytes).unwrap();
    assert!((manifest.video_secs - 2.0).abs() < 0.15, "{}", manifest.video_secs);
    assert!((manifest.audio_secs - manifest.video_secs).abs() < 0.1);
}

#[test]
fn stop_recording_without_session_errors() {
    let mut c = three_clips();
    assert!(c.stop_recording().is_err());
}

#[test]
fn removing_active_clip_stops_playback() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    c.select_clip(2).unwrap();
    let id = c.registry().ids()[2];
    c.registry_mut().remove(id).unwrap();
    c.tick(DT).unwrap();
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert_eq!(c.active_index(), None);
}

#[test]
fn removing_an_earlier_clip_keeps_the_playing_clip() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    c.select_clip(1).unwrap();
    let playing = c.active_clip().unwrap();
    let first = c.registry().ids()[0];
    c.registry_mut().remove(first).unwrap();

    c.tick(DT).unwrap();
    assert_eq!(c.active_clip(), Some(playing));
    assert_eq!(c.active_index(), Some(0));
    assert_eq!(c.playback_state(), PlaybackState::Playing);

    let frames = c
        .run(&mut crate::player::scheduler::FixedStep::new(DT), 20.0)
        .unwrap();
    assert!(frames < 300, "{frames}");
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert!(c.drain_events().contains(&ControllerEvent::PlaybackCompleted));
}

#[test]
fn removing_the_active_middle_clip_stops_playback() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    c.select_clip(1).unwrap();
    let id = c.active_clip().unwrap();
    c.registry_mut().remove(id).unwrap();
    c.tick(DT).unwrap();
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert_eq!(c.active_clip(), None);
}

#[test]
fn reordering_follows_the_active_clip() {
    let mut c = three_clips();
    c.select_clip(0).unwrap();
    let id = c.active_clip().unwrap();
    c.registry_mut().move_clip(0, 2).unwrap();
    assert_eq!(c.active_index(), Some(2));
    assert_eq!(c.active_clip(), Some(id));
}

#[test]
fn refused_media_play_leaves_state_unchanged() {
    use crate::media::source::{MediaSource, ReadyState, SourceFrame};

    struct Refusing(StillSource);
    impl MediaSource for Refusing {
        fn duration(&self) -> f64 {
            self.0.duration()
        }
        fn current_time(&self) -> f64 {
            self.0.current_time()
        }
        fn ready_state(&self) -> ReadyState {
            self.0.ready_state()
        }
        fn dimensions(&self) -> (u32, u32) {
            self.0.dimensions()
        }
        fn is_paused(&self) -> bool {
            self.0.is_paused()
        }
        fn play(&mut self) -> ReelResult<()> {
            Err(ReelError::media("decoder refused to start"))
        }
        fn pause(&mut self) {
            self.0.pause()
        }
        fn seek(&mut self, secs: f64) {
            self.0.seek(secs)
        }
        fn advance(&mut self, dt_secs: f64) {
            self.0.advance(dt_secs)
        }
        fn current_frame(&mut self) -> ReelResult<Option<SourceFrame>> {
            self.0.current_frame()
        }
        fn mix_audio_into(&mut self, start_secs: f64, out: &mut [f32], gain: f32) {
            self.0.mix_audio_into(start_secs, out, gain)
        }
    }

    let mut registry = ClipRegistry::new();
    let inner = StillSource::solid(64, 36, [7, 7, 7], 2.0).unwrap();
    registry.add("refusing", Box::new(Refusing(inner))).unwrap();
    let mut c = PlaybackController::new(
        settings(),
        registry,
        TransitionPlan::new(Transition::Cut),
        OverlayConfig::default(),
        FontBook::without_system_fonts(FontPaths::default()),
    )
    .unwrap();

    let err = c.play(PlayOrigin::UserGesture).unwrap_err();
    assert!(matches!(err, ReelError::Media(_)));
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    assert_eq!(c.active_index(), None);
    assert!(c.drain_events().is_empty());
    assert!(!c.audio().is_unlocked());
    assert_ne!(c.audio().state(), crate::audio::graph::GraphState::Running);
}

#[test]
fn seek_lands_in_the_right_clip() {
    let mut c = three_clips();
    c.seek(6.0).unwrap();
    assert_eq!(c.active_index(), Some(1));
    assert!((c.global_time_secs() - 6.0).abs() < 1e-9);
    assert_eq!(c.playback_state(), PlaybackState::Idle);
    let frame = c.tick(0.0).unwrap();
    assert_eq!(center(&frame), [0, 255, 0, 255]);

    c.seek(100.0).unwrap();
    assert_eq!(c.active_index(), Some(2));
    c.seek(-1.0).unwrap();
    assert_eq!(c.active_index(), Some(0));
    assert!(controller_with(settings(), &[], &[]).seek(1.0).is_err());
}

#[test]
fn installed_sink_hears_clip_tone_while_playing() {
    let sink = crate::audio::graph::MemorySink::default();
    let heard = sink.handle();
    let mut registry = ClipRegistry::new();
    let source = StillSource::solid(64, 36, [5, 5, 5], 2.0)
        .unwrap()
        .with_tone(440.0, 0.5);
    registry.add("tone", Box::new(source)).unwrap();
    let plan = TransitionPlan::new(Transition::Cut);
    let mut c = PlaybackController::new(
        settings(),
        registry,
        plan,
        OverlayConfig::default(),
        FontBook::without_system_fonts(FontPaths::default()),
    )
    .unwrap()
    .with_audio_sink(Box::new(sink));

    c.play(PlayOrigin::UserGesture).unwrap();
    for _ in 0..5 {
        c.tick(DT).unwrap();
    }
    let heard = heard.lock().unwrap();
    assert!(heard.len() >= 4 * 1600 * 2, "{}", heard.len());
    assert!(heard.iter().any(|s| s.abs() > 0.1));
}

#[test]
fn backing_track_follows_transport() {
    let pcm = crate::media::source::AudioPcm {
        sample_rate: crate::media::source::MIX_SAMPLE_RATE,
        channels: 2,
        interleaved_f32: std::sync::Arc::new(vec![0.25; 48_000 * 2 * 12]),
    };
    let mut c = three_clips().with_backing_track(BackingTrack::new(pcm, 0.5));
    c.play(PlayOrigin::UserGesture).unwrap();
    assert!(c.backing_track().unwrap().is_playing());

    c.select_clip(1).unwrap();
    assert!((c.backing_track().unwrap().position() - 4.0).abs() < 1e-9);

    c.pause();
    assert!(!c.backing_track().unwrap().is_playing());
}

#[test]
fn runtime_filter_and_overlay_changes_apply_next_tick() {
    let mut c = three_clips();
    c.play(PlayOrigin::UserGesture).unwrap();
    assert_eq!(center(&c.tick(DT).unwrap()), [255, 0, 0, 255]);

    c.set_filter(ColorFilter::Grayscale);
    let px = center(&c.tick(DT).unwrap());
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);

    c.overlays_mut().effects.letterbox = true;
    let frame = c.tick(DT).unwrap();
    assert_eq!(frame.pixel(32, 0), [0, 0, 0, 255]);
}

#[test]
fn plan_edits_change_the_next_gap() {
    let mut c = three_clips();
    let first = c.registry().ids()[0];
    c.plan_mut().set_gap(first, Transition::Cut);
    c.play(PlayOrigin::UserGesture).unwrap();
    for _ in 0..200 {
        c.tick(DT).unwrap();
        if c.active_index() == Some(1) {
            break;
        }
    }
    assert_eq!(c.active_index(), Some(1));
    assert_eq!(center(&c.last_frame()), [0, 255, 0, 255]);
}
