//! Reelcast is a headless multi-clip compositor and player.
//!
//! A [`PlaybackController`] plays an ordered list of clips (videos, stills or color slates)
//! onto a fixed-size canvas, one animation frame at a time:
//!
//! 1. **Clip**: the active [`MediaSource`] is drawn contained with a slow Ken Burns zoom and the
//!    selected [`ColorFilter`].
//! 2. **Transition**: on a clip switch the last frame is kept as a ghost and blended with the
//!    incoming clip ([`Transition::Dissolve`], [`Transition::FadeToBlack`]) or dropped
//!    ([`Transition::Cut`]).
//! 3. **Overlays**: grain, vignette, letterbox, spectrum bars, opening title and closing credits.
//! 4. **Capture** (optional): frames and mixed audio go to a [`MediaRecorder`] and the finished
//!    WebM is handed to a [`FileSaver`].
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic stepping**: given the same tick deltas, output frames are identical.
//! - **Premultiplied RGBA8** end-to-end on the canvas.
//! - **External tools only at the edges**: video decode and WebM encode shell out to `ffmpeg`
//!   behind the `media-ffmpeg` feature.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Mixing, analysis and the audio graph.
pub mod audio;
/// Recorders, profiles and file savers.
pub mod capture;
/// Clip registry and transition plan.
pub mod clips;
/// Media sources: stills, slates and ffmpeg-backed video.
pub mod media;
/// Title, credits, effects and the spectrum visualizer.
pub mod overlay;
/// Controller, scheduler and state machines.
pub mod player;
/// Production documents and settings.
pub mod project;
/// Surfaces, blending, filters and the render loop.
pub mod render;

pub use audio::analyser::Analyser;
pub use audio::backing::BackingTrack;
pub use audio::graph::{AudioGraph, AudioSink, GraphState, MemorySink, NullSink};
pub use capture::ffmpeg::{FfmpegRecorder, is_ffmpeg_on_path};
pub use capture::memory::{InMemoryRecorder, RecordingManifest};
pub use capture::recorder::{MediaRecorder, RecordingProfile, StreamConfig};
pub use capture::save::{DirectorySaver, FileSaver, MemorySaver};
pub use clips::registry::{Clip, ClipId, ClipRegistry, ClipRole};
pub use clips::transition::{Transition, TransitionPlan};
pub use foundation::core::{Canvas, Fps, Rgb, Rgba8Premul};
pub use foundation::error::{ReelError, ReelResult};
pub use media::ffmpeg::{FfmpegVideoSource, VideoSourceInfo, probe_video};
pub use media::source::{AudioPcm, MIX_SAMPLE_RATE, MediaSource, ReadyState, SourceFrame};
pub use media::still::StillSource;
pub use overlay::credits::{ClosingCredits, CreditLine};
pub use overlay::effects::CinematicEffects;
pub use overlay::text::{FontBook, FontPaths};
pub use overlay::title::{TitleDesign, TitlePosition, TitleStyle};
pub use overlay::{OverlayConfig, OverlayEngine};
pub use player::controller::{PlaybackController, Player};
pub use player::scheduler::{FixedStep, FrameScheduler, Realtime};
pub use player::state::{AutoplayPolicy, CaptureState, ControllerEvent, PlayOrigin, PlaybackState};
pub use project::model::{BackingTrackSpec, ClipSpec, Production, Suggestions, normalize_rel_path};
pub use project::settings::PlayerSettings;
pub use render::filter::ColorFilter;
pub use render::frame::{FrameRGBA, Surface};
