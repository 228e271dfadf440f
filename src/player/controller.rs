use crate::audio::backing::BackingTrack;
use crate::audio::graph::{AudioGraph, AudioSink, NullSink};
use crate::capture::memory::InMemoryRecorder;
use crate::capture::recorder::{CaptureStream, MediaRecorder, StreamConfig, negotiate_profile};
use crate::capture::save::{FileSaver, MemorySaver};
use crate::clips::registry::{ClipId, ClipRegistry};
use crate::clips::transition::{Transition, TransitionPlan};
use crate::foundation::error::{ReelError, ReelResult};
use crate::overlay::text::FontBook;
use crate::overlay::{OverlayConfig, OverlayContext, OverlayEngine};
use crate::player::scheduler::FrameScheduler;
use crate::player::state::{CaptureState, ControllerEvent, PlayOrigin, PlaybackState};
use crate::project::settings::PlayerSettings;
use crate::render::filter::ColorFilter;
use crate::render::frame::{FrameRGBA, Surface};
use crate::render::render_loop::RenderLoop;

/// User-facing playback and capture commands.
pub trait Player {
    /// Start or resume playback, activating the first clip when none is active.
    fn play(&mut self, origin: PlayOrigin) -> ReelResult<()>;
    /// Hold the current position. Capture keeps running.
    fn pause(&mut self);
    /// Pause everything and deactivate the clip. Capture keeps running.
    fn stop(&mut self);
    /// Jump to clip `index` with a hard cut.
    fn select_clip(&mut self, index: usize) -> ReelResult<()>;
    /// Start recording the composited output from the first clip.
    fn start_recording(&mut self, origin: PlayOrigin) -> ReelResult<()>;
    /// Finalize the recording and hand it to the file saver.
    fn stop_recording(&mut self) -> ReelResult<()>;
    /// Current playback state.
    fn playback_state(&self) -> PlaybackState;
    /// Current capture state.
    fn capture_state(&self) -> CaptureState;
}

struct Recording {
    stream: CaptureStream,
    chunks: Vec<Vec<u8>>,
}

/// Drives clips, transitions, overlays, audio and capture one animation frame at a time.
///
/// Recordings go to an [`InMemoryRecorder`] and a [`MemorySaver`] unless other implementations
/// are installed with [`PlaybackController::with_recorder`] and
/// [`PlaybackController::with_saver`].
pub struct PlaybackController {
    settings: PlayerSettings,
    registry: ClipRegistry,
    plan: TransitionPlan,
    filter: ColorFilter,
    render: RenderLoop,
    overlays: OverlayEngine,
    audio: AudioGraph,
    backing: Option<BackingTrack>,
    recorder: Box<dyn MediaRecorder>,
    saver: Box<dyn FileSaver>,
    active: Option<ClipId>,
    playback: PlaybackState,
    capture: CaptureState,
    recording: Option<Recording>,
    output: Surface,
    clock_ms: f64,
    frame_index: u64,
    events: Vec<ControllerEvent>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("clips", &self.registry.len())
            .field("active", &self.active)
            .field("playback", &self.playback)
            .field("capture", &self.capture)
            .field("clock_ms", &self.clock_ms)
            .finish_non_exhaustive()
    }
}

impl PlaybackController {
    /// Build a controller over `registry` with the given plan and overlays.
    pub fn new(
        settings: PlayerSettings,
        registry: ClipRegistry,
        plan: TransitionPlan,
        overlays: OverlayConfig,
        fonts: FontBook,
    ) -> ReelResult<Self> {
        settings.validate()?;
        let render = RenderLoop::from_settings(&settings)?;
        let mut output = Surface::new(settings.canvas)?;
        output.fill([0, 0, 0, 255]);
        let overlays = OverlayEngine::new(overlays, &settings, fonts);
        Ok(Self {
            settings,
            registry,
            plan,
            filter: ColorFilter::None,
            render,
            overlays,
            audio: AudioGraph::new(Box::new(NullSink)),
            backing: None,
            recorder: Box::new(InMemoryRecorder::new()),
            saver: Box::new(MemorySaver::default()),
            active: None,
            playback: PlaybackState::Idle,
            capture: CaptureState::Idle,
            recording: None,
            output,
            clock_ms: 0.0,
            frame_index: 0,
            events: Vec::new(),
        })
    }

    /// Use `recorder` for captures.
    pub fn with_recorder(mut self, recorder: Box<dyn MediaRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Use `saver` for finished recordings.
    pub fn with_saver(mut self, saver: Box<dyn FileSaver>) -> Self {
        self.saver = saver;
        self
    }

    /// Play audio to `sink`.
    pub fn with_audio_sink(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.audio = AudioGraph::new(sink);
        self
    }

    /// Mix `track` under the clips.
    pub fn with_backing_track(mut self, track: BackingTrack) -> Self {
        self.backing = Some(track);
        self
    }

    /// Apply `filter` to live clip draws.
    pub fn with_filter(mut self, filter: ColorFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Settings in effect.
    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// The clips being played.
    pub fn registry(&self) -> &ClipRegistry {
        &self.registry
    }

    /// Mutable access to the clips.
    ///
    /// The active clip is tracked by id, so reordering keeps it playing. If it is removed, the
    /// controller stops on the next tick.
    pub fn registry_mut(&mut self) -> &mut ClipRegistry {
        &mut self.registry
    }

    /// Mutable access to the transition plan.
    pub fn plan_mut(&mut self) -> &mut TransitionPlan {
        &mut self.plan
    }

    /// Mutable access to the overlay configuration.
    pub fn overlays_mut(&mut self) -> &mut OverlayConfig {
        self.overlays.config_mut()
    }

    /// Change the color filter from the next frame.
    pub fn set_filter(&mut self, filter: ColorFilter) {
        self.filter = filter;
    }

    /// Audio routing graph.
    pub fn audio(&self) -> &AudioGraph {
        &self.audio
    }

    /// Music bed, if one is installed.
    pub fn backing_track(&self) -> Option<&BackingTrack> {
        self.backing.as_ref()
    }

    /// Current index of the active clip.
    pub fn active_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.registry.index_of(id))
    }

    /// Id of the active clip.
    pub fn active_clip(&self) -> Option<ClipId> {
        self.active
    }

    /// Position on the global timeline: the active clip's offset plus its local time.
    pub fn global_time_secs(&self) -> f64 {
        let Some(index) = self.active_index() else {
            return 0.0;
        };
        let local = self
            .registry
            .get(index)
            .map(|c| c.source().current_time())
            .unwrap_or(0.0);
        self.registry.start_offset_secs(index) + local
    }

    /// Milliseconds of animation time since construction.
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Take pending notifications.
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Most recently composited frame.
    pub fn last_frame(&self) -> FrameRGBA {
        self.output.to_frame()
    }

    fn activate(&mut self, index: usize, transition: Transition) -> ReelResult<()> {
        if index >= self.registry.len() {
            return Err(ReelError::validation(format!(
                "clip index {index} out of range ({} clips)",
                self.registry.len()
            )));
        }
        if let Some(prev) = self.active_index().and_then(|i| self.registry.get_mut(i)) {
            prev.source_mut().pause();
        }

        let playing = self.playback == PlaybackState::Playing;
        let clip = self
            .registry
            .get_mut(index)
            .ok_or_else(|| ReelError::validation("clip index out of range"))?;
        let id = clip.id();
        self.render.begin_clip_switch(transition, self.clock_ms);
        self.active = Some(id);
        clip.source_mut().seek(0.0);
        if playing && let Err(err) = clip.source_mut().play() {
            tracing::warn!(clip = %id, error = %err, "clip refused to play");
        }
        tracing::debug!(index, clip = %id, ?transition, "clip activated");
        self.events.push(ControllerEvent::ClipChanged { index, id });

        let at = self.registry.start_offset_secs(index);
        if let Some(backing) = self.backing.as_mut() {
            backing.seek(at);
        }
        Ok(())
    }

    /// Jump to `global_secs` on the timeline with a hard cut, clamped to the sequence.
    #[tracing::instrument(skip(self))]
    pub fn seek(&mut self, global_secs: f64) -> ReelResult<()> {
        if self.registry.is_empty() {
            return Err(ReelError::validation("no clips to seek in"));
        }
        let total = self.registry.total_duration_secs();
        let at = if global_secs.is_finite() {
            global_secs.clamp(0.0, total)
        } else {
            0.0
        };
        let last = self.registry.len() - 1;
        let index = (0..last)
            .find(|&i| at < self.registry.start_offset_secs(i + 1))
            .unwrap_or(last);

        if self.active_index() != Some(index) {
            self.activate(index, Transition::Cut)?;
        } else {
            self.render.reset();
        }
        let local = at - self.registry.start_offset_secs(index);
        if let Some(clip) = self.registry.get_mut(index) {
            clip.source_mut().seek(local);
        }
        if let Some(backing) = self.backing.as_mut() {
            backing.seek(at);
        }
        Ok(())
    }

    /// Handle the active clip reaching its end. Returns `true` when playback completed.
    fn advance_after_end(&mut self) -> ReelResult<bool> {
        let Some(from) = self.active_index() else {
            return Ok(false);
        };
        let next = from + 1;
        if next < self.registry.len() {
            let transition = self.plan.resolve(from, next, &self.registry);
            self.activate(next, transition)?;
            return Ok(false);
        }

        tracing::info!("playback completed");
        self.playback = PlaybackState::Idle;
        self.active = None;
        if let Some(backing) = self.backing.as_mut() {
            backing.stop();
        }
        self.events.push(ControllerEvent::PlaybackCompleted);
        Ok(true)
    }

    /// Advance by `dt_secs`, composite one frame and feed any active recording.
    pub fn tick(&mut self, dt_secs: f64) -> ReelResult<FrameRGBA> {
        let dt = if dt_secs.is_finite() { dt_secs.max(0.0) } else { 0.0 };
        self.clock_ms += dt * 1000.0;
        self.frame_index += 1;

        if let Some(id) = self.active
            && self.registry.index_of(id).is_none()
        {
            tracing::warn!(clip = %id, "active clip no longer registered, stopping");
            self.stop();
        }

        let active = self.active_index();
        let clip = match active {
            Some(i) if self.playback == PlaybackState::Playing => {
                self.registry.get_mut(i).map(|c| c.source_mut())
            }
            _ => None,
        };
        self.audio.process(dt, clip, self.backing.as_mut())?;

        let ended = match active.and_then(|i| self.registry.get_mut(i)) {
            Some(clip) if self.playback == PlaybackState::Playing => {
                let source = clip.source_mut();
                source.advance(dt);
                source.ended()
            }
            _ => false,
        };
        let completed = ended && self.advance_after_end()?;

        self.compose()?;

        if let Some(recording) = self.recording.as_mut() {
            let frame = self.output.to_frame();
            for _ in 0..recording.stream.frames_due(dt) {
                self.recorder.push_video_frame(&frame)?;
            }
            let audio = self.audio.take_recorded();
            self.recorder.push_audio(&audio)?;
            recording.chunks.extend(self.recorder.take_chunks());
        }

        if completed && self.capture == CaptureState::Recording {
            if let Err(err) = self.stop_recording() {
                tracing::warn!(error = %err, "finalizing recording after playback failed");
            }
        }

        Ok(self.output.to_frame())
    }

    fn compose(&mut self) -> ReelResult<()> {
        let active = self.active_index();
        let media = active
            .and_then(|i| self.registry.get_mut(i))
            .map(|c| c.source_mut());
        let content = self.render.render_content(media, self.filter, self.clock_ms)?;
        self.output.copy_from(content)?;

        let spectrum = if self.playback == PlaybackState::Playing {
            self.audio.spectrum()
        } else {
            Vec::new()
        };
        let role = active.and_then(|i| self.registry.role_at(i));
        let (clip_time, clip_duration) = active
            .and_then(|i| self.registry.get(i))
            .map(|c| (c.source().current_time(), c.duration_secs()))
            .unwrap_or((0.0, 0.0));
        let cx = OverlayContext {
            role,
            clip_time,
            clip_duration,
            playing: self.playback == PlaybackState::Playing,
            spectrum: &spectrum,
            frame_index: self.frame_index,
        };
        self.overlays.draw(&mut self.output, &cx)
    }

    /// Tick with `scheduler` while playing or recording, for at most `max_secs` of frame time.
    ///
    /// Returns the number of frames produced.
    pub fn run(&mut self, scheduler: &mut dyn FrameScheduler, max_secs: f64) -> ReelResult<u64> {
        self.run_with(scheduler, max_secs, |_| Ok(()))
    }

    /// Like [`PlaybackController::run`], handing every frame to `on_frame`.
    pub fn run_with(
        &mut self,
        scheduler: &mut dyn FrameScheduler,
        max_secs: f64,
        mut on_frame: impl FnMut(&FrameRGBA) -> ReelResult<()>,
    ) -> ReelResult<u64> {
        let mut elapsed = 0.0;
        let mut frames = 0u64;
        while (self.playback == PlaybackState::Playing || self.capture == CaptureState::Recording)
            && elapsed < max_secs
        {
            let dt = scheduler.next_frame();
            elapsed += dt;
            let frame = self.tick(dt)?;
            on_frame(&frame)?;
            frames += 1;
        }
        Ok(frames)
    }

    fn finish_recording(&mut self, recording: Recording) -> ReelResult<(String, usize)> {
        let mut chunks = recording.chunks;
        let tail = self.audio.close_recording_tap();
        if !tail.is_empty() {
            self.recorder.push_audio(&tail)?;
        }
        chunks.extend(self.recorder.take_chunks());
        chunks.extend(self.recorder.stop()?);
        let blob = chunks.concat();
        if blob.is_empty() {
            return Err(ReelError::recorder("recorder produced no data"));
        }
        let name = self.settings.export_file_name.clone();
        self.saver.save(&name, &blob)?;
        Ok((name, blob.len()))
    }
}

impl Player for PlaybackController {
    #[tracing::instrument(skip(self))]
    fn play(&mut self, origin: PlayOrigin) -> ReelResult<()> {
        if self.registry.is_empty() {
            return Err(ReelError::validation("no clips to play"));
        }
        if let Err(err) = self.audio.check_autoplay(origin, self.settings.autoplay) {
            tracing::warn!(error = %err, "play rejected");
            return Err(err);
        }
        let current = self.active_index();
        let index = current.unwrap_or(0);
        let clip = self
            .registry
            .get_mut(index)
            .ok_or_else(|| ReelError::validation("active clip missing"))?;
        if current.is_none() {
            clip.source_mut().seek(0.0);
        }
        if let Err(err) = clip.source_mut().play() {
            tracing::warn!(clip = %clip.id(), error = %err, "clip refused to play");
            return Err(err);
        }
        if current.is_none() {
            self.activate(0, Transition::Cut)?;
        }
        self.audio.resume(origin, self.settings.autoplay)?;

        self.playback = PlaybackState::Playing;
        let at = self.global_time_secs();
        if let Some(backing) = self.backing.as_mut() {
            backing.seek(at);
            backing.start();
        }
        tracing::info!(index, at, "playing");
        Ok(())
    }

    fn pause(&mut self) {
        if self.playback != PlaybackState::Playing {
            return;
        }
        if let Some(clip) = self.active_index().and_then(|i| self.registry.get_mut(i)) {
            clip.source_mut().pause();
        }
        if let Some(backing) = self.backing.as_mut() {
            backing.stop();
        }
        self.playback = PlaybackState::Paused;
        tracing::info!("paused");
    }

    fn stop(&mut self) {
        if let Some(clip) = self.active_index().and_then(|i| self.registry.get_mut(i)) {
            let source = clip.source_mut();
            source.pause();
            source.seek(0.0);
        }
        if let Some(backing) = self.backing.as_mut() {
            backing.stop();
            backing.seek(0.0);
        }
        self.active = None;
        self.render.reset();
        self.playback = PlaybackState::Idle;
        tracing::info!("stopped");
    }

    #[tracing::instrument(skip(self))]
    fn select_clip(&mut self, index: usize) -> ReelResult<()> {
        self.activate(index, Transition::Cut)
    }

    #[tracing::instrument(skip(self))]
    fn start_recording(&mut self, origin: PlayOrigin) -> ReelResult<()> {
        if self.capture == CaptureState::Recording {
            return Err(ReelError::recorder("already recording"));
        }
        if self.registry.is_empty() {
            return Err(ReelError::validation("no clips to record"));
        }

        let profile = negotiate_profile(self.recorder.as_mut())?;
        let fps = self.settings.capture_fps()?;
        let config = StreamConfig {
            canvas: self.settings.canvas,
            fps,
            video_bitrate: self.settings.video_bitrate,
            sample_rate: self.settings.sample_rate,
            profile,
        };
        self.recorder.start(&config)?;
        self.audio.init();
        self.audio.open_recording_tap();

        let started = self
            .activate(0, Transition::Cut)
            .and_then(|()| self.play(origin));
        if let Err(err) = started {
            tracing::warn!(error = %err, "recording not started");
            self.recorder.abort();
            self.audio.close_recording_tap();
            return Err(err);
        }

        self.recording = Some(Recording {
            stream: CaptureStream::new(fps),
            chunks: Vec::new(),
        });
        self.capture = CaptureState::Recording;
        tracing::info!(mime = profile.mime_type(), "recording started");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn stop_recording(&mut self) -> ReelResult<()> {
        let Some(recording) = self.recording.take() else {
            return Err(ReelError::recorder("not recording"));
        };
        self.capture = CaptureState::Stopped;
        match self.finish_recording(recording) {
            Ok((file_name, bytes)) => {
                tracing::info!(file_name = %file_name, bytes, "recording saved");
                self.events
                    .push(ControllerEvent::RecordingSaved { file_name, bytes });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "recording failed");
                self.recorder.abort();
                self.events.push(ControllerEvent::RecordingFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn playback_state(&self) -> PlaybackState {
        self.playback
    }

    fn capture_state(&self) -> CaptureState {
        self.capture
    }
}

#[cfg(test)]
#[path = "../../tests/unit/player/controller.rs"]
mod tests;
