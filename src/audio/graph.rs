use std::sync::{Arc, Mutex};

use crate::audio::analyser::Analyser;
use crate::audio::backing::BackingTrack;
use crate::audio::mix::{FrameBudget, clamp_in_place};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::source::MediaSource;
use crate::player::state::{AutoplayPolicy, PlayOrigin};

/// Output device for mixed audio.
pub trait AudioSink: Send {
    /// Accept interleaved stereo samples at the mix rate.
    fn write(&mut self, interleaved: &[f32]) -> ReelResult<()>;
}

/// Sink that discards audio (headless playback).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _interleaved: &[f32]) -> ReelResult<()> {
        Ok(())
    }
}

/// Sink that keeps everything written to it, readable through a shared handle.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    samples: Arc<Mutex<Vec<f32>>>,
}

impl MemorySink {
    /// Shared view of the collected samples.
    pub fn handle(&self) -> Arc<Mutex<Vec<f32>>> {
        Arc::clone(&self.samples)
    }
}

impl AudioSink for MemorySink {
    fn write(&mut self, interleaved: &[f32]) -> ReelResult<()> {
        let mut samples = self
            .samples
            .lock()
            .map_err(|_| ReelError::media("memory sink lock poisoned"))?;
        samples.extend_from_slice(interleaved);
        Ok(())
    }
}

/// Lifecycle of the audio graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GraphState {
    /// Not yet created.
    #[default]
    Uninitialized,
    /// Created but not producing sound.
    Suspended,
    /// Mixing into the destinations.
    Running,
    /// Torn down; must be initialized again before use.
    Closed,
}

/// Routes the active clip and backing track through a shared analyser into the speakers and,
/// while a recording tap is open, into the recording destination.
pub struct AudioGraph {
    state: GraphState,
    unlocked: bool,
    analyser: Analyser,
    speakers: Box<dyn AudioSink>,
    budget: FrameBudget,
    scratch: Vec<f32>,
    recording: Option<Vec<f32>>,
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("state", &self.state)
            .field("unlocked", &self.unlocked)
            .field("recording", &self.recording.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl AudioGraph {
    /// Create an uninitialized graph playing to `speakers`.
    pub fn new(speakers: Box<dyn AudioSink>) -> Self {
        Self {
            state: GraphState::Uninitialized,
            unlocked: false,
            analyser: Analyser::default(),
            speakers,
            budget: FrameBudget::default(),
            scratch: Vec::new(),
            recording: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Return `true` once a resume has been permitted.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Create the graph in the suspended state. Idempotent.
    pub fn init(&mut self) {
        if matches!(self.state, GraphState::Uninitialized | GraphState::Closed) {
            self.analyser.clear();
            self.budget.reset();
            self.state = GraphState::Suspended;
            tracing::debug!("audio graph initialized");
        }
    }

    /// Start producing sound.
    ///
    /// The first successful resume must satisfy `policy` for `origin`; later resumes are always
    /// allowed.
    pub fn resume(&mut self, origin: PlayOrigin, policy: AutoplayPolicy) -> ReelResult<()> {
        self.init();
        self.check_autoplay(origin, policy)?;
        self.unlocked = true;
        self.state = GraphState::Running;
        Ok(())
    }

    /// Fail with `AutoplayBlocked` when a resume from `origin` would be refused. Changes nothing.
    pub fn check_autoplay(&self, origin: PlayOrigin, policy: AutoplayPolicy) -> ReelResult<()> {
        if !self.unlocked && !policy.permits(origin) {
            return Err(ReelError::autoplay_blocked(
                "audio output requires a user gesture",
            ));
        }
        Ok(())
    }

    /// Stop producing sound, keeping the graph alive.
    pub fn suspend(&mut self) {
        if self.state == GraphState::Running {
            self.state = GraphState::Suspended;
        }
    }

    /// Release the graph. Any open recording tap is discarded.
    pub fn teardown(&mut self) {
        self.state = GraphState::Closed;
        self.recording = None;
        self.analyser.clear();
        tracing::debug!("audio graph torn down");
    }

    /// Start collecting the mixed output for a recording.
    pub fn open_recording_tap(&mut self) {
        self.recording = Some(Vec::new());
    }

    /// Return `true` while a recording tap is open.
    pub fn recording_tap_open(&self) -> bool {
        self.recording.is_some()
    }

    /// Take samples collected since the last call.
    pub fn take_recorded(&mut self) -> Vec<f32> {
        self.recording.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Close the recording tap, returning any samples not yet taken.
    pub fn close_recording_tap(&mut self) -> Vec<f32> {
        self.recording.take().unwrap_or_default()
    }

    /// Mix `dt_secs` of audio from the active clip and the backing track.
    ///
    /// A suspended graph produces silence; the recording tap still receives it so the recorded
    /// track stays aligned with the video. Returns the number of stereo frames processed.
    pub fn process(
        &mut self,
        dt_secs: f64,
        clip: Option<&mut dyn MediaSource>,
        backing: Option<&mut BackingTrack>,
    ) -> ReelResult<usize> {
        let frames = self.budget.take(dt_secs);
        if frames == 0 || matches!(self.state, GraphState::Uninitialized | GraphState::Closed) {
            return Ok(frames);
        }
        self.scratch.clear();
        self.scratch.resize(frames * 2, 0.0);

        if self.state == GraphState::Running {
            if let Some(clip) = clip
                && !clip.is_paused()
                && clip.ready_state().can_draw()
            {
                let at = clip.current_time();
                clip.mix_audio_into(at, &mut self.scratch, 1.0);
            }
            if let Some(backing) = backing {
                backing.mix_into(&mut self.scratch);
            }
            clamp_in_place(&mut self.scratch);
            self.speakers.write(&self.scratch)?;
        }

        self.analyser.push_stereo(&self.scratch);
        if let Some(recording) = self.recording.as_mut() {
            recording.extend_from_slice(&self.scratch);
        }
        Ok(frames)
    }

    /// Spectrum bytes for the visualizer.
    pub fn spectrum(&mut self) -> Vec<u8> {
        self.analyser.byte_frequency_data()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/graph.rs"]
mod tests;
