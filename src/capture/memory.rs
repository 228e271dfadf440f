use std::sync::{Arc, Mutex};

use crate::capture::recorder::{MediaRecorder, RecordingProfile, StreamConfig};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame::FrameRGBA;

/// Summary written as the final chunk of an in-memory recording.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordingManifest {
    /// Negotiated profile.
    pub profile: RecordingProfile,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Capture rate.
    pub fps: f64,
    /// Number of captured frames.
    pub frames: u64,
    /// Stereo audio frames received.
    pub audio_frames: u64,
    /// Audio sample rate.
    pub sample_rate: u32,
    /// Video duration implied by `frames / fps`.
    pub video_secs: f64,
    /// Audio duration implied by `audio_frames / sample_rate`.
    pub audio_secs: f64,
    /// Fingerprint of every captured frame, in order.
    pub fingerprints: Vec<u64>,
}

impl RecordingManifest {
    /// Parse the manifest from a finished blob (its last non-empty line).
    pub fn from_blob(blob: &[u8]) -> ReelResult<Self> {
        let text = std::str::from_utf8(blob)
            .map_err(|e| ReelError::serde(format!("recording blob is not utf-8: {e}")))?;
        let last = text
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| ReelError::serde("recording blob is empty"))?;
        serde_json::from_str(last).map_err(|e| ReelError::serde(e.to_string()))
    }
}

/// Observable state of an [`InMemoryRecorder`], shared with whoever holds the handle.
#[derive(Clone, Debug, Default)]
pub struct RecorderLog {
    /// Configs passed to every `start`.
    pub starts: Vec<StreamConfig>,
    /// Number of aborted sessions.
    pub aborts: u32,
    /// Number of finalized sessions.
    pub stops: u32,
}

#[derive(Debug)]
struct Session {
    config: StreamConfig,
    fingerprints: Vec<u64>,
    audio_samples: u64,
    pending: Vec<Vec<u8>>,
}

/// Recorder producing newline-delimited JSON instead of encoded video.
///
/// A header chunk is emitted on start, a progress chunk for every second of captured frames,
/// and a [`RecordingManifest`] chunk on stop.
#[derive(Debug)]
pub struct InMemoryRecorder {
    supported: Vec<RecordingProfile>,
    fail_start: bool,
    session: Option<Session>,
    log: Arc<Mutex<RecorderLog>>,
}

impl Default for InMemoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecorder {
    /// Recorder supporting every profile.
    pub fn new() -> Self {
        Self::with_profiles(RecordingProfile::PREFERENCE.to_vec())
    }

    /// Recorder supporting only `supported`.
    pub fn with_profiles(supported: Vec<RecordingProfile>) -> Self {
        Self {
            supported,
            fail_start: false,
            session: None,
            log: Arc::new(Mutex::new(RecorderLog::default())),
        }
    }

    /// Make every `start` fail.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Shared view of start/stop activity.
    pub fn log(&self) -> Arc<Mutex<RecorderLog>> {
        Arc::clone(&self.log)
    }

    fn with_log(&self, f: impl FnOnce(&mut RecorderLog)) {
        if let Ok(mut log) = self.log.lock() {
            f(&mut log);
        }
    }
}

fn json_line<T: serde::Serialize>(value: &T) -> ReelResult<Vec<u8>> {
    let mut line = serde_json::to_vec(value).map_err(|e| ReelError::serde(e.to_string()))?;
    line.push(b'\n');
    Ok(line)
}

impl MediaRecorder for InMemoryRecorder {
    fn is_profile_supported(&mut self, profile: RecordingProfile) -> bool {
        self.supported.contains(&profile)
    }

    fn start(&mut self, config: &StreamConfig) -> ReelResult<()> {
        if self.session.is_some() {
            return Err(ReelError::recorder("recording already in progress"));
        }
        if self.fail_start {
            return Err(ReelError::recorder("recorder refused to start"));
        }
        if !self.supported.contains(&config.profile) {
            return Err(ReelError::unsupported_profile(config.profile.mime_type()));
        }
        let header = json_line(&serde_json::json!({
            "mime": config.profile.mime_type(),
            "width": config.canvas.width,
            "height": config.canvas.height,
        }))?;
        self.session = Some(Session {
            config: *config,
            fingerprints: Vec::new(),
            audio_samples: 0,
            pending: vec![header],
        });
        let config = *config;
        self.with_log(|log| log.starts.push(config));
        Ok(())
    }

    fn push_video_frame(&mut self, frame: &FrameRGBA) -> ReelResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ReelError::recorder("no recording in progress"))?;
        if frame.width != session.config.canvas.width
            || frame.height != session.config.canvas.height
        {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width,
                frame.height,
                session.config.canvas.width,
                session.config.canvas.height
            )));
        }
        session.fingerprints.push(frame.fingerprint());

        let frames = session.fingerprints.len() as u64;
        if frames.is_multiple_of(u64::from(session.config.fps.num.max(1))) {
            let progress = json_line(&serde_json::json!({ "frames": frames }))?;
            session.pending.push(progress);
        }
        Ok(())
    }

    fn push_audio(&mut self, interleaved: &[f32]) -> ReelResult<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ReelError::recorder("no recording in progress"))?;
        session.audio_samples += interleaved.len() as u64;
        Ok(())
    }

    fn take_chunks(&mut self) -> Vec<Vec<u8>> {
        self.session
            .as_mut()
            .map(|s| std::mem::take(&mut s.pending))
            .unwrap_or_default()
    }

    fn stop(&mut self) -> ReelResult<Vec<Vec<u8>>> {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| ReelError::recorder("no recording in progress"))?;
        let fps = session.config.fps.as_f64();
        let frames = session.fingerprints.len() as u64;
        let audio_frames = session.audio_samples / 2;
        let manifest = RecordingManifest {
            profile: session.config.profile,
            width: session.config.canvas.width,
            height: session.config.canvas.height,
            fps,
            frames,
            audio_frames,
            sample_rate: session.config.sample_rate,
            video_secs: session.config.fps.frames_to_secs(frames),
            audio_secs: audio_frames as f64 / f64::from(session.config.sample_rate.max(1)),
            fingerprints: std::mem::take(&mut session.fingerprints),
        };
        session.pending.push(json_line(&manifest)?);
        self.with_log(|log| log.stops += 1);
        Ok(session.pending)
    }

    fn abort(&mut self) {
        if self.session.take().is_some() {
            self.with_log(|log| log.aborts += 1);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/memory.rs"]
mod tests;
