use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame::FrameRGBA;

/// Container and codec combination a recording is produced in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordingProfile {
    /// VP9 video and Opus audio in WebM.
    Vp9Webm,
    /// Recorder-chosen WebM codecs (VP8 and Opus with ffmpeg).
    Webm,
}

impl RecordingProfile {
    /// Profiles in order of preference.
    pub const PREFERENCE: [RecordingProfile; 2] =
        [RecordingProfile::Vp9Webm, RecordingProfile::Webm];

    /// MIME type of the produced blob.
    pub fn mime_type(self) -> &'static str {
        match self {
            RecordingProfile::Vp9Webm => "video/webm;codecs=vp9,opus",
            RecordingProfile::Webm => "video/webm",
        }
    }
}

/// Parameters a recorder is started with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamConfig {
    /// Frame size.
    pub canvas: Canvas,
    /// Capture frame rate.
    pub fps: Fps,
    /// Target video bitrate in bits per second.
    pub video_bitrate: u64,
    /// Audio sample rate of pushed PCM.
    pub sample_rate: u32,
    /// Negotiated profile.
    pub profile: RecordingProfile,
}

/// Encodes captured frames and audio into container chunks.
///
/// Chunks may be delivered while recording ([`MediaRecorder::take_chunks`]) and when stopping.
/// The concatenation of all chunks, in order, is the finished file.
pub trait MediaRecorder: Send {
    /// Return `true` when this recorder can produce `profile`.
    fn is_profile_supported(&mut self, profile: RecordingProfile) -> bool;
    /// Begin a recording.
    fn start(&mut self, config: &StreamConfig) -> ReelResult<()>;
    /// Append one captured frame.
    fn push_video_frame(&mut self, frame: &FrameRGBA) -> ReelResult<()>;
    /// Append interleaved stereo PCM.
    fn push_audio(&mut self, interleaved: &[f32]) -> ReelResult<()>;
    /// Chunks that became available since the last call.
    fn take_chunks(&mut self) -> Vec<Vec<u8>>;
    /// Finalize and return the remaining chunks.
    fn stop(&mut self) -> ReelResult<Vec<Vec<u8>>>;
    /// Drop the recording without producing output.
    fn abort(&mut self);
}

/// Pick the first supported profile, warning when the preferred one is unavailable.
pub fn negotiate_profile(recorder: &mut dyn MediaRecorder) -> ReelResult<RecordingProfile> {
    for (rank, profile) in RecordingProfile::PREFERENCE.into_iter().enumerate() {
        if recorder.is_profile_supported(profile) {
            if rank > 0 {
                tracing::warn!(
                    mime = profile.mime_type(),
                    "preferred recording profile unsupported, falling back"
                );
            }
            return Ok(profile);
        }
    }
    Err(ReelError::unsupported_profile(
        "recorder supports neither VP9 WebM nor generic WebM",
    ))
}

/// Converts tick durations into captured frame counts at a fixed rate.
///
/// The first frame is captured at time zero; afterwards a frame is due every `1/fps` seconds,
/// so after `t` seconds `floor(t·fps) + 1` frames have been captured.
#[derive(Clone, Copy, Debug)]
pub struct CaptureStream {
    fps: Fps,
    elapsed: f64,
    captured: u64,
}

impl CaptureStream {
    /// Start a capture clock at zero.
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            elapsed: 0.0,
            captured: 0,
        }
    }

    /// Frames due for the tick that begins after `dt_secs` more seconds.
    pub fn frames_due(&mut self, dt_secs: f64) -> u64 {
        if self.captured > 0 {
            self.elapsed += dt_secs.max(0.0);
        }
        let target = (self.elapsed * self.fps.as_f64() + 1e-9).floor() as u64 + 1;
        let due = target.saturating_sub(self.captured);
        self.captured = self.captured.max(target);
        due
    }

    /// Frames captured so far.
    pub fn captured(&self) -> u64 {
        self.captured
    }

    /// Wall time covered by the captured frames.
    pub fn covered_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.captured)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/recorder.rs"]
mod tests;
