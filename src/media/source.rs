use std::sync::Arc;

use crate::foundation::error::ReelResult;

/// Internal audio mixing sample rate used across decode/mix/capture.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// Loading progress of a media source, ordered from least to most data available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    /// Nothing is known about the media yet.
    HaveNothing,
    /// Duration and dimensions are known, no frame is decodable yet.
    HaveMetadata,
    /// The frame at the current position is available.
    HaveCurrentData,
    /// The current frame and at least a little more are available.
    HaveFutureData,
    /// Enough data is buffered to play through.
    HaveEnoughData,
}

impl ReadyState {
    /// Return `true` when a frame can be drawn at the current position.
    pub fn can_draw(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

/// A decoded video frame in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes, tightly packed, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl SourceFrame {
    /// Build a frame filled with a single opaque color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let px = [rgb[0], rgb[1], rgb[2], 255];
        Self {
            width,
            height,
            rgba8_premul: Arc::new(px.repeat(width as usize * height as usize)),
        }
    }
}

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` PCM samples.
    pub interleaved_f32: Arc<Vec<f32>>,
}

impl AudioPcm {
    /// Empty stereo PCM at the mix rate.
    pub fn silent() -> Self {
        Self {
            sample_rate: MIX_SAMPLE_RATE,
            channels: 2,
            interleaved_f32: Arc::new(Vec::new()),
        }
    }

    /// Duration of the decoded audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        let frames = self.interleaved_f32.len() / usize::from(self.channels);
        frames as f64 / f64::from(self.sample_rate)
    }
}

/// Decodable media handle driven by the playback controller.
///
/// Sources keep their own clock: [`MediaSource::advance`] moves the position forward only while
/// the source is playing and has data at its current position. A source that is still loading
/// accumulates load progress instead.
pub trait MediaSource: Send {
    /// Total duration in seconds (finite, > 0 for usable sources).
    fn duration(&self) -> f64;
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;
    /// Current loading state.
    fn ready_state(&self) -> ReadyState;
    /// Natural frame size in pixels.
    fn dimensions(&self) -> (u32, u32);
    /// Return `true` when the source is not playing.
    fn is_paused(&self) -> bool;
    /// Start or resume playback.
    fn play(&mut self) -> ReelResult<()>;
    /// Pause playback, keeping the current position.
    fn pause(&mut self);
    /// Jump to `secs`, clamped into `[0, duration]`.
    fn seek(&mut self, secs: f64);
    /// Advance the source clock by `dt_secs` of wall time.
    fn advance(&mut self, dt_secs: f64);
    /// Frame at the current position, when one is decodable.
    fn current_frame(&mut self) -> ReelResult<Option<SourceFrame>>;
    /// Mix `out.len() / 2` stereo frames of audio starting at `start_secs` into `out`.
    fn mix_audio_into(&mut self, start_secs: f64, out: &mut [f32], gain: f32);
    /// Release decoded resources. The source is not used afterwards.
    fn release(&mut self) {}

    /// Return `true` once the position has reached the end of the media.
    fn ended(&self) -> bool {
        self.current_time() >= self.duration()
    }
}
