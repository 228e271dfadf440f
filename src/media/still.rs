use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::foundation::error::{ReelError, ReelResult};
use crate::media::source::{MIX_SAMPLE_RATE, MediaSource, ReadyState, SourceFrame};

/// A source showing one still frame for a fixed duration.
///
/// Used for image clips and color slates. An optional load delay models a source that needs
/// some wall time before its first frame is decodable, and an optional sine tone gives the clip
/// an audio track.
#[derive(Clone, Debug)]
pub struct StillSource {
    frame: SourceFrame,
    duration: f64,
    position: f64,
    playing: bool,
    load_remaining: f64,
    tone: Option<Tone>,
}

#[derive(Clone, Copy, Debug)]
struct Tone {
    freq_hz: f32,
    amplitude: f32,
}

impl StillSource {
    /// Create a still source from an existing frame.
    pub fn new(frame: SourceFrame, duration_secs: f64) -> ReelResult<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ReelError::validation(
                "still source duration must be finite and > 0",
            ));
        }
        if frame.width == 0 || frame.height == 0 {
            return Err(ReelError::validation(
                "still source frame must have non-zero size",
            ));
        }
        Ok(Self {
            frame,
            duration: duration_secs,
            position: 0.0,
            playing: false,
            load_remaining: 0.0,
            tone: None,
        })
    }

    /// Create a solid-color slate of the given size.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3], duration_secs: f64) -> ReelResult<Self> {
        Self::new(SourceFrame::solid(width, height, rgb), duration_secs)
    }

    /// Decode an image file into a still source.
    pub fn from_image_path(path: &Path, duration_secs: f64) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read image '{}'", path.display()))?;
        Self::new(decode_image_frame(&bytes)?, duration_secs)
    }

    /// Require `secs` of wall time before the first frame becomes available.
    pub fn with_load_delay(mut self, secs: f64) -> Self {
        self.load_remaining = secs.max(0.0);
        self
    }

    /// Attach a sine tone as this source's audio track.
    pub fn with_tone(mut self, freq_hz: f32, amplitude: f32) -> Self {
        self.tone = Some(Tone {
            freq_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
        });
        self
    }
}

impl MediaSource for StillSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn ready_state(&self) -> ReadyState {
        if self.load_remaining > 0.0 {
            ReadyState::HaveMetadata
        } else {
            ReadyState::HaveEnoughData
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn play(&mut self) -> ReelResult<()> {
        if self.ended() {
            self.position = 0.0;
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, secs: f64) {
        self.position = secs.clamp(0.0, self.duration);
    }

    fn advance(&mut self, dt_secs: f64) {
        let dt = dt_secs.max(0.0);
        if self.load_remaining > 0.0 {
            self.load_remaining = (self.load_remaining - dt).max(0.0);
            return;
        }
        if self.playing {
            self.position = (self.position + dt).min(self.duration);
            if self.position >= self.duration {
                self.playing = false;
            }
        }
    }

    fn current_frame(&mut self) -> ReelResult<Option<SourceFrame>> {
        if !self.ready_state().can_draw() {
            return Ok(None);
        }
        Ok(Some(self.frame.clone()))
    }

    fn mix_audio_into(&mut self, start_secs: f64, out: &mut [f32], gain: f32) {
        let Some(tone) = self.tone else {
            return;
        };
        let step = std::f64::consts::TAU * f64::from(tone.freq_hz) / f64::from(MIX_SAMPLE_RATE);
        let base = std::f64::consts::TAU * f64::from(tone.freq_hz) * start_secs;
        for (i, frame) in out.chunks_exact_mut(2).enumerate() {
            let t = start_secs + (i as f64) / f64::from(MIX_SAMPLE_RATE);
            if t >= self.duration {
                break;
            }
            let v = ((base + step * i as f64).sin() as f32) * tone.amplitude * gain;
            frame[0] += v;
            frame[1] += v;
        }
    }

    fn release(&mut self) {
        self.playing = false;
        self.frame.rgba8_premul = Arc::new(Vec::new());
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image_frame(bytes: &[u8]) -> ReelResult<SourceFrame> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(SourceFrame {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/still.rs"]
mod tests;
