use std::path::Path;

use crate::audio::mix::mix_pcm_into;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::ffmpeg::decode_audio_f32_stereo;
use crate::media::source::{AudioPcm, MIX_SAMPLE_RATE};

/// Music bed played under the clips, positioned on the global timeline.
#[derive(Clone, Debug)]
pub struct BackingTrack {
    pcm: AudioPcm,
    position: f64,
    playing: bool,
    volume: f32,
}

impl BackingTrack {
    /// Wrap decoded PCM; `volume` is clamped into `[0, 1]`.
    pub fn new(pcm: AudioPcm, volume: f32) -> Self {
        Self {
            pcm,
            position: 0.0,
            playing: false,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Decode an audio file through ffmpeg.
    pub fn from_path(path: &Path, volume: f32) -> ReelResult<Self> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ReelError::validation("backing track volume must be in [0, 1]"));
        }
        let pcm = decode_audio_f32_stereo(path, MIX_SAMPLE_RATE)?;
        tracing::info!(path = %path.display(), secs = pcm.duration_secs(), "backing track loaded");
        Ok(Self::new(pcm, volume))
    }

    /// Track length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.pcm.duration_secs()
    }

    /// Current position in seconds.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Return `true` while the track is playing.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Mix gain.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Move to `secs` on the global timeline, clamped at zero.
    pub fn seek(&mut self, secs: f64) {
        self.position = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    }

    /// Start or resume.
    pub fn start(&mut self) {
        self.playing = true;
    }

    /// Pause at the current position.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Mix the next `out.len() / 2` stereo frames into `out` and advance, when playing.
    pub fn mix_into(&mut self, out: &mut [f32]) {
        if !self.playing {
            return;
        }
        mix_pcm_into(out, &self.pcm, self.position, self.volume);
        self.position += (out.len() / 2) as f64 / f64::from(MIX_SAMPLE_RATE);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/backing.rs"]
mod tests;
