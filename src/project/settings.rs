use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::source::MIX_SAMPLE_RATE;
use crate::player::state::AutoplayPolicy;

/// Tunables for rendering, overlays, capture and audio.
///
/// Every field has a default so production documents only need to name what they change.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerSettings {
    /// Output surface size.
    pub canvas: Canvas,
    /// Length of dissolve and fade-to-black transitions.
    pub transition_ms: u32,
    /// Ken Burns zoom reached at the end of each clip.
    pub ken_burns_max_scale: f64,
    /// Title overlay lifetime from clip start.
    pub title_window_secs: f64,
    /// Title fade-in length.
    pub title_fade_in_secs: f64,
    /// Clip time at which the title starts fading out.
    pub title_fade_out_start_secs: f64,
    /// Credits run during this many final seconds of the last clip.
    pub credits_window_secs: f64,
    /// Background dim alpha reached at the end of the credits.
    pub credits_dim_max: f32,
    /// Film grain layer opacity.
    pub grain_opacity: f32,
    /// Letterbox bar height as a fraction of the frame height.
    pub letterbox_ratio: f64,
    /// Capture frame rate.
    pub capture_fps: u32,
    /// Target video bitrate in bits per second.
    pub video_bitrate: u64,
    /// Audio sample rate for mixing and capture.
    pub sample_rate: u32,
    /// Whether audio may start without a user gesture.
    pub autoplay: AutoplayPolicy,
    /// File name recordings are saved under.
    pub export_file_name: String,
    /// Seed for the grain texture and its per-frame offsets.
    pub grain_seed: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas::HD,
            transition_ms: 1000,
            ken_burns_max_scale: 1.08,
            title_window_secs: 4.0,
            title_fade_in_secs: 1.0,
            title_fade_out_start_secs: 3.0,
            credits_window_secs: 5.0,
            credits_dim_max: 0.8,
            grain_opacity: 0.08,
            letterbox_ratio: 0.12,
            capture_fps: 30,
            video_bitrate: 8_000_000,
            sample_rate: 48_000,
            autoplay: AutoplayPolicy::Allowed,
            export_file_name: "reelcast-export.webm".to_string(),
            grain_seed: 0x5eed,
        }
    }
}

impl PlayerSettings {
    /// Check ranges that would otherwise produce degenerate output.
    pub fn validate(&self) -> ReelResult<()> {
        self.canvas.validate()?;
        if self.transition_ms == 0 {
            return Err(ReelError::validation("transition_ms must be > 0"));
        }
        if !self.ken_burns_max_scale.is_finite() || self.ken_burns_max_scale < 1.0 {
            return Err(ReelError::validation(
                "ken_burns_max_scale must be finite and >= 1",
            ));
        }
        let title_ok = self.title_fade_in_secs >= 0.0
            && self.title_fade_in_secs <= self.title_fade_out_start_secs
            && self.title_fade_out_start_secs <= self.title_window_secs;
        if !title_ok {
            return Err(ReelError::validation(
                "title timing must satisfy 0 <= fade_in <= fade_out_start <= window",
            ));
        }
        if !(self.credits_window_secs.is_finite() && self.credits_window_secs > 0.0) {
            return Err(ReelError::validation("credits_window_secs must be > 0"));
        }
        if !(0.0..=0.5).contains(&self.letterbox_ratio) {
            return Err(ReelError::validation("letterbox_ratio must be in [0, 0.5]"));
        }
        if self.sample_rate != MIX_SAMPLE_RATE {
            return Err(ReelError::validation(format!(
                "sample_rate must be {MIX_SAMPLE_RATE} (the mixing rate)"
            )));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(ReelError::validation("export_file_name must be non-empty"));
        }
        self.capture_fps()?;
        Ok(())
    }

    /// Capture frame rate as an [`Fps`].
    pub fn capture_fps(&self) -> ReelResult<Fps> {
        Fps::new(self.capture_fps, 1)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/settings.rs"]
mod tests;
