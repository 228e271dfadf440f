use crate::foundation::math::ease_out_cubic;

/// One credit entry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreditLine {
    /// Role label, e.g. "Editor".
    pub role: String,
    /// Credited name.
    pub name: String,
}

/// Credits rolled over the end of the last clip.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClosingCredits {
    /// Whether credits are shown at all.
    pub enabled: bool,
    /// Entries in display order.
    pub lines: Vec<CreditLine>,
}

/// Credits progress in `[0, 1]` for a clip at `current` of `duration`, or `None` outside the
/// final `window_secs`.
pub fn credits_progress(duration: f64, current: f64, window_secs: f64) -> Option<f64> {
    let remaining = duration - current;
    if !remaining.is_finite() || window_secs <= 0.0 || remaining >= window_secs {
        return None;
    }
    Some(((window_secs - remaining) / window_secs).clamp(0.0, 1.0))
}

/// Where the scroll settles, as a fraction of progress.
const SETTLE_AT: f64 = 0.8;
/// Extra travel per line so later lines arrive after earlier ones.
const STAGGER: f64 = 0.25;

/// Placement of one credit line in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CreditPlacement {
    /// Top of the line's block.
    pub(crate) y: f64,
    pub(crate) opacity: f32,
}

/// Vertical layout of the credit block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CreditsLayout {
    pub(crate) frame_h: f64,
    pub(crate) line_h: f64,
    pub(crate) count: usize,
}

impl CreditsLayout {
    pub(crate) fn new(frame_h: f64, count: usize) -> Self {
        Self {
            frame_h,
            line_h: frame_h * 0.11,
            count,
        }
    }

    /// Resting top of line `i` in the centered block.
    pub(crate) fn rest_y(&self, i: usize) -> f64 {
        let block = self.line_h * self.count as f64;
        (self.frame_h - block) / 2.0 + self.line_h * i as f64
    }

    /// Placement of line `i` at `progress`.
    ///
    /// Lines start below the frame and ease toward their resting position; each line's opacity
    /// rises as it closes the last half frame of distance.
    pub(crate) fn place(&self, i: usize, progress: f64) -> CreditPlacement {
        let settle = ease_out_cubic(progress / SETTLE_AT);
        let rest = self.rest_y(i);
        let travel = (self.frame_h - rest) * (1.0 + STAGGER * i as f64);
        let y = rest + travel * (1.0 - settle);
        let distance = y - rest;
        let opacity = (1.0 - distance / (self.frame_h * 0.5)).clamp(0.0, 1.0) as f32;
        CreditPlacement { y, opacity }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/credits.rs"]
mod tests;
