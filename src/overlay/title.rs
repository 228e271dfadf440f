use crate::foundation::core::Rgb;
use crate::overlay::text::FontClass;

/// Typographic treatment of the opening title.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitleStyle {
    /// Clean sans-serif.
    #[default]
    Modern,
    /// Serif.
    Classic,
    /// Script face.
    Handwritten,
    /// Heavy sans-serif.
    Bold,
    /// Upper-case monospace.
    Scifi,
}

impl TitleStyle {
    pub(crate) fn font_class(self) -> FontClass {
        match self {
            TitleStyle::Modern | TitleStyle::Bold => FontClass::SansSerif,
            TitleStyle::Classic => FontClass::Serif,
            TitleStyle::Handwritten => FontClass::Cursive,
            TitleStyle::Scifi => FontClass::Monospace,
        }
    }

    pub(crate) fn weight(self) -> u16 {
        match self {
            TitleStyle::Bold => 700,
            _ => 400,
        }
    }

    /// Font size as a fraction of frame height.
    pub(crate) fn size_ratio(self) -> f32 {
        match self {
            TitleStyle::Modern | TitleStyle::Classic => 0.08,
            TitleStyle::Handwritten | TitleStyle::Bold => 0.09,
            TitleStyle::Scifi => 0.07,
        }
    }

    pub(crate) fn display_text(self, text: &str) -> String {
        match self {
            TitleStyle::Scifi => text.to_uppercase(),
            _ => text.to_string(),
        }
    }
}

/// Where the title block sits in the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitlePosition {
    /// Centered both ways.
    #[default]
    Center,
    /// Bottom edge, left aligned.
    BottomLeft,
    /// Bottom edge, centered.
    BottomCenter,
}

impl TitlePosition {
    /// Top-left origin of a `text_w`×`text_h` block in a `frame_w`×`frame_h` frame.
    pub(crate) fn origin(self, frame_w: f64, frame_h: f64, text_w: f64, text_h: f64) -> (f64, f64) {
        let margin = frame_h * 0.08;
        match self {
            TitlePosition::Center => ((frame_w - text_w) / 2.0, (frame_h - text_h) / 2.0),
            TitlePosition::BottomLeft => (margin, frame_h - margin - text_h),
            TitlePosition::BottomCenter => ((frame_w - text_w) / 2.0, frame_h - margin - text_h),
        }
    }
}

fn default_title_color() -> Rgb {
    Rgb::WHITE
}

/// Opening title shown over the first clip.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TitleDesign {
    /// Title text.
    pub text: String,
    /// Typographic style.
    #[serde(default)]
    pub style: TitleStyle,
    /// Placement.
    #[serde(default)]
    pub position: TitlePosition,
    /// Fill color.
    #[serde(default = "default_title_color")]
    pub color: Rgb,
}

/// Fade envelope of the title, in clip-local seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TitleTiming {
    /// Fade-in length.
    pub fade_in_secs: f64,
    /// When the fade-out starts.
    pub fade_out_start_secs: f64,
    /// When the title disappears.
    pub window_secs: f64,
}

impl Default for TitleTiming {
    fn default() -> Self {
        Self {
            fade_in_secs: 1.0,
            fade_out_start_secs: 3.0,
            window_secs: 4.0,
        }
    }
}

/// Title opacity at clip-local time `t`, or `None` once the window has closed.
pub fn title_opacity(t: f64, timing: TitleTiming) -> Option<f32> {
    if !t.is_finite() || t < 0.0 || t >= timing.window_secs {
        return None;
    }
    let opacity = if t < timing.fade_in_secs {
        t / timing.fade_in_secs
    } else if t < timing.fade_out_start_secs {
        1.0
    } else {
        (timing.window_secs - t) / (timing.window_secs - timing.fade_out_start_secs)
    };
    Some(opacity.clamp(0.0, 1.0) as f32)
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/title.rs"]
mod tests;
