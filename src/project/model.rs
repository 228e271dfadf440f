use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::backing::BackingTrack;
use crate::clips::registry::ClipRegistry;
use crate::clips::transition::{Transition, TransitionPlan};
use crate::foundation::core::Rgb;
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::ffmpeg::FfmpegVideoSource;
use crate::media::source::{MIX_SAMPLE_RATE, MediaSource};
use crate::media::still::StillSource;
use crate::overlay::OverlayConfig;
use crate::overlay::credits::{ClosingCredits, CreditLine};
use crate::overlay::effects::CinematicEffects;
use crate::overlay::text::{FontBook, FontPaths};
use crate::overlay::title::TitleDesign;
use crate::player::controller::PlaybackController;
use crate::project::settings::PlayerSettings;
use crate::render::filter::ColorFilter;

/// One entry of the clip list.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ClipSpec {
    /// A video file decoded with ffmpeg.
    Video {
        /// Relative path to the file.
        video: String,
        /// Display name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// A still image shown for a fixed time.
    Image {
        /// Relative path to the file.
        image: String,
        /// Display time.
        duration_secs: f64,
        /// Display name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// A solid color slate.
    Color {
        /// Slate color.
        color: Rgb,
        /// Display time.
        duration_secs: f64,
        /// Display name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl ClipSpec {
    fn display_name(&self) -> String {
        let explicit = match self {
            ClipSpec::Video { name, .. }
            | ClipSpec::Image { name, .. }
            | ClipSpec::Color { name, .. } => name.clone(),
        };
        explicit.unwrap_or_else(|| match self {
            ClipSpec::Video { video: path, .. } | ClipSpec::Image { image: path, .. } => {
                Path::new(path)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone())
            }
            ClipSpec::Color { color, .. } => {
                format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
            }
        })
    }
}

/// Music bed reference.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackingTrackSpec {
    /// Relative path to the audio file.
    pub path: String,
    /// Mix gain in `[0, 1]`.
    #[serde(default = "default_backing_volume")]
    pub volume: f32,
}

fn default_backing_volume() -> f32 {
    0.5
}

/// Suggested values from an external assistant, merged as plain configuration.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Suggestions {
    /// Per-gap transitions, positional.
    pub transitions: Option<Vec<Transition>>,
    /// Opening title.
    pub title: Option<TitleDesign>,
    /// Credit entries; enables credits when present.
    pub credits: Option<Vec<CreditLine>>,
}

impl Suggestions {
    /// Parse a suggestion document.
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        serde_json::from_str(s).map_err(|e| ReelError::serde(e.to_string()))
    }
}

/// A complete session description: clips, transitions, look, overlays and audio.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Production {
    /// Player tunables.
    #[serde(default)]
    pub settings: PlayerSettings,
    /// Clips in playback order.
    pub clips: Vec<ClipSpec>,
    /// Transition out of clip `i`, for each gap.
    #[serde(default)]
    pub transitions: Vec<Transition>,
    /// Transition for gaps without an entry.
    #[serde(default)]
    pub default_transition: Transition,
    /// Color filter for live clip draws.
    #[serde(default)]
    pub filter: ColorFilter,
    /// Opening title.
    #[serde(default)]
    pub title: Option<TitleDesign>,
    /// Closing credits.
    #[serde(default)]
    pub credits: ClosingCredits,
    /// Post effect toggles.
    #[serde(default)]
    pub effects: CinematicEffects,
    /// Spectrum bars.
    #[serde(default)]
    pub visualizer: bool,
    /// Music bed.
    #[serde(default)]
    pub backing_track: Option<BackingTrackSpec>,
    /// Font overrides.
    #[serde(default)]
    pub fonts: FontPaths,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Production {
    /// Parse and validate a production, resolving paths against the current directory.
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        let production: Production =
            serde_json::from_str(s).map_err(|e| ReelError::serde(e.to_string()))?;
        production.validate()?;
        Ok(production)
    }

    /// Read a production file; relative paths resolve against its directory.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read production '{}'", path.display()))?;
        let mut production = Self::from_json_str(&text)?;
        production.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(production)
    }

    /// Check settings, clip entries and paths.
    pub fn validate(&self) -> ReelResult<()> {
        self.settings.validate()?;
        for (i, clip) in self.clips.iter().enumerate() {
            match clip {
                ClipSpec::Video { video, .. } => {
                    normalize_rel_path(video)?;
                }
                ClipSpec::Image {
                    image,
                    duration_secs,
                    ..
                } => {
                    normalize_rel_path(image)?;
                    validate_duration(i, *duration_secs)?;
                }
                ClipSpec::Color { duration_secs, .. } => validate_duration(i, *duration_secs)?,
            }
        }
        if let Some(track) = &self.backing_track {
            normalize_rel_path(&track.path)?;
            if !(0.0..=1.0).contains(&track.volume) {
                return Err(ReelError::validation("backing track volume must be in [0, 1]"));
            }
        }
        if let Some(title) = &self.title
            && title.text.trim().is_empty()
        {
            return Err(ReelError::validation("title text must be non-empty"));
        }
        Ok(())
    }

    /// Merge assistant suggestions; absent fields leave the production unchanged.
    pub fn apply_suggestions(&mut self, suggestions: Suggestions) {
        if let Some(transitions) = suggestions.transitions {
            self.transitions = transitions;
        }
        if let Some(title) = suggestions.title {
            self.title = Some(title);
        }
        if let Some(lines) = suggestions.credits {
            self.credits = ClosingCredits {
                enabled: !lines.is_empty(),
                lines,
            };
        }
    }

    /// Absolute (or base-relative) location of a validated relative path.
    pub fn resolve(&self, rel: &str) -> ReelResult<PathBuf> {
        Ok(self.base_dir.join(normalize_rel_path(rel)?))
    }

    fn open_clip(&self, clip: &ClipSpec) -> ReelResult<Box<dyn MediaSource>> {
        let source: Box<dyn MediaSource> = match clip {
            ClipSpec::Video { video, .. } => {
                Box::new(FfmpegVideoSource::open(&self.resolve(video)?, MIX_SAMPLE_RATE)?)
            }
            ClipSpec::Image {
                image,
                duration_secs,
                ..
            } => Box::new(StillSource::from_image_path(
                &self.resolve(image)?,
                *duration_secs,
            )?),
            ClipSpec::Color {
                color,
                duration_secs,
                ..
            } => Box::new(StillSource::solid(
                self.settings.canvas.width,
                self.settings.canvas.height,
                [color.r, color.g, color.b],
                *duration_secs,
            )?),
        };
        Ok(source)
    }

    /// Open every clip into a registry.
    pub fn build_registry(&self) -> ReelResult<ClipRegistry> {
        let mut registry = ClipRegistry::new();
        for clip in &self.clips {
            let source = self.open_clip(clip)?;
            registry.add(clip.display_name(), source)?;
        }
        Ok(registry)
    }

    /// Overlay configuration derived from this production.
    pub fn overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            effects: self.effects,
            visualizer: self.visualizer,
            title: self.title.clone(),
            credits: self.credits.clone(),
        }
    }

    /// Font overrides may be absolute (system font files) or relative to the production.
    fn font_book(&self) -> FontBook {
        let resolve = |p: &Option<PathBuf>| p.as_ref().map(|p| self.base_dir.join(p));
        FontBook::new(FontPaths {
            sans_serif: resolve(&self.fonts.sans_serif),
            serif: resolve(&self.fonts.serif),
            cursive: resolve(&self.fonts.cursive),
            monospace: resolve(&self.fonts.monospace),
        })
    }

    /// Open all media and assemble a controller.
    pub fn build_controller(&self) -> ReelResult<PlaybackController> {
        let registry = self.build_registry()?;
        let plan =
            TransitionPlan::from_positional(&registry, &self.transitions, self.default_transition);
        let mut controller = PlaybackController::new(
            self.settings.clone(),
            registry,
            plan,
            self.overlay_config(),
            self.font_book(),
        )?
        .with_filter(self.filter);
        if let Some(track) = &self.backing_track {
            let backing = BackingTrack::from_path(&self.resolve(&track.path)?, track.volume)?;
            controller = controller.with_backing_track(backing);
        }
        Ok(controller)
    }
}

fn validate_duration(index: usize, secs: f64) -> ReelResult<()> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ReelError::validation(format!(
            "clip {index} duration_secs must be finite and > 0"
        )));
    }
    Ok(())
}

/// Normalize a relative media path: forward slashes, no `.` segments, no `..`, not absolute.
pub fn normalize_rel_path(source: &str) -> ReelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ReelError::validation("media paths must be relative"));
    }
    if s.is_empty() {
        return Err(ReelError::validation("media path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelError::validation("media paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelError::validation("media path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/project/model.rs"]
mod tests;
