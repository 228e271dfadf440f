//! Per-frame post effects and overlays drawn over the content surface.

/// Closing credits timing and layout.
pub mod credits;
/// Grain, vignette and letterbox.
pub mod effects;
/// Font resolution and Parley text layout.
pub mod text;
/// Opening title timing and styling.
pub mod title;
/// Spectrum bars.
pub mod visualizer;

use crate::clips::registry::ClipRole;
use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::ReelResult;
use crate::foundation::math::unit_to_u8;
use crate::overlay::credits::{ClosingCredits, CreditsLayout, credits_progress};
use crate::overlay::effects::{
    CinematicEffects, GrainTile, apply_letterbox, apply_vignette, letterbox_bar_height,
};
use crate::overlay::text::{
    FontBook, FontClass, ResolvedFont, TextBrushRgba8, TextLayoutEngine, fill_layout,
};
use crate::overlay::title::{TitleDesign, TitleTiming, title_opacity};
use crate::overlay::visualizer::draw_visualizer;
use crate::project::settings::PlayerSettings;
use crate::render::composite::{BlendMode, fill_over_in_place};
use crate::render::frame::Surface;

const SHADOW_RGBA: [u8; 4] = [0, 0, 0, 160];
const CREDIT_ROLE_RGB: [u8; 3] = [190, 190, 190];
const CREDIT_NAME_RGB: [u8; 3] = [255, 255, 255];

/// Per-frame inputs to the overlay pass.
#[derive(Clone, Copy, Debug)]
pub struct OverlayContext<'a> {
    /// Position of the active clip, `None` when no clip is active.
    pub role: Option<ClipRole>,
    /// Clip-local playback position.
    pub clip_time: f64,
    /// Active clip duration.
    pub clip_duration: f64,
    /// Whether playback is running.
    pub playing: bool,
    /// Analyser byte frequency data.
    pub spectrum: &'a [u8],
    /// Monotonic frame counter, seeds the grain offset.
    pub frame_index: u64,
}

/// What overlays to draw, as configured by the production.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayConfig {
    /// Post effect toggles.
    pub effects: CinematicEffects,
    /// Draw spectrum bars while playing.
    pub visualizer: bool,
    /// Opening title.
    pub title: Option<TitleDesign>,
    /// Closing credits.
    pub credits: ClosingCredits,
}

/// Applies grain, vignette, letterbox, visualizer, title and credits, in that order.
pub struct OverlayEngine {
    config: OverlayConfig,
    grain: GrainTile,
    grain_opacity: f32,
    letterbox_ratio: f64,
    title_timing: TitleTiming,
    credits_window_secs: f64,
    credits_dim_max: f32,
    fonts: FontBook,
    text: TextLayoutEngine,
    warned_missing_font: bool,
}

impl std::fmt::Debug for OverlayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayEngine")
            .field("config", &self.config)
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl OverlayEngine {
    /// Build an engine for `config` with timings from `settings`.
    pub fn new(config: OverlayConfig, settings: &PlayerSettings, fonts: FontBook) -> Self {
        Self {
            config,
            grain: GrainTile::new(settings.grain_seed),
            grain_opacity: settings.grain_opacity,
            letterbox_ratio: settings.letterbox_ratio,
            title_timing: TitleTiming {
                fade_in_secs: settings.title_fade_in_secs,
                fade_out_start_secs: settings.title_fade_out_start_secs,
                window_secs: settings.title_window_secs,
            },
            credits_window_secs: settings.credits_window_secs,
            credits_dim_max: settings.credits_dim_max,
            fonts,
            text: TextLayoutEngine::new(),
            warned_missing_font: false,
        }
    }

    /// Current overlay configuration.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Mutable overlay configuration; changes apply from the next frame.
    pub fn config_mut(&mut self) -> &mut OverlayConfig {
        &mut self.config
    }

    /// Draw every enabled overlay onto `surface`.
    pub fn draw(&mut self, surface: &mut Surface, cx: &OverlayContext<'_>) -> ReelResult<()> {
        let effects = self.config.effects;
        if effects.grain {
            self.grain.apply(surface, cx.frame_index, self.grain_opacity);
        }
        if effects.vignette {
            apply_vignette(surface);
        }
        let bar = if effects.letterbox {
            letterbox_bar_height(surface.height(), self.letterbox_ratio)
        } else {
            0
        };
        apply_letterbox(surface, bar);

        if self.config.visualizer && cx.playing {
            draw_visualizer(surface, cx.spectrum, bar)?;
        }

        if let Some(opacity) = self.title_opacity_for(cx) {
            self.draw_title(surface, opacity)?;
        }
        if let Some(progress) = self.credits_progress_for(cx) {
            self.draw_credits(surface, progress)?;
        }
        Ok(())
    }

    /// Title opacity for this frame, `None` when the title is not shown.
    pub fn title_opacity_for(&self, cx: &OverlayContext<'_>) -> Option<f32> {
        self.config.title.as_ref()?;
        let role = cx.role?;
        if !cx.playing || !role.is_first() {
            return None;
        }
        title_opacity(cx.clip_time, self.title_timing)
    }

    /// Credits progress for this frame, `None` when credits are not shown.
    pub fn credits_progress_for(&self, cx: &OverlayContext<'_>) -> Option<f64> {
        let role = cx.role?;
        if !cx.playing || !role.is_last() || !self.config.credits.enabled {
            return None;
        }
        credits_progress(cx.clip_duration, cx.clip_time, self.credits_window_secs)
    }

    fn font_or_warn(&mut self, class: FontClass, weight: u16) -> Option<ResolvedFont> {
        let font = self.fonts.resolve(class, weight);
        if font.is_none() && !self.warned_missing_font {
            self.warned_missing_font = true;
            tracing::warn!(?class, "no font available, text overlays are skipped");
        }
        font
    }

    fn draw_title(&mut self, surface: &mut Surface, opacity: f32) -> ReelResult<()> {
        let Some(design) = self.config.title.clone() else {
            return Ok(());
        };
        let Some(font) = self.font_or_warn(design.style.font_class(), design.style.weight()) else {
            return Ok(());
        };

        let (w, h) = (f64::from(surface.width()), f64::from(surface.height()));
        let size = design.style.size_ratio() * h as f32;
        let text = design.style.display_text(&design.text);
        let brush = TextBrushRgba8::opaque([design.color.r, design.color.g, design.color.b]);
        let layout = self
            .text
            .layout_plain(&text, &font, size, brush, Some((w * 0.9) as f32))?;

        let (x, y) = design.position.origin(
            w,
            h,
            f64::from(layout.width()),
            f64::from(layout.height()),
        );
        let shadow = h * 0.004;
        let font_data = font.font_data();
        surface.draw_layer(opacity, BlendMode::Normal, |ctx| {
            fill_layout(
                ctx,
                &layout,
                &font_data,
                Affine::translate(Vec2::new(x + shadow, y + shadow)),
                Some(SHADOW_RGBA),
            );
            fill_layout(
                ctx,
                &layout,
                &font_data,
                Affine::translate(Vec2::new(x, y)),
                None,
            );
            Ok(())
        })
    }

    fn draw_credits(&mut self, surface: &mut Surface, progress: f64) -> ReelResult<()> {
        let dim = unit_to_u8(self.credits_dim_max * progress as f32);
        fill_over_in_place(surface.data_mut(), [0, 0, 0, 255], f32::from(dim) / 255.0);

        let lines = self.config.credits.lines.clone();
        if lines.is_empty() {
            return Ok(());
        }
        let Some(font) = self.font_or_warn(FontClass::SansSerif, 400) else {
            return Ok(());
        };

        let (w, h) = (f64::from(surface.width()), f64::from(surface.height()));
        let placement = CreditsLayout::new(h, lines.len());
        let role_size = (h * 0.035) as f32;
        let name_size = (h * 0.05) as f32;
        let font_data = font.font_data();

        for (i, line) in lines.iter().enumerate() {
            let at = placement.place(i, progress);
            if at.opacity <= 0.0 || at.y >= h {
                continue;
            }
            let role = self.text.layout_plain(
                &line.role,
                &font,
                role_size,
                TextBrushRgba8::opaque(CREDIT_ROLE_RGB),
                None,
            )?;
            let name = self.text.layout_plain(
                &line.name,
                &font,
                name_size,
                TextBrushRgba8::opaque(CREDIT_NAME_RGB),
                None,
            )?;
            let role_x = (w - f64::from(role.width())) / 2.0;
            let name_x = (w - f64::from(name.width())) / 2.0;
            let name_y = at.y + f64::from(role.height());

            surface.draw_layer(at.opacity, BlendMode::Normal, |ctx| {
                fill_layout(
                    ctx,
                    &role,
                    &font_data,
                    Affine::translate(Vec2::new(role_x, at.y)),
                    None,
                );
                fill_layout(
                    ctx,
                    &name,
                    &font_data,
                    Affine::translate(Vec2::new(name_x, name_y)),
                    None,
                );
                Ok(())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/engine.rs"]
mod tests;
