use crate::clips::transition::Transition;
use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::media::source::MediaSource;
use crate::project::settings::PlayerSettings;
use crate::render::composite::{BlendMode, fill_over_in_place};
use crate::render::draw::{contained_transform, draw_source_frame, ken_burns_scale};
use crate::render::filter::ColorFilter;
use crate::render::frame::Surface;

const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveTransition {
    kind: Transition,
    start_ms: f64,
}

/// Draws the active clip onto the content surface each tick and blends clip switches.
///
/// On a non-cut switch the last content frame is frozen into a ghost buffer. While the
/// transition runs the ghost and the live clip are mixed according to the transition kind. Once
/// `transition_ms` has elapsed the ghost is dropped and the live clip is drawn alone.
#[derive(Debug)]
pub struct RenderLoop {
    content: Surface,
    ghost: Option<Surface>,
    active: Option<ActiveTransition>,
    transition_ms: f64,
    ken_burns_max_scale: f64,
}

impl RenderLoop {
    /// Create a render loop for `canvas`.
    pub fn new(canvas: Canvas, transition_ms: u32, ken_burns_max_scale: f64) -> ReelResult<Self> {
        let mut content = Surface::new(canvas)?;
        content.fill(OPAQUE_BLACK);
        Ok(Self {
            content,
            ghost: None,
            active: None,
            transition_ms: f64::from(transition_ms.max(1)),
            ken_burns_max_scale,
        })
    }

    /// Create a render loop from player settings.
    pub fn from_settings(settings: &PlayerSettings) -> ReelResult<Self> {
        Self::new(
            settings.canvas,
            settings.transition_ms,
            settings.ken_burns_max_scale,
        )
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.content.canvas()
    }

    /// The most recently rendered content surface.
    pub fn content(&self) -> &Surface {
        &self.content
    }

    /// Return `true` while a transition is blending.
    pub fn transition_active(&self) -> bool {
        self.active.is_some()
    }

    /// Return `true` while a ghost frame is held.
    pub fn has_ghost(&self) -> bool {
        self.ghost.is_some()
    }

    /// Record a clip switch at `now_ms`.
    ///
    /// `Cut` drops any ghost and transition in flight. Other kinds freeze the current content
    /// frame as the ghost, replacing any earlier ghost.
    pub fn begin_clip_switch(&mut self, transition: Transition, now_ms: f64) {
        if !transition.needs_ghost() {
            self.reset();
            tracing::debug!("clip switch: cut");
            return;
        }
        match self.ghost.as_mut() {
            Some(ghost) => ghost.data_mut().copy_from_slice(self.content.data()),
            None => self.ghost = Some(self.content.clone()),
        }
        self.active = Some(ActiveTransition {
            kind: transition,
            start_ms: now_ms,
        });
        tracing::debug!(?transition, now_ms, "clip switch: ghost captured");
    }

    /// Drop ghost and transition state.
    pub fn reset(&mut self) {
        self.ghost = None;
        self.active = None;
    }

    /// Render one content frame for `media` at `now_ms`.
    ///
    /// `None` or not-ready media never fails: the ghost stands in during a transition, black
    /// otherwise.
    pub fn render_content(
        &mut self,
        media: Option<&mut dyn MediaSource>,
        filter: ColorFilter,
        now_ms: f64,
    ) -> ReelResult<&Surface> {
        self.content.fill(OPAQUE_BLACK);

        if let Some(active) = self.active {
            if now_ms - active.start_ms >= self.transition_ms {
                tracing::debug!(kind = ?active.kind, "transition finished");
                self.reset();
            }
        }

        let live = match media {
            Some(media) => self.live_layer(media, filter)?,
            None => None,
        };

        match (self.active, self.ghost.as_ref()) {
            (Some(active), Some(ghost)) => {
                let progress = ((now_ms - active.start_ms) / self.transition_ms).clamp(0.0, 1.0);
                let progress = progress as f32;
                match (active.kind, live) {
                    (_, None) => self.content.copy_from(ghost)?,
                    (Transition::FadeToBlack, Some(live)) => {
                        if progress < 0.5 {
                            self.content.copy_from(ghost)?;
                            fade_to_black(&mut self.content, 2.0 * progress);
                        } else {
                            self.content.blend_from(&live, 1.0, BlendMode::Normal)?;
                            fade_to_black(&mut self.content, 2.0 - 2.0 * progress);
                        }
                    }
                    (_, Some(live)) => {
                        self.content.blend_from(&live, 1.0, BlendMode::Normal)?;
                        self.content
                            .blend_from(ghost, 1.0 - progress, BlendMode::Normal)?;
                    }
                }
            }
            _ => {
                if let Some(live) = live {
                    self.content.blend_from(&live, 1.0, BlendMode::Normal)?;
                }
            }
        }

        Ok(&self.content)
    }

    fn live_layer(
        &self,
        media: &mut dyn MediaSource,
        filter: ColorFilter,
    ) -> ReelResult<Option<Surface>> {
        if !media.ready_state().can_draw() {
            return Ok(None);
        }
        let frame = match media.current_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(err) => {
                tracing::warn!(error = %err, "clip frame unavailable, drawing fallback");
                return Ok(None);
            }
        };

        let scale = ken_burns_scale(
            media.current_time(),
            media.duration(),
            self.ken_burns_max_scale,
        );
        let transform = contained_transform(frame.width, frame.height, self.canvas(), scale);
        let mut layer = self
            .content
            .render_layer(|ctx| draw_source_frame(ctx, &frame, transform))?;
        filter.apply_in_place(layer.data_mut());
        Ok(Some(layer))
    }
}

fn fade_to_black(surface: &mut Surface, opacity: f32) {
    fill_over_in_place(surface.data_mut(), OPAQUE_BLACK, opacity);
}

#[cfg(test)]
#[path = "../../tests/unit/render/render_loop.rs"]
mod tests;
