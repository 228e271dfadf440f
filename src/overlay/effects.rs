use rayon::prelude::*;

use crate::foundation::math::hash2;
use crate::render::composite::{over, overlay};
use crate::render::frame::Surface;

/// Side length of the square grain texture.
pub const GRAIN_TILE: usize = 128;

const VIGNETTE_INNER_RATIO: f64 = 0.3;
const VIGNETTE_OUTER_RATIO: f64 = 0.7;
const VIGNETTE_MAX_ALPHA: f64 = 0.6;

/// Post effects applied to every frame, each toggled independently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CinematicEffects {
    /// Animated film grain.
    pub grain: bool,
    /// Radial edge darkening.
    pub vignette: bool,
    /// Black bars at top and bottom.
    pub letterbox: bool,
}

/// Deterministic monochrome noise texture.
#[derive(Clone, Debug)]
pub struct GrainTile {
    seed: u64,
    luma: Vec<u8>,
}

impl GrainTile {
    /// Generate the tile for `seed`.
    pub fn new(seed: u64) -> Self {
        let luma = (0..GRAIN_TILE * GRAIN_TILE)
            .map(|i| (hash2(seed, i as u64) >> 56) as u8)
            .collect();
        Self { seed, luma }
    }

    /// Tile offset used for `frame_index`.
    pub fn offset(&self, frame_index: u64) -> (usize, usize) {
        let h = hash2(self.seed ^ 0x6772_6169_6e00, frame_index);
        (
            (h as usize) % GRAIN_TILE,
            ((h >> 32) as usize) % GRAIN_TILE,
        )
    }

    /// Overlay-blend the tile, shifted for `frame_index`, across `surface`.
    pub fn apply(&self, surface: &mut Surface, frame_index: u64, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let (ox, oy) = self.offset(frame_index);
        let width = surface.width() as usize;
        surface
            .data_mut()
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let ty = (y + oy) % GRAIN_TILE;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let v = self.luma[ty * GRAIN_TILE + (x + ox) % GRAIN_TILE];
                    let out = overlay([px[0], px[1], px[2], px[3]], [v, v, v, 255], opacity);
                    px.copy_from_slice(&out);
                }
            });
    }
}

/// Darken toward the edges with a radial ramp.
///
/// Fully transparent inside `0.3·H` of the center, reaching alpha 0.6 black at `0.7·W`.
pub fn apply_vignette(surface: &mut Surface) {
    let (w, h) = (f64::from(surface.width()), f64::from(surface.height()));
    let inner = VIGNETTE_INNER_RATIO * h;
    let outer = (VIGNETTE_OUTER_RATIO * w).max(inner + 1.0);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let width = surface.width() as usize;

    surface
        .data_mut()
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let dy = y as f64 + 0.5 - cy;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let dx = x as f64 + 0.5 - cx;
                let t = (((dx * dx + dy * dy).sqrt() - inner) / (outer - inner)).clamp(0.0, 1.0);
                let alpha = (t * VIGNETTE_MAX_ALPHA) as f32;
                if alpha > 0.0 {
                    let out = over([px[0], px[1], px[2], px[3]], [0, 0, 0, 255], alpha);
                    px.copy_from_slice(&out);
                }
            }
        });
}

/// Height of each letterbox bar in pixels.
pub fn letterbox_bar_height(frame_height: u32, ratio: f64) -> u32 {
    ((f64::from(frame_height) * ratio.clamp(0.0, 0.5)).round() as u32).min(frame_height / 2)
}

/// Paint opaque black bars over the top and bottom `bar` rows.
pub fn apply_letterbox(surface: &mut Surface, bar: u32) {
    if bar == 0 {
        return;
    }
    let h = surface.height();
    let row_bytes = surface.width() as usize * 4;
    let data = surface.data_mut();
    for y in (0..bar).chain(h.saturating_sub(bar)..h) {
        let start = y as usize * row_bytes;
        for px in data[start..start + row_bytes].chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 255]);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/effects.rs"]
mod tests;
