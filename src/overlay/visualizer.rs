use crate::foundation::error::ReelResult;
use crate::render::composite::BlendMode;
use crate::render::draw::fill_rect;
use crate::render::frame::Surface;

/// Number of bars drawn.
pub const BAR_COUNT: usize = 48;
const MAX_HEIGHT_RATIO: f64 = 0.18;
const BAR_GAP_PX: f64 = 2.0;
const BAR_RGBA: [u8; 4] = [120, 210, 255, 200];

/// Bar heights in pixels for `spectrum` byte magnitudes on a frame of `frame_h` rows.
///
/// The spectrum is split into [`BAR_COUNT`] equal buckets and each bucket is averaged.
pub fn bar_heights(spectrum: &[u8], frame_h: u32) -> [f64; BAR_COUNT] {
    let mut out = [0.0; BAR_COUNT];
    if spectrum.is_empty() {
        return out;
    }
    let max_h = f64::from(frame_h) * MAX_HEIGHT_RATIO;
    for (i, h) in out.iter_mut().enumerate() {
        let lo = i * spectrum.len() / BAR_COUNT;
        let hi = ((i + 1) * spectrum.len() / BAR_COUNT).max(lo + 1).min(spectrum.len());
        if lo >= hi {
            continue;
        }
        let sum: u32 = spectrum[lo..hi].iter().map(|&v| u32::from(v)).sum();
        let avg = f64::from(sum) / (hi - lo) as f64;
        *h = avg / 255.0 * max_h;
    }
    out
}

/// Draw spectrum bars standing on `baseline_offset` pixels above the bottom edge.
pub fn draw_visualizer(
    surface: &mut Surface,
    spectrum: &[u8],
    baseline_offset: u32,
) -> ReelResult<()> {
    let heights = bar_heights(spectrum, surface.height());
    if heights.iter().all(|h| *h <= 0.0) {
        return Ok(());
    }
    let w = f64::from(surface.width());
    let baseline = f64::from(surface.height().saturating_sub(baseline_offset));
    let slot = w / BAR_COUNT as f64;
    let bar_w = (slot - BAR_GAP_PX).max(1.0);

    surface.draw_layer(1.0, BlendMode::Normal, |ctx| {
        for (i, h) in heights.iter().enumerate() {
            if *h <= 0.0 {
                continue;
            }
            let x0 = slot * i as f64 + (slot - bar_w) / 2.0;
            let rect = vello_cpu::kurbo::Rect::new(x0, baseline - h, x0 + bar_w, baseline);
            fill_rect(ctx, rect, BAR_RGBA);
        }
        Ok(())
    })
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/visualizer.rs"]
mod tests;
