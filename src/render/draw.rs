use std::sync::Arc;

use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::media::source::SourceFrame;

/// Ken Burns zoom factor for a clip at `current_secs` of `duration_secs`.
///
/// Grows linearly from `1.0` at the clip start to `max_scale` at its end, clamped outside.
pub fn ken_burns_scale(current_secs: f64, duration_secs: f64, max_scale: f64) -> f64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 1.0;
    }
    let progress = (current_secs / duration_secs).clamp(0.0, 1.0);
    1.0 + (max_scale.max(1.0) - 1.0) * progress
}

/// Transform placing a `src_w`×`src_h` image "contained" in `canvas`, zoomed by `scale` about
/// the canvas center.
///
/// At `scale == 1` the image fits entirely with letterbox/pillarbox bars and is never cropped.
pub fn contained_transform(src_w: u32, src_h: u32, canvas: Canvas, scale: f64) -> Affine {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let (sw, sh) = (f64::from(src_w.max(1)), f64::from(src_h.max(1)));
    let fit = (cw / sw).min(ch / sh) * scale;
    let (dw, dh) = (sw * fit, sh * fit);
    Affine::translate(Vec2::new((cw - dw) / 2.0, (ch - dh) / 2.0)) * Affine::scale(fit)
}

/// Fill the image rectangle of `frame` using `transform`.
pub(crate) fn draw_source_frame(
    ctx: &mut vello_cpu::RenderContext,
    frame: &SourceFrame,
    transform: Affine,
) -> ReelResult<()> {
    let paint = image_paint(frame)?;
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(frame.width),
        f64::from(frame.height),
    ));
    Ok(())
}

/// Fill `rect` in canvas space with a straight-alpha color.
pub(crate) fn fill_rect(
    ctx: &mut vello_cpu::RenderContext,
    rect: vello_cpu::kurbo::Rect,
    rgba: [u8; 4],
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        rgba[0], rgba[1], rgba[2], rgba[3],
    ));
    ctx.fill_rect(&rect);
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_paint(frame: &SourceFrame) -> ReelResult<vello_cpu::Image> {
    let pixmap = premul_bytes_to_pixmap(frame.rgba8_premul.as_slice(), frame.width, frame.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::render("source frame byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/draw.rs"]
mod tests;
