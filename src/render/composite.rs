use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;

/// One premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// How a layer is combined with the pixels below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// Multiply dark backdrop regions, screen light ones (contrast-preserving texture blend).
    Overlay,
}

/// Source-over `src` onto `dst` with `opacity` scaling the source.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Overlay-blend `src` onto `dst` at `opacity`.
pub fn overlay(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }
    if dst[3] == 0 {
        return over(dst, src, opacity);
    }

    let sa = f32::from(src[3]) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let a = sa * opacity;

    let mut out = dst;
    for i in 0..3 {
        let b = (f32::from(dst[i]) / 255.0) / da;
        let s = (f32::from(src[i]) / 255.0) / sa;
        let blended = if b < 0.5 {
            2.0 * b * s
        } else {
            1.0 - 2.0 * (1.0 - b) * (1.0 - s)
        };
        let mixed = b * (1.0 - a) + blended.clamp(0.0, 1.0) * a;
        out[i] = ((mixed * da * 255.0).round() as i32).clamp(0, 255) as u8;
    }
    out
}

/// Blend `src` onto `dst` pixel by pixel; both buffers must have the same length.
pub fn blend_in_place(dst: &mut [u8], src: &[u8], opacity: f32, mode: BlendMode) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::render(
            "blend_in_place expects equal-length rgba8 buffers",
        ));
    }
    let f = match mode {
        BlendMode::Normal => over,
        BlendMode::Overlay => overlay,
    };
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = f([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Composite a single solid premultiplied color over every pixel of `dst`.
pub fn fill_over_in_place(dst: &mut [u8], color: PremulRgba8, opacity: f32) {
    if opacity <= 0.0 {
        return;
    }
    for d in dst.chunks_exact_mut(4) {
        let out = over([d[0], d[1], d[2], d[3]], color, opacity);
        d.copy_from_slice(&out);
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
