use rayon::prelude::*;

/// Color grade applied to live clip draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorFilter {
    /// No grading.
    #[default]
    None,
    /// Luma-only.
    Grayscale,
    /// Warm brown monochrome.
    Sepia,
    /// Lifted reds, lowered blues.
    Warm,
    /// Lifted blues, lowered reds.
    Cool,
    /// Faded, slightly warm.
    Vintage,
    /// Boosted saturation.
    Vivid,
}

type Matrix = [[f32; 3]; 3];

fn saturate(s: f32) -> Matrix {
    let lr = 0.2126 * (1.0 - s);
    let lg = 0.7152 * (1.0 - s);
    let lb = 0.0722 * (1.0 - s);
    [
        [lr + s, lg, lb],
        [lr, lg + s, lb],
        [lr, lg, lb + s],
    ]
}

impl ColorFilter {
    fn matrix(self) -> Option<Matrix> {
        match self {
            ColorFilter::None => None,
            ColorFilter::Grayscale => Some(saturate(0.0)),
            ColorFilter::Sepia => Some([
                [0.393, 0.769, 0.189],
                [0.349, 0.686, 0.168],
                [0.272, 0.534, 0.131],
            ]),
            ColorFilter::Warm => Some([[1.10, 0.0, 0.0], [0.0, 1.02, 0.0], [0.0, 0.0, 0.88]]),
            ColorFilter::Cool => Some([[0.90, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.12]]),
            ColorFilter::Vintage => Some([
                [0.75, 0.20, 0.05],
                [0.10, 0.75, 0.05],
                [0.10, 0.15, 0.60],
            ]),
            ColorFilter::Vivid => Some(saturate(1.4)),
        }
    }

    /// Apply the filter in place to premultiplied RGBA8 pixels.
    ///
    /// Matrices are linear without offsets, so they apply to premultiplied values directly;
    /// results are clamped to the pixel's alpha.
    pub fn apply_in_place(self, rgba8_premul: &mut [u8]) {
        let Some(m) = self.matrix() else {
            return;
        };
        rgba8_premul.par_chunks_mut(4 * 1024).for_each(|chunk| {
            for px in chunk.chunks_exact_mut(4) {
                let (r, g, b) = (f32::from(px[0]), f32::from(px[1]), f32::from(px[2]));
                let a = f32::from(px[3]);
                for (c, row) in m.iter().enumerate() {
                    let v = row[0] * r + row[1] * g + row[2] * b;
                    px[c] = v.round().clamp(0.0, a) as u8;
                }
            }
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/filter.rs"]
mod tests;
