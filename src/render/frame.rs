use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::Fnv1a64;
use crate::render::composite::{BlendMode, blend_in_place};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**. The `premultiplied` flag is included to make this explicit
/// at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Stable content hash of the pixel data.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u64(u64::from(self.width));
        h.write_u64(u64::from(self.height));
        h.write_bytes(&self.data);
        h.finish()
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

/// A fixed-size premultiplied RGBA8 drawing target.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    canvas: Canvas,
    data: Vec<u8>,
}

impl Surface {
    /// Transparent surface of the given size.
    pub fn new(canvas: Canvas) -> ReelResult<Self> {
        canvas.validate()?;
        Ok(Self {
            canvas,
            data: vec![0u8; canvas.rgba_len()],
        })
    }

    /// Surface dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.canvas.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.canvas.height
    }

    /// Borrow the pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutably borrow the pixel bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Fill every pixel with a premultiplied color.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Replace this surface's pixels with `other`'s.
    pub fn copy_from(&mut self, other: &Surface) -> ReelResult<()> {
        if self.canvas != other.canvas {
            return Err(ReelError::render("surface size mismatch in copy_from"));
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// Composite `other` on top of this surface.
    pub fn blend_from(&mut self, other: &Surface, opacity: f32, mode: BlendMode) -> ReelResult<()> {
        if self.canvas != other.canvas {
            return Err(ReelError::render("surface size mismatch in blend_from"));
        }
        blend_in_place(&mut self.data, &other.data, opacity, mode)
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.canvas.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Draw one layer with a fresh `vello_cpu` context and composite it onto this surface.
    ///
    /// Transform, paint and opacity state live only inside the layer's context, so nothing set
    /// while drawing one layer can affect the next.
    pub fn draw_layer(
        &mut self,
        opacity: f32,
        mode: BlendMode,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> ReelResult<()>,
    ) -> ReelResult<()> {
        let layer = self.rasterize_layer(draw)?;
        blend_in_place(&mut self.data, layer.data_as_u8_slice(), opacity, mode)
    }

    /// Rasterize a layer into a standalone transparent surface of this size.
    pub fn render_layer(
        &self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> ReelResult<()>,
    ) -> ReelResult<Surface> {
        let layer = self.rasterize_layer(draw)?;
        Ok(Surface {
            canvas: self.canvas,
            data: layer.data_as_u8_slice().to_vec(),
        })
    }

    fn rasterize_layer(
        &self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> ReelResult<()>,
    ) -> ReelResult<vello_cpu::Pixmap> {
        let (w, h) = self.size_u16()?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        draw(&mut ctx)?;
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(pixmap)
    }

    fn size_u16(&self) -> ReelResult<(u16, u16)> {
        let w: u16 = self
            .canvas
            .width
            .try_into()
            .map_err(|_| ReelError::render("surface width exceeds u16"))?;
        let h: u16 = self
            .canvas
            .height
            .try_into()
            .map_err(|_| ReelError::render("surface height exceeds u16"))?;
        Ok((w, h))
    }

    /// Copy the surface into an output frame.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.data.clone(),
            premultiplied: true,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
