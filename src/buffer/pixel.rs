use std::{fmt, path::Path};

use anyhow::Context;

use crate::foundation::{
    core::{Rgba8Premul, Size},
    error::{LayerError, LayerResult},
    math::checked_byte_len,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// Memory layout of a [`PixelBuffer`].
pub enum ColorMode {
    /// Premultiplied RGBA, 4 bytes per pixel. The working format of the compositor.
    #[default]
    Rgba8Premul,
    /// Premultiplied BGRA, 4 bytes per pixel (typical presentation-surface order).
    Bgra8Premul,
    /// 8-bit luma, fully opaque.
    Gray8,
}

impl ColorMode {
    /// Bytes used by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8Premul | Self::Bgra8Premul => 4,
            Self::Gray8 => 1,
        }
    }
}

/// A caller-owned pixel surface with a fixed size and [`ColorMode`].
///
/// Rows are tightly packed, row-major, top row first.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    size: Size,
    mode: ColorMode,
    data: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("size", &self.size)
            .field("mode", &self.mode)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Allocate a zeroed buffer (transparent black, or black for [`ColorMode::Gray8`]).
    pub fn new(size: Size, mode: ColorMode) -> LayerResult<Self> {
        size.validate()?;
        let len = byte_len(size, mode)?;
        Ok(Self {
            size,
            mode,
            data: vec![0u8; len],
        })
    }

    /// Wrap existing bytes; `data` must be exactly `width * height * bytes_per_pixel` long.
    pub fn from_raw(size: Size, mode: ColorMode, data: Vec<u8>) -> LayerResult<Self> {
        size.validate()?;
        let len = byte_len(size, mode)?;
        if data.len() != len {
            return Err(LayerError::configuration(format!(
                "pixel data for {size} {mode:?} must be {len} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { size, mode, data })
    }

    /// Allocate a premultiplied RGBA buffer filled with `color`.
    pub fn filled(size: Size, color: Rgba8Premul) -> LayerResult<Self> {
        let mut buf = Self::new(size, ColorMode::Rgba8Premul)?;
        buf.fill(color);
        Ok(buf)
    }

    /// Convert a straight-alpha `image` buffer into premultiplied RGBA8.
    pub fn from_rgba_image(img: &image::RgbaImage) -> LayerResult<Self> {
        let (width, height) = img.dimensions();
        let mut data = img.as_raw().clone();
        premultiply_rgba8_in_place(&mut data);
        Self::from_raw(Size::new(width, height)?, ColorMode::Rgba8Premul, data)
    }

    /// Decode encoded image bytes (any format the `image` crate understands).
    pub fn decode(bytes: &[u8]) -> LayerResult<Self> {
        let img = image::load_from_memory(bytes).context("decode image from memory")?;
        Self::from_rgba_image(&img.to_rgba8())
    }

    /// Load and decode an image file.
    pub fn open(path: &Path) -> LayerResult<Self> {
        let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
        Self::from_rgba_image(&img.to_rgba8())
    }

    /// Straight-alpha RGBA8 copy suitable for encoding.
    pub fn to_rgba_image(&self) -> LayerResult<image::RgbaImage> {
        let mut out = Vec::with_capacity(self.size.area() as usize * 4);
        for i in 0..self.pixel_count() {
            let px = self.premul_at(i);
            out.extend_from_slice(&unpremultiply(px));
        }
        image::RgbaImage::from_raw(self.size.width, self.size.height, out)
            .ok_or_else(|| LayerError::render("rgba image size mismatch"))
    }

    /// Buffer dimensions.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Pixel layout.
    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    /// Raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw bytes; the length cannot change.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Bytes per row.
    pub fn row_bytes(&self) -> usize {
        self.size.width as usize * self.mode.bytes_per_pixel()
    }

    /// Reset every byte to zero.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Fill every pixel with `color`, encoded in this buffer's mode.
    pub fn fill(&mut self, color: Rgba8Premul) {
        let encoded = encode(color.to_array(), self.mode);
        let bpp = self.mode.bytes_per_pixel();
        for px in self.data.chunks_exact_mut(bpp) {
            px.copy_from_slice(&encoded[..bpp]);
        }
    }

    /// Premultiplied RGBA value at `(x, y)`, whatever the storage mode.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8Premul> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let [r, g, b, a] = self.premul_at(y as usize * self.size.width as usize + x as usize);
        Some(Rgba8Premul { r, g, b, a })
    }

    /// Copy of this buffer stored in `mode`.
    pub fn to_mode(&self, mode: ColorMode) -> LayerResult<PixelBuffer> {
        let mut out = PixelBuffer::new(self.size, mode)?;
        self.convert_into(&mut out)?;
        Ok(out)
    }

    /// Re-encode every pixel into `dst`, which must have the same size.
    pub fn convert_into(&self, dst: &mut PixelBuffer) -> LayerResult<()> {
        if dst.size != self.size {
            return Err(LayerError::render(format!(
                "convert_into expects equal sizes, got {} and {}",
                self.size, dst.size
            )));
        }
        if dst.mode == self.mode {
            dst.data.copy_from_slice(&self.data);
            return Ok(());
        }
        let bpp = dst.mode.bytes_per_pixel();
        let mode = dst.mode;
        for (i, out) in dst.data.chunks_exact_mut(bpp).enumerate() {
            let encoded = encode(self.premul_at(i), mode);
            out.copy_from_slice(&encoded[..bpp]);
        }
        Ok(())
    }

    /// Fail unless this buffer is premultiplied RGBA.
    pub(crate) fn expect_rgba8_premul(&self, what: &str) -> LayerResult<()> {
        if self.mode != ColorMode::Rgba8Premul {
            return Err(LayerError::render(format!(
                "{what} requires an Rgba8Premul buffer, got {:?}",
                self.mode
            )));
        }
        Ok(())
    }

    fn pixel_count(&self) -> usize {
        self.size.width as usize * self.size.height as usize
    }

    fn premul_at(&self, i: usize) -> [u8; 4] {
        match self.mode {
            ColorMode::Rgba8Premul => {
                let p = &self.data[i * 4..i * 4 + 4];
                [p[0], p[1], p[2], p[3]]
            }
            ColorMode::Bgra8Premul => {
                let p = &self.data[i * 4..i * 4 + 4];
                [p[2], p[1], p[0], p[3]]
            }
            ColorMode::Gray8 => {
                let g = self.data[i];
                [g, g, g, 255]
            }
        }
    }
}

fn byte_len(size: Size, mode: ColorMode) -> LayerResult<usize> {
    checked_byte_len(size.width, size.height, mode.bytes_per_pixel())
        .ok_or_else(|| LayerError::configuration(format!("buffer size overflow for {size}")))
}

fn encode(px: [u8; 4], mode: ColorMode) -> [u8; 4] {
    match mode {
        ColorMode::Rgba8Premul => px,
        ColorMode::Bgra8Premul => [px[2], px[1], px[0], px[3]],
        ColorMode::Gray8 => [luma(px), 0, 0, 0],
    }
}

/// Rec.601 luma of a premultiplied pixel (equivalent to compositing over black).
pub(crate) fn luma(px: [u8; 4]) -> u8 {
    let y = 299 * u32::from(px[0]) + 587 * u32::from(px[1]) + 114 * u32::from(px[2]);
    ((y + 500) / 1000) as u8
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

fn unpremultiply(px: [u8; 4]) -> [u8; 4] {
    let a = u16::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| ((u16::from(c) * 255 + a / 2) / a).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/pixel.rs"]
mod tests;
