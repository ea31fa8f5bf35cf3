use crate::foundation::core::{Affine, Point, Rect, Rgba8Premul};
use crate::foundation::error::{MontageError, MontageResult};
use crate::render::composite;

/// Pixel layout of a [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PixelFormat {
    /// 8-bit RGBA, color channels premultiplied by alpha.
    Rgba8Premul,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8Premul => 4,
        }
    }
}

/// Owned premultiplied RGBA8 pixel buffer, row-major with `stride = width * 4`.
#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Transparent surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * 4;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Wrap an existing premultiplied buffer.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> MontageResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| MontageError::validation("surface size overflow"))?;
        if data.len() != expected {
            return Err(MontageError::validation(format!(
                "surface {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert a straight-alpha image into a premultiplied surface.
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for px in img.pixels() {
            let [r, g, b, a] = px.0;
            data.extend_from_slice(&Rgba8Premul::from_straight_rgba(r, g, b, a).to_array());
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Raw premultiplied bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw premultiplied bytes.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume into the raw byte buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Fill every pixel with `colour`.
    pub fn clear(&mut self, colour: Rgba8Premul) {
        let px = colour.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize) * self.stride() + (x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Fill `rect` (user space) mapped through `transform`, sampling at pixel centers.
    pub fn fill_rect(&mut self, rect: Rect, transform: Affine, colour: Rgba8Premul) {
        if colour.a == 0 {
            return;
        }
        let src = colour.to_array();
        self.for_each_covered(transform.transform_rect_bbox(rect), transform, |d, p| {
            if rect.contains(p) {
                let out = composite::over([d[0], d[1], d[2], d[3]], src, 1.0);
                d.copy_from_slice(&out);
            }
        });
    }

    /// Draw `src` with its top-left corner at the user-space origin, mapped through `transform`.
    ///
    /// Nearest-neighbour sampling; `opacity` scales the source.
    pub fn draw_surface(&mut self, src: &Surface, transform: Affine, opacity: f32) {
        let bounds = Rect::new(0.0, 0.0, f64::from(src.width), f64::from(src.height));
        self.for_each_covered(transform.transform_rect_bbox(bounds), transform, |d, p| {
            if !bounds.contains(p) {
                return;
            }
            if let Some(s) = src.pixel(p.x as u32, p.y as u32) {
                let out = composite::over([d[0], d[1], d[2], d[3]], s, opacity);
                d.copy_from_slice(&out);
            }
        });
    }

    /// Composite a same-sized surface over this one.
    pub fn composite_over(&mut self, src: &Surface, opacity: f32) -> MontageResult<()> {
        if src.width != self.width || src.height != self.height {
            return Err(MontageError::validation(format!(
                "cannot composite {}x{} onto {}x{}",
                src.width, src.height, self.width, self.height
            )));
        }
        composite::over_in_place(&mut self.data, &src.data, opacity)
    }

    /// Visit every device pixel inside `bbox` with its center mapped back to user space.
    fn for_each_covered(
        &mut self,
        bbox: Rect,
        transform: Affine,
        mut visit: impl FnMut(&mut [u8], Point),
    ) {
        if transform.determinant().abs() < 1e-12 {
            return;
        }
        let inv = transform.inverse();
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let x0 = bbox.x0.floor().clamp(0.0, w) as usize;
        let x1 = bbox.x1.ceil().clamp(0.0, w) as usize;
        let y0 = bbox.y0.floor().clamp(0.0, h) as usize;
        let y1 = bbox.y1.ceil().clamp(0.0, h) as usize;
        let stride = self.stride();
        for y in y0..y1 {
            let row = &mut self.data[y * stride..(y + 1) * stride];
            for x in x0..x1 {
                let p = inv * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                visit(&mut row[x * 4..x * 4 + 4], p);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
