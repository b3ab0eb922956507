use crate::core::geo::Point;
use crate::{MapError, Result};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Output a draw context blits its active buffer into.
///
/// The surface's coordinate system has its origin in the middle of the
/// view. A source pixel `s` of the blitted image lands on
/// `origin + scale * (offset + s)`.
pub trait Surface {
    fn blit(&mut self, image: &RgbaImage, scale: Point, offset: Point);
}

/// CPU raster surface backed by an `image` buffer
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    origin: Point,
}

impl RasterSurface {
    /// Creates a transparent surface whose origin is its center
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            origin: Point::new(width as f64 / 2.0, height as f64 / 2.0),
        }
    }

    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.image.width() && y < self.image.height() {
            Some(*self.image.get_pixel(x, y))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Writes the surface as PNG
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image
            .save_with_format(path.as_ref(), image::ImageFormat::Png)
            .map_err(|e| MapError::Render(format!("{}: {}", path.as_ref().display(), e)))
    }

    /// Destination pixel range covered by `extent` source pixels
    fn span(origin: f64, scale: f64, offset: f64, extent: u32, limit: u32) -> (u32, u32) {
        let a = origin + scale * offset;
        let b = origin + scale * (offset + extent as f64);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo = lo.floor().max(0.0).min(limit as f64) as u32;
        let hi = hi.ceil().max(0.0).min(limit as f64) as u32;
        (lo, hi)
    }
}

/// Source-over compositing with straight alpha
fn blend(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    let sa = src[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        *dst = *src;
        return;
    }
    let da = dst[3] as u32 * (255 - sa) / 255;
    let out_a = sa + da;
    for c in 0..3 {
        dst[c] = ((src[c] as u32 * sa + dst[c] as u32 * da) / out_a) as u8;
    }
    dst[3] = out_a as u8;
}

impl Surface for RasterSurface {
    fn blit(&mut self, image: &RgbaImage, scale: Point, offset: Point) {
        if scale.x == 0.0 || scale.y == 0.0 || !scale.is_finite() || !offset.is_finite() {
            return;
        }
        let (width, height) = image.dimensions();
        let (x0, x1) = Self::span(self.origin.x, scale.x, offset.x, width, self.image.width());
        let (y0, y1) = Self::span(self.origin.y, scale.y, offset.y, height, self.image.height());

        for dy in y0..y1 {
            let sy = ((dy as f64 + 0.5 - self.origin.y) / scale.y - offset.y).floor();
            if sy < 0.0 || sy >= height as f64 {
                continue;
            }
            for dx in x0..x1 {
                let sx = ((dx as f64 + 0.5 - self.origin.x) / scale.x - offset.x).floor();
                if sx < 0.0 || sx >= width as f64 {
                    continue;
                }
                let src = image.get_pixel(sx as u32, sy as u32);
                blend(self.image.get_pixel_mut(dx, dy), src);
            }
        }
    }
}
