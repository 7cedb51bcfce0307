use image::RgbaImage;
use thiserror::Error;

use crate::color::{Color, HitboxColor, TRANSPARENT};
use crate::geometry::{BoundingBox, Vec2};
use crate::raster::{self, ScreenRectPx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("hit surface of {width}x{height} pixels cannot be allocated")]
    TooLarge { width: u32, height: u32 },
}

/// Offscreen RGBA buffer used purely as a spatial index. Never presented.
#[derive(Debug, Clone)]
pub struct HitSurface {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl HitSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let len = buffer_len(width, height)?;
        Ok(Self {
            width,
            height,
            rgba: vec![0; len],
        })
    }

    /// Reallocates for the new size; contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        let len = buffer_len(width, height)?;
        self.width = width;
        self.height = height;
        self.rgba.clear();
        self.rgba.resize(len, 0);
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn clear(&mut self) {
        raster::clear(&mut self.rgba, TRANSPARENT.to_rgba());
    }

    /// Color under `point`; transparent outside the surface.
    pub fn pixel(&self, point: Vec2) -> Color {
        point
            .to_pixel()
            .and_then(|(x, y)| raster::read_pixel(&self.rgba, self.width, self.height, x, y))
            .unwrap_or(TRANSPARENT)
    }

    pub fn fill_box(&mut self, bbox: &BoundingBox, color: HitboxColor) {
        raster::fill_rect(
            &mut self.rgba,
            self.width,
            self.height,
            ScreenRectPx::covering(bbox),
            color.to_rgba(),
        );
    }

    pub fn draw_image(&mut self, top_left: Vec2, image: &RgbaImage) {
        raster::blit_masked(
            &mut self.rgba,
            self.width,
            self.height,
            top_left.x.floor() as i32,
            top_left.y.floor() as i32,
            image,
        );
    }
}

fn buffer_len(width: u32, height: u32) -> Result<usize, SurfaceError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(4))
        .filter(|len| isize::try_from(*len).is_ok())
        .ok_or(SurfaceError::TooLarge { width, height })
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn later_fills_overwrite_earlier_ones() {
        let mut surface = HitSurface::new(100, 100).expect("surface");
        let outer = HitboxColor::rgb(1, 1, 1);
        let inner = HitboxColor::rgb(2, 2, 2);
        surface.fill_box(&BoundingBox::from_rect(0.0, 0.0, 100.0, 100.0), outer);
        surface.fill_box(&BoundingBox::from_rect(25.0, 25.0, 50.0, 50.0), inner);

        assert!(inner.matches(surface.pixel(Vec2::new(50.0, 50.0))));
        assert!(outer.matches(surface.pixel(Vec2::new(5.0, 5.0))));
    }

    #[test]
    fn pixel_outside_surface_is_transparent() {
        let mut surface = HitSurface::new(4, 4).expect("surface");
        surface.fill_box(&BoundingBox::from_rect(0.0, 0.0, 4.0, 4.0), HitboxColor::rgb(9, 9, 9));
        assert_eq!(surface.pixel(Vec2::new(4.0, 0.0)), TRANSPARENT);
        assert_eq!(surface.pixel(Vec2::new(-1.0, 0.0)), TRANSPARENT);
    }

    #[test]
    fn clear_resets_every_pixel() {
        let mut surface = HitSurface::new(3, 3).expect("surface");
        surface.fill_box(&BoundingBox::from_rect(0.0, 0.0, 3.0, 3.0), HitboxColor::rgb(5, 5, 5));
        surface.clear();
        assert!(surface.as_rgba().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn resize_tracks_new_dimensions() {
        let mut surface = HitSurface::new(2, 2).expect("surface");
        surface.resize(8, 3).expect("resize");
        assert_eq!((surface.width(), surface.height()), (8, 3));
        assert_eq!(surface.as_rgba().len(), 8 * 3 * 4);
    }

    #[test]
    fn zero_sized_surface_is_valid_and_empty() {
        let surface = HitSurface::new(0, 0).expect("surface");
        assert_eq!(surface.pixel(Vec2::new(0.0, 0.0)), TRANSPARENT);
    }

    #[test]
    fn draw_image_stamps_only_opaque_mask() {
        let mut surface = HitSurface::new(4, 4).expect("surface");
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(1, 1, Rgba([3, 4, 5, 255]));
        surface.draw_image(Vec2::new(1.0, 1.0), &image);
        assert_eq!(surface.pixel(Vec2::new(2.0, 2.0)), Color::rgba(3, 4, 5, 255));
        assert_eq!(surface.pixel(Vec2::new(1.0, 1.0)), TRANSPARENT);
    }
}
