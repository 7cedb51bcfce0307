use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::color::Color;
use crate::geometry::{BoundingBox, Vec2};
use crate::interaction::InteractionManager;
use crate::raster::{self, ScreenRectPx};
use crate::sprite::SpriteImage;

/// Mutable view over one RGBA8 frame.
pub struct Frame<'a> {
    rgba: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    pub fn new(rgba: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        raster::clear(self.rgba, color.to_rgba());
    }

    pub fn fill_box(&mut self, bbox: &BoundingBox, color: Color) {
        raster::fill_rect(
            self.rgba,
            self.width,
            self.height,
            ScreenRectPx::covering(bbox),
            color.to_rgba(),
        );
    }

    pub fn stroke_box(&mut self, bbox: &BoundingBox, color: Color) {
        raster::stroke_rect(
            self.rgba,
            self.width,
            self.height,
            ScreenRectPx::covering(bbox),
            color.to_rgba(),
        );
    }

    pub fn draw_sprite(&mut self, sprite: &SpriteImage, top_left: Vec2) {
        raster::blit_masked(
            self.rgba,
            self.width,
            self.height,
            top_left.x.round() as i32,
            top_left.y.round() as i32,
            sprite.pixels(),
        );
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        raster::read_pixel(self.rgba, self.width, self.height, x, y)
    }

    pub fn as_rgba_mut(&mut self) -> &mut [u8] {
        self.rgba
    }
}

/// Owns the window's pixel buffer plus a scratch buffer for the hit overlay.
pub(crate) struct Presenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
    overlay_scratch: Vec<u8>,
}

impl Presenter {
    pub(crate) fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
            overlay_scratch: Vec::new(),
        })
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn frame(&mut self) -> Frame<'_> {
        Frame::new(self.pixels.frame_mut(), self.width, self.height)
    }

    /// Paints the identity-color index into scratch and blends it over the frame.
    pub(crate) fn draw_hit_overlay(&mut self, interaction: &mut InteractionManager, alpha: u8) {
        let len = self.width as usize * self.height as usize * 4;
        self.overlay_scratch.clear();
        self.overlay_scratch.resize(len, 0);
        interaction.render_into(&mut self.overlay_scratch, self.width, self.height);
        blend_overlay(
            self.pixels.frame_mut(),
            &self.overlay_scratch,
            self.width as usize,
            alpha,
        );
    }

    pub(crate) fn present(&self) -> Result<(), Error> {
        self.pixels.render()
    }
}

fn blend_overlay(frame: &mut [u8], overlay: &[u8], width: usize, alpha: u8) {
    if width == 0 {
        return;
    }
    for (index, source) in overlay.chunks_exact(4).enumerate() {
        if source[3] == 0 {
            continue;
        }
        let x = (index % width) as i32;
        let y = (index / width) as i32;
        raster::blend_pixel(frame, width, x, y, [source[0], source[1], source[2], 255], alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_fill_box_covers_partial_pixels() {
        let mut buffer = vec![0; 4 * 4 * 4];
        let mut frame = Frame::new(&mut buffer, 4, 4);
        frame.fill_box(
            &BoundingBox::from_rect(0.5, 0.5, 1.0, 1.0),
            Color::rgba(9, 8, 7, 255),
        );
        assert_eq!(frame.pixel(0, 0), Some(Color::rgba(9, 8, 7, 255)));
        assert_eq!(frame.pixel(1, 1), Some(Color::rgba(9, 8, 7, 255)));
        assert_eq!(frame.pixel(2, 2), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn frame_draw_sprite_keeps_transparent_pixels() {
        let sprite = SpriteImage::from_rgba("dot", 2, 1, vec![1, 2, 3, 255, 9, 9, 9, 0])
            .expect("sprite");
        let mut buffer = vec![0; 3 * 3 * 4];
        let mut frame = Frame::new(&mut buffer, 3, 3);
        frame.draw_sprite(&sprite, Vec2::new(1.0, 2.0));
        assert_eq!(frame.pixel(1, 2), Some(Color::rgba(1, 2, 3, 255)));
        assert_eq!(frame.pixel(2, 2), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn overlay_blend_skips_unpainted_pixels() {
        let mut frame = vec![10, 10, 10, 255, 10, 10, 10, 255];
        let overlay = vec![250, 0, 0, 255, 0, 0, 0, 0];
        blend_overlay(&mut frame, &overlay, 2, 255);
        assert_eq!(&frame[0..4], &[250, 0, 0, 255]);
        assert_eq!(&frame[4..8], &[10, 10, 10, 255]);
    }
}
