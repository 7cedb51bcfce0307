//! Clipped RGBA8 frame operations shared by the hit surface and the presenter.
//!
//! Frames are tightly packed rows of `width * 4` bytes. Every function clips
//! against the frame bounds and silently ignores pixels that fall outside.

use image::RgbaImage;

use crate::color::Color;
use crate::geometry::BoundingBox;

/// Half-open pixel span `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRectPx {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl ScreenRectPx {
    pub fn from_origin_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            right: left.saturating_add(width),
            top,
            bottom: top.saturating_add(height),
        }
    }

    /// Covers every pixel the box touches.
    pub fn covering(bbox: &BoundingBox) -> Self {
        Self {
            left: bbox.nw.x.floor() as i32,
            right: bbox.se.x.ceil() as i32,
            top: bbox.nw.y.floor() as i32,
            bottom: bbox.se.y.ceil() as i32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }
}

pub fn clear(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

pub fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let Some(byte_offset) = pixel_byte_offset(width, x as usize, y as usize) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

pub fn read_pixel(frame: &[u8], width: u32, height: u32, x: u32, y: u32) -> Option<Color> {
    if x >= width || y >= height {
        return None;
    }
    let byte_offset = pixel_byte_offset(width as usize, x as usize, y as usize)?;
    let rgba = frame.get(byte_offset..byte_offset.checked_add(4)?)?;
    Some(Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]))
}

pub fn fill_rect(frame: &mut [u8], width: u32, height: u32, rect: ScreenRectPx, color: [u8; 4]) {
    let draw_left = rect.left.max(0);
    let draw_top = rect.top.max(0);
    let draw_right = rect.right.min(width as i32);
    let draw_bottom = rect.bottom.min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }
    let frame_width = width as usize;
    for y in draw_top..draw_bottom {
        let row_start = y as usize * frame_width * 4;
        let start = row_start + draw_left as usize * 4;
        let end = row_start + draw_right as usize * 4;
        let Some(row) = frame.get_mut(start..end) else {
            return;
        };
        for chunk in row.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }
}

pub fn stroke_rect(frame: &mut [u8], width: u32, height: u32, rect: ScreenRectPx, color: [u8; 4]) {
    if rect.is_empty() {
        return;
    }
    let ScreenRectPx {
        left,
        right,
        top,
        bottom,
    } = rect;
    let edges = [
        ScreenRectPx { left, right, top, bottom: top + 1 },
        ScreenRectPx { left, right, top: bottom - 1, bottom },
        ScreenRectPx { left, right: left + 1, top, bottom },
        ScreenRectPx { left: right - 1, right, top, bottom },
    ];
    for edge in edges {
        fill_rect(frame, width, height, edge, color);
    }
}

/// Copies every pixel of `image` whose alpha is non-zero, with `(left, top)`
/// as the top-left corner.
pub fn blit_masked(
    frame: &mut [u8],
    width: u32,
    height: u32,
    left: i32,
    top: i32,
    image: &RgbaImage,
) {
    let (image_w, image_h) = image.dimensions();
    if image_w == 0 || image_h == 0 || width == 0 || height == 0 {
        return;
    }
    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = left.saturating_add(image_w as i32).min(width as i32);
    let draw_bottom = top.saturating_add(image_h as i32).min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let frame_width = width as usize;
    for out_y in draw_top..draw_bottom {
        let src_y = (out_y - top) as u32;
        for out_x in draw_left..draw_right {
            let src_x = (out_x - left) as u32;
            let source = image.get_pixel(src_x, src_y).0;
            if source[3] == 0 {
                continue;
            }
            write_pixel_rgba_clipped(frame, frame_width, out_x, out_y, source);
        }
    }
}

/// Alpha-blends `color` over the frame pixel, keeping the destination opaque.
pub fn blend_pixel(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4], alpha: u8) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let Some(offset) = pixel_byte_offset(width, x as usize, y as usize) else {
        return;
    };
    let Some(dst) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    let a = alpha as u16;
    for channel in 0..3 {
        let blended = (color[channel] as u16 * a + dst[channel] as u16 * (255 - a)) / 255;
        dst[channel] = blended as u8;
    }
    dst[3] = 255;
}

fn pixel_byte_offset(width: usize, x: usize, y: usize) -> Option<usize> {
    y.checked_mul(width)
        .and_then(|row| row.checked_add(x))
        .and_then(|pixel| pixel.checked_mul(4))
}
