use std::path::Path;
use std::sync::Arc;

use image::{ImageReader, Rgba, RgbaImage};
use thiserror::Error;

use crate::color::HitboxColor;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to open sprite '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode sprite '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("sprite '{source_key}' expected {expected} rgba bytes, got {actual}")]
    BufferSize {
        source_key: String,
        expected: usize,
        actual: usize,
    },
}

/// Decoded sprite keyed by its source. Clones share the pixel data.
#[derive(Debug, Clone)]
pub struct SpriteImage {
    source: Arc<str>,
    pixels: Arc<RgbaImage>,
}

impl SpriteImage {
    pub fn load(path: &Path) -> Result<Self, SpriteError> {
        let display = path.display().to_string();
        let reader = ImageReader::open(path).map_err(|source| SpriteError::Open {
            path: display.clone(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| SpriteError::Decode {
            path: display.clone(),
            source,
        })?;
        Ok(Self {
            source: Arc::from(display),
            pixels: Arc::new(decoded.to_rgba8()),
        })
    }

    pub fn from_rgba(
        source: impl Into<String>,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, SpriteError> {
        let source = source.into();
        let expected = width as usize * height as usize * 4;
        let actual = rgba.len();
        let pixels = RgbaImage::from_raw(width, height, rgba).ok_or(SpriteError::BufferSize {
            source_key: source.clone(),
            expected,
            actual,
        })?;
        Ok(Self::from_image(source, pixels))
    }

    pub fn from_image(source: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            source: Arc::from(source.into()),
            pixels: Arc::new(pixels),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn source_key(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Stamps `color` over the sprite's alpha mask: any pixel with non-zero
/// alpha becomes the opaque identity color, everything else transparent.
pub fn colorize(sprite: &SpriteImage, color: HitboxColor) -> RgbaImage {
    let stamp = Rgba(color.to_rgba());
    let clear = Rgba([0, 0, 0, 0]);
    let source = sprite.pixels();
    RgbaImage::from_fn(source.width(), source.height(), |x, y| {
        if source.get_pixel(x, y).0[3] == 0 {
            clear
        } else {
            stamp
        }
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn checker_sprite() -> SpriteImage {
        let mut pixels = RgbaImage::new(2, 2);
        pixels.put_pixel(0, 0, Rgba([200, 10, 10, 255]));
        pixels.put_pixel(1, 1, Rgba([10, 200, 10, 40]));
        SpriteImage::from_image("checker", pixels)
    }

    #[test]
    fn colorize_follows_the_alpha_mask() {
        let colorized = colorize(&checker_sprite(), HitboxColor::rgb(1, 2, 3));
        assert_eq!(colorized.get_pixel(0, 0).0, [1, 2, 3, 255]);
        assert_eq!(colorized.get_pixel(1, 1).0, [1, 2, 3, 255]);
        assert_eq!(colorized.get_pixel(1, 0).0, [0, 0, 0, 0]);
        assert_eq!(colorized.get_pixel(0, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn from_rgba_rejects_short_buffers() {
        let error = SpriteImage::from_rgba("short", 2, 2, vec![0; 15]).expect_err("short buffer");
        assert!(matches!(
            error,
            SpriteError::BufferSize {
                expected: 16,
                actual: 15,
                ..
            }
        ));
    }

    #[test]
    fn load_decodes_png_from_disk() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("marker.png");
        let mut pixels = RgbaImage::new(3, 2);
        pixels.put_pixel(2, 1, Rgba([1, 2, 3, 255]));
        pixels.save(&path).expect("write png");

        let sprite = SpriteImage::load(&path).expect("load sprite");
        assert_eq!((sprite.width(), sprite.height()), (3, 2));
        assert_eq!(sprite.pixels().get_pixel(2, 1).0, [1, 2, 3, 255]);
        assert!(sprite.source().ends_with("marker.png"));
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = TempDir::new().expect("temp dir");
        let error = SpriteImage::load(&temp.path().join("absent.png")).expect_err("missing");
        assert!(matches!(error, SpriteError::Open { .. }));
    }
}
