#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Pixel cell containing this point, or `None` for negative/non-finite coordinates.
    pub fn to_pixel(self) -> Option<(u32, u32)> {
        if !self.x.is_finite() || !self.y.is_finite() || self.x < 0.0 || self.y < 0.0 {
            return None;
        }
        Some((self.x.floor() as u32, self.y.floor() as u32))
    }
}

/// Axis-aligned box described by its north-west and south-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub nw: Vec2,
    pub se: Vec2,
}

impl BoundingBox {
    pub fn new(nw: Vec2, se: Vec2) -> Self {
        Self { nw, se }
    }

    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            nw: Vec2 { x, y },
            se: Vec2 {
                x: x + width,
                y: y + height,
            },
        }
    }

    pub fn width(&self) -> f32 {
        self.se.x - self.nw.x
    }

    pub fn height(&self) -> f32 {
        self.se.y - self.nw.y
    }

    /// Edges are inclusive on all four sides.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.nw.x && point.x <= self.se.x && point.y >= self.nw.y && point.y <= self.se.y
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            nw: Vec2 {
                x: self.nw.x + dx,
                y: self.nw.y + dy,
            },
            se: Vec2 {
                x: self.se.x + dx,
                y: self.se.y + dy,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_on_every_edge() {
        let bbox = BoundingBox::from_rect(10.0, 20.0, 30.0, 40.0);
        assert!(bbox.contains(Vec2::new(10.0, 20.0)));
        assert!(bbox.contains(Vec2::new(40.0, 60.0)));
        assert!(bbox.contains(Vec2::new(10.0, 60.0)));
        assert!(bbox.contains(Vec2::new(40.0, 20.0)));
        assert!(!bbox.contains(Vec2::new(9.9, 30.0)));
        assert!(!bbox.contains(Vec2::new(25.0, 60.1)));
    }

    #[test]
    fn from_rect_reports_dimensions() {
        let bbox = BoundingBox::from_rect(-5.0, 3.0, 12.0, 7.0);
        assert_eq!(bbox.width(), 12.0);
        assert_eq!(bbox.height(), 7.0);
        assert_eq!(bbox.se, Vec2::new(7.0, 10.0));
    }

    #[test]
    fn translated_moves_both_corners() {
        let bbox = BoundingBox::from_rect(0.0, 0.0, 4.0, 4.0).translated(2.0, -1.0);
        assert_eq!(bbox.nw, Vec2::new(2.0, -1.0));
        assert_eq!(bbox.se, Vec2::new(6.0, 3.0));
    }

    #[test]
    fn to_pixel_rejects_negative_and_non_finite() {
        assert_eq!(Vec2::new(3.7, 9.2).to_pixel(), Some((3, 9)));
        assert_eq!(Vec2::new(-0.5, 1.0).to_pixel(), None);
        assert_eq!(Vec2::new(f32::NAN, 1.0).to_pixel(), None);
    }
}
