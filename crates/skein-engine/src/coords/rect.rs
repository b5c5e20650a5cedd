use glam::Vec2;

/// Axis-aligned rectangle in world coordinates (min/max corners, +Y up).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect2D {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect2D {
    #[inline]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Builds a rectangle from two arbitrary opposite corners.
    #[inline]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Closed containment: both edges inclusive.
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    #[inline]
    pub fn intersects(self, other: Rect2D) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Smallest rectangle covering both.
    #[inline]
    pub fn union(self, other: Rect2D) -> Rect2D {
        Rect2D {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}
