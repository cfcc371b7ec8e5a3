use super::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

/// The four corners of a (possibly rotated) rectangle, in screen order.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Corners {
    pub top_left: Vec2,
    pub top_right: Vec2,
    pub bottom_right: Vec2,
    pub bottom_left: Vec2,
}

impl Corners {
    #[inline]
    pub fn offset(self, by: Vec2) -> Corners {
        Corners {
            top_left: self.top_left + by,
            top_right: self.top_right + by,
            bottom_right: self.bottom_right + by,
            bottom_left: self.bottom_left + by,
        }
    }

    /// Corners in winding order, starting top-left.
    #[inline]
    pub fn to_array(self) -> [Vec2; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Flips negative extents so width and height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let (x, w) = if self.size.x < 0.0 {
            (self.origin.x + self.size.x, -self.size.x)
        } else {
            (self.origin.x, self.size.x)
        };
        let (y, h) = if self.size.y < 0.0 {
            (self.origin.y + self.size.y, -self.size.y)
        } else {
            (self.origin.y, self.size.y)
        };
        Rect::new(x, y, w, h)
    }

    /// Overlap of two rectangles; `None` when they only touch or are disjoint.
    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = a.max().x.min(b.max().x);
        let y1 = a.max().y.min(b.max().y);

        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }

    /// Corners of this rectangle rotated by `rotation_deg` around `pivot`.
    ///
    /// `pivot` is relative to `origin`; it stays fixed while the rest of the
    /// rectangle turns around it (clockwise on screen for positive angles).
    pub fn rotated_corners(self, pivot: Vec2, rotation_deg: f32) -> Corners {
        let local = Corners {
            top_left: Vec2::new(0.0, 0.0) - pivot,
            top_right: Vec2::new(self.size.x, 0.0) - pivot,
            bottom_right: self.size - pivot,
            bottom_left: Vec2::new(0.0, self.size.y) - pivot,
        };

        let rotated = if rotation_deg == 0.0 {
            local
        } else {
            let rad = rotation_deg.to_radians();
            Corners {
                top_left: local.top_left.rotated(rad),
                top_right: local.top_right.rotated(rad),
                bottom_right: local.bottom_right.rotated(rad),
                bottom_left: local.bottom_left.rotated(rad),
            }
        };

        rotated.offset(self.origin + pivot)
    }
}
