use super::Color;

/// Stroke/fill appearance for a span of path points.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathStyle {
    pub stroke_width: f32,
    pub stroke_color: Color,
    pub fill_color: Color,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            stroke_width: 1.0,
            stroke_color: Color::WHITE,
            fill_color: Color::WHITE,
        }
    }
}

/// Which geometry `end_path` emits for a path.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PathKind(u8);

impl PathKind {
    pub const NONE: PathKind = PathKind(0);
    pub const STROKE: PathKind = PathKind(1);
    pub const FILL: PathKind = PathKind(1 << 1);
    pub const STROKE_AND_FILL: PathKind = PathKind(Self::STROKE.0 | Self::FILL.0);

    #[inline]
    pub const fn contains(self, other: PathKind) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    #[inline]
    pub fn set(&mut self, other: PathKind, enabled: bool) {
        if enabled {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl core::ops::BitOr for PathKind {
    type Output = PathKind;
    #[inline]
    fn bitor(self, rhs: PathKind) -> PathKind {
        PathKind(self.0 | rhs.0)
    }
}
