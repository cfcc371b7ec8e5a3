use bytemuck::{Pod, Zeroable};

/// Straight-alpha RGBA color packed into 32 bits, red in the lowest byte.
///
/// This is the exact byte layout the vertex buffer carries (`Unorm8x4`), so
/// `0xffffffff` is opaque white and `0xff0000ff` is opaque red.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Pod, Zeroable)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffff_ffff);
    pub const BLACK: Color = Color(0xff00_0000);
    pub const TRANSPARENT: Color = Color(0);

    #[inline]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color((a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32)
    }

    /// Packs float components; each channel is clamped to `[0, 1]` first.
    #[inline]
    pub fn from_rgba_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
        Self::from_rgba8(q(r), q(g), q(b), q(a))
    }

    #[inline]
    pub const fn r(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Unpacks to `[r, g, b, a]` floats in `[0, 1]`.
    #[inline]
    pub fn to_rgba_f32(self) -> [f32; 4] {
        [
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
            self.a() as f32 / 255.0,
        ]
    }
}

impl From<u32> for Color {
    #[inline]
    fn from(v: u32) -> Self {
        Color(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_lives_in_low_byte() {
        let c = Color::from_rgba8(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.0, 0x4433_2211);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn float_components_are_clamped() {
        assert_eq!(Color::from_rgba_f32(2.0, 1.0, 1.0, 1.0), Color::WHITE);
        assert_eq!(Color::from_rgba_f32(-1.0, 0.0, 0.0, 1.0), Color::BLACK);
    }
}
