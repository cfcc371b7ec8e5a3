//! Shelf-packed glyph atlas.

use std::collections::{HashMap, HashSet};

use crate::render::{GpuBackend, ResourceError, TextureDesc, TextureFormat, TextureHandle};

use super::face::FontFace;

/// Pixels kept free between packed glyphs.
const GLYPH_PADDING: u32 = 1;

#[derive(Debug, Copy, Clone)]
struct Shelf {
    y: u32,
    height: u32,
    cursor_x: u32,
}

/// Packs rectangles into horizontal shelves.
///
/// A request goes to the first shelf that is tall enough and still has
/// horizontal room; otherwise a new shelf is opened below the last one.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    shelves: Vec<Shelf>,
    next_y: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            shelves: Vec::new(),
            next_y: GLYPH_PADDING,
        }
    }

    /// Top-left corner of a free `w x h` region, or `None` when full.
    pub fn pack(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        let fits_x = |shelf: &Shelf| shelf.cursor_x + w + GLYPH_PADDING <= self.width;

        if let Some(shelf) = self
            .shelves
            .iter_mut()
            .find(|s| s.height >= h && fits_x(s))
        {
            let x = shelf.cursor_x;
            shelf.cursor_x += w + GLYPH_PADDING;
            return Some((x, shelf.y));
        }

        if GLYPH_PADDING + w + GLYPH_PADDING > self.width
            || self.next_y + h + GLYPH_PADDING > self.height
        {
            return None;
        }

        let shelf = Shelf {
            y: self.next_y,
            height: h,
            cursor_x: GLYPH_PADDING + w + GLYPH_PADDING,
        };
        self.next_y += h + GLYPH_PADDING;
        self.shelves.push(shelf);
        Some((GLYPH_PADDING, shelf.y))
    }
}

/// Placement and metrics of a packed glyph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontGlyph {
    pub width: u32,
    pub height: u32,
    pub left: f32,
    pub top: f32,
    pub advance: f32,
    /// `[u0, v0, u1, v1]`, top-left to bottom-right.
    pub uv: [f32; 4],
}

impl FontGlyph {
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Append-only single-channel atlas for one font.
///
/// Keeps a CPU mirror of the texture; every newly packed glyph re-uploads
/// the whole mirror.
pub struct FontAtlas {
    size: u32,
    pixels: Vec<u8>,
    packer: ShelfPacker,
    glyphs: HashMap<u16, FontGlyph>,
    failed: HashSet<u16>,
    texture: TextureHandle,
}

impl FontAtlas {
    pub fn new<B: GpuBackend + ?Sized>(backend: &mut B, size: u32) -> Result<Self, ResourceError> {
        let pixels = vec![0u8; size as usize * size as usize];
        let texture = backend.create_texture(
            &TextureDesc { width: size, height: size, format: TextureFormat::R8 },
            &pixels,
        )?;

        Ok(Self {
            size,
            pixels,
            packer: ShelfPacker::new(size, size),
            glyphs: HashMap::new(),
            failed: HashSet::new(),
            texture,
        })
    }

    #[inline]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_failed(&self, index: u16) -> bool {
        self.failed.contains(&index)
    }

    /// Cached glyph, rasterizing and packing it on first use.
    ///
    /// Glyphs that fail to rasterize or to pack are remembered and never
    /// retried.
    pub fn glyph<B: GpuBackend + ?Sized>(
        &mut self,
        face: &mut dyn FontFace,
        backend: &mut B,
        index: u16,
    ) -> Option<FontGlyph> {
        if let Some(glyph) = self.glyphs.get(&index) {
            return Some(*glyph);
        }
        if self.failed.contains(&index) {
            return None;
        }

        let Some(bitmap) = face.rasterize_sdf(index) else {
            log::warn!("glyph {index} could not be rasterized");
            self.failed.insert(index);
            return None;
        };

        let mut glyph = FontGlyph {
            width: bitmap.width,
            height: bitmap.height,
            left: bitmap.left,
            top: bitmap.top,
            advance: bitmap.advance,
            uv: [0.0; 4],
        };

        if !glyph.is_blank() {
            let Some((x, y)) = self.packer.pack(bitmap.width, bitmap.height) else {
                log::error!(
                    "glyph {index} ({}x{}) does not fit in the {}x{} atlas",
                    bitmap.width,
                    bitmap.height,
                    self.size,
                    self.size
                );
                self.failed.insert(index);
                return None;
            };

            let stride = self.size as usize;
            let row = bitmap.width as usize;
            for (r, src) in bitmap.pixels.chunks_exact(row).enumerate() {
                let start = (y as usize + r) * stride + x as usize;
                self.pixels[start..start + row].copy_from_slice(src);
            }
            backend.update_texture(self.texture, &self.pixels);

            let size = self.size as f32;
            glyph.uv = [
                x as f32 / size,
                y as f32 / size,
                (x + bitmap.width) as f32 / size,
                (y + bitmap.height) as f32 / size,
            ];
        }

        self.glyphs.insert(index, glyph);
        Some(glyph)
    }

    pub fn release<B: GpuBackend + ?Sized>(&self, backend: &mut B) {
        backend.destroy_texture(self.texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingBackend;
    use crate::text::face::scripted::ScriptedFace;

    #[test]
    fn packer_fills_shelf_then_opens_new_one() {
        let mut packer = ShelfPacker::new(16, 16);
        assert_eq!(packer.pack(6, 4), Some((1, 1)));
        assert_eq!(packer.pack(6, 4), Some((8, 1)));
        // No horizontal room left on the first shelf.
        assert_eq!(packer.pack(6, 4), Some((1, 6)));
    }

    #[test]
    fn packer_reuses_tall_enough_shelf() {
        let mut packer = ShelfPacker::new(32, 32);
        assert_eq!(packer.pack(4, 8), Some((1, 1)));
        assert_eq!(packer.pack(4, 10), Some((1, 10)));
        assert_eq!(packer.pack(4, 6), Some((6, 1)));
    }

    #[test]
    fn packer_reports_full() {
        let mut packer = ShelfPacker::new(8, 8);
        assert!(packer.pack(6, 6).is_some());
        assert_eq!(packer.pack(6, 6), None);
        assert_eq!(packer.pack(20, 1), None);
    }

    #[test]
    fn same_glyph_twice_uploads_once() {
        let mut backend = RecordingBackend::default();
        let mut face = ScriptedFace::new(&[('A', 10.0)]);
        let mut atlas = FontAtlas::new(&mut backend, 64).expect("atlas");

        let first = atlas.glyph(&mut face, &mut backend, 'A' as u16).expect("glyph");
        let second = atlas.glyph(&mut face, &mut backend, 'A' as u16).expect("glyph");

        assert_eq!(first.uv, second.uv);
        assert_eq!(backend.texture_uploads, 1);
        assert_eq!(face.rasterized, 1);
    }

    #[test]
    fn packed_pixels_land_in_mirror() {
        let mut backend = RecordingBackend::default();
        let mut face = ScriptedFace::new(&[('A', 10.0)]);
        let mut atlas = FontAtlas::new(&mut backend, 16).expect("atlas");
        atlas.glyph(&mut face, &mut backend, 'A' as u16).expect("glyph");

        let data = backend.texture_data(atlas.texture()).expect("texture");
        assert_eq!(data[16 + 1], 200);
        assert_eq!(data[0], 0);
    }

    #[test]
    fn glyph_that_does_not_fit_fails_permanently() {
        let mut backend = RecordingBackend::default();
        let mut face = ScriptedFace::new(&[('W', 10.0)]);
        face.glyph_size = (40, 40);
        let mut atlas = FontAtlas::new(&mut backend, 16).expect("atlas");

        assert!(atlas.glyph(&mut face, &mut backend, 'W' as u16).is_none());
        assert!(atlas.is_failed('W' as u16));
        assert!(atlas.glyph(&mut face, &mut backend, 'W' as u16).is_none());
        assert_eq!(face.rasterized, 1);
        assert_eq!(backend.texture_uploads, 0);
    }

    #[test]
    fn blank_glyphs_keep_advance_without_upload() {
        let mut backend = RecordingBackend::default();
        let mut face = ScriptedFace::new(&[(' ', 5.0)]);
        let mut atlas = FontAtlas::new(&mut backend, 16).expect("atlas");

        let space = atlas.glyph(&mut face, &mut backend, ' ' as u16).expect("space");
        assert!(space.is_blank());
        assert_eq!(space.advance, 5.0);
        assert_eq!(backend.texture_uploads, 0);
    }
}
