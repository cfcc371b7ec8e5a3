use crate::render::{GpuBackend, ResourceError};

use super::atlas::{FontAtlas, FontGlyph};
use super::face::FontFace;

/// Error returned when a font cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("failed to read font `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    Parse(String),

    #[error("failed to create glyph atlas: {0}")]
    Atlas(#[from] ResourceError),
}

/// Handle to a font loaded into a [`FontSystem`].
///
/// The generation makes handles to unloaded fonts stay invalid after their
/// slot is reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId {
    index: u32,
    generation: u32,
}

/// A face, its pixel size and its atlas.
pub struct Font {
    face: Box<dyn FontFace>,
    atlas: FontAtlas,
}

impl Font {
    #[inline]
    pub fn size(&self) -> f32 {
        self.face.pixel_size()
    }

    #[inline]
    pub fn atlas(&self) -> &FontAtlas {
        &self.atlas
    }

    #[inline]
    pub fn line_height(&self) -> f32 {
        self.face.line_height()
    }

    #[inline]
    pub fn glyph_index(&self, c: char) -> Option<u16> {
        self.face.glyph_index(c)
    }

    /// Kerning between two glyphs, 0 for faces without kerning data.
    pub fn kerning(&self, left: u16, right: u16) -> f32 {
        if self.face.has_kerning() {
            self.face.kerning(left, right)
        } else {
            0.0
        }
    }

    pub fn glyph<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, index: u16) -> Option<FontGlyph> {
        self.atlas.glyph(self.face.as_mut(), backend, index)
    }
}

struct FontSlot {
    generation: u32,
    font: Option<Font>,
}

/// Owns every loaded font.
#[derive(Default)]
pub struct FontSystem {
    slots: Vec<FontSlot>,
}

/// Characters rasterized into a fresh atlas.
const PRELOAD: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

impl FontSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `face` at `size` pixels with its own `atlas_size` square atlas
    /// and preloads the ASCII letters.
    pub fn load<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mut face: Box<dyn FontFace>,
        size: f32,
        atlas_size: u32,
    ) -> Result<FontId, FontLoadError> {
        face.set_pixel_size(size);
        let atlas = FontAtlas::new(backend, atlas_size)?;
        let mut font = Font { face, atlas };

        for c in PRELOAD.chars() {
            if let Some(index) = font.glyph_index(c) {
                font.glyph(backend, index);
            }
        }
        log::info!(
            "font loaded at {size}px: {} glyphs preloaded",
            font.atlas.glyph_count()
        );

        let free = self.slots.iter().position(|s| s.font.is_none());
        let index = match free {
            Some(i) => {
                let slot = &mut self.slots[i];
                slot.generation = slot.generation.wrapping_add(1);
                slot.font = Some(font);
                i
            }
            None => {
                self.slots.push(FontSlot { generation: 0, font: Some(font) });
                self.slots.len() - 1
            }
        };

        Ok(FontId {
            index: index as u32,
            generation: self.slots[index].generation,
        })
    }

    pub fn get(&self, id: FontId) -> Option<&Font> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.font.as_ref())
    }

    pub fn get_mut(&mut self, id: FontId) -> Option<&mut Font> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.font.as_mut())
    }

    /// Releases the font's atlas. Unknown or stale handles are ignored.
    pub fn unload<B: GpuBackend + ?Sized>(&mut self, backend: &mut B, id: FontId) {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
        else {
            return;
        };
        if let Some(font) = slot.font.take() {
            font.atlas.release(backend);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.font.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn release_all<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        for slot in &mut self.slots {
            if let Some(font) = slot.font.take() {
                font.atlas.release(backend);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingBackend;
    use crate::text::face::scripted::ScriptedFace;

    fn face() -> Box<dyn FontFace> {
        Box::new(ScriptedFace::new(&[('a', 8.0), ('B', 9.0), ('?', 7.0)]))
    }

    #[test]
    fn load_preloads_letters_only() {
        let mut backend = RecordingBackend::default();
        let mut fonts = FontSystem::new();
        let id = fonts.load(&mut backend, face(), 16.0, 64).expect("font");

        let font = fonts.get(id).expect("loaded");
        assert_eq!(font.atlas().glyph_count(), 2);
        assert_eq!(font.size(), 16.0);
    }

    #[test]
    fn stale_handle_does_not_alias_new_font() {
        let mut backend = RecordingBackend::default();
        let mut fonts = FontSystem::new();
        let first = fonts.load(&mut backend, face(), 16.0, 64).expect("font");
        fonts.unload(&mut backend, first);
        assert!(fonts.get(first).is_none());

        let second = fonts.load(&mut backend, face(), 16.0, 64).expect("font");
        assert_ne!(first, second);
        assert!(fonts.get(first).is_none());
        assert!(fonts.get(second).is_some());
        assert_eq!(backend.live_textures(), 1);
    }

    #[test]
    fn release_all_destroys_atlases() {
        let mut backend = RecordingBackend::default();
        let mut fonts = FontSystem::new();
        fonts.load(&mut backend, face(), 16.0, 64).expect("font");
        fonts.load(&mut backend, face(), 24.0, 64).expect("font");
        assert_eq!(fonts.len(), 2);

        fonts.release_all(&mut backend);
        assert!(fonts.is_empty());
        assert_eq!(backend.live_textures(), 0);
    }
}
