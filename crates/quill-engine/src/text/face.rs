use std::path::Path;

use super::FontLoadError;
use super::sdf::coverage_to_sdf;

/// Pixels of distance field around every glyph.
pub const SDF_SPREAD: u32 = 4;

/// A rasterized glyph plus the metrics needed to place it.
///
/// `left`/`top` locate the bitmap's top-left corner relative to the pen on
/// the baseline (`top` grows upwards).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub left: f32,
    pub top: f32,
    pub advance: f32,
    /// Single channel, `width * height` bytes.
    pub pixels: Vec<u8>,
}

/// Font collaborator: glyph lookup, metrics, kerning and SDF rasterization.
pub trait FontFace {
    /// Glyph index for `c`, `None` when the face has no glyph for it.
    fn glyph_index(&self, c: char) -> Option<u16>;

    fn set_pixel_size(&mut self, size: f32);

    fn pixel_size(&self) -> f32;

    /// Distance-field bitmap and metrics for `glyph` at the current size.
    /// Whitespace glyphs come back with a zero-sized bitmap.
    fn rasterize_sdf(&mut self, glyph: u16) -> Option<GlyphBitmap>;

    /// Horizontal adjustment between an ordered glyph pair.
    fn kerning(&self, left: u16, right: u16) -> f32;

    fn has_kerning(&self) -> bool;

    /// Baseline-to-baseline distance.
    fn line_height(&self) -> f32;
}

/// [`FontFace`] backed by `fontdue`.
pub struct FontdueFace {
    font: fontdue::Font,
    size: f32,
    has_kerning: bool,
}

/// Pairs that carry kerning in virtually every Latin face.
const KERNING_SAMPLES: [(char, char); 6] =
    [('A', 'V'), ('A', 'W'), ('T', 'o'), ('V', 'a'), ('L', 'T'), ('Y', 'o')];

impl FontdueFace {
    pub fn from_bytes(bytes: &[u8], size: f32) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;

        let has_kerning = KERNING_SAMPLES.iter().any(|&(a, b)| {
            font.horizontal_kern(a, b, size.max(1.0))
                .is_some_and(|k| k != 0.0)
        });

        log::debug!(
            "parsed font `{}` ({} glyphs, kerning: {has_kerning})",
            font.name().unwrap_or("unnamed"),
            font.glyph_count()
        );

        Ok(Self { font, size, has_kerning })
    }

    pub fn from_path(path: impl AsRef<Path>, size: f32) -> Result<Self, FontLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes, size)
    }
}

impl FontFace for FontdueFace {
    fn glyph_index(&self, c: char) -> Option<u16> {
        match self.font.lookup_glyph_index(c) {
            0 => None,
            index => Some(index),
        }
    }

    fn set_pixel_size(&mut self, size: f32) {
        self.size = size;
    }

    fn pixel_size(&self) -> f32 {
        self.size
    }

    fn rasterize_sdf(&mut self, glyph: u16) -> Option<GlyphBitmap> {
        let (metrics, coverage) = self.font.rasterize_indexed(glyph, self.size);
        let (w, h) = (metrics.width as u32, metrics.height as u32);

        if w == 0 || h == 0 {
            return Some(GlyphBitmap {
                advance: metrics.advance_width,
                ..GlyphBitmap::default()
            });
        }

        let spread = SDF_SPREAD as f32;
        Some(GlyphBitmap {
            width: w + 2 * SDF_SPREAD,
            height: h + 2 * SDF_SPREAD,
            left: metrics.xmin as f32 - spread,
            top: (metrics.ymin + metrics.height as i32) as f32 + spread,
            advance: metrics.advance_width,
            pixels: coverage_to_sdf(&coverage, w, h, SDF_SPREAD),
        })
    }

    fn kerning(&self, left: u16, right: u16) -> f32 {
        self.font
            .horizontal_kern_indexed(left, right, self.size)
            .unwrap_or(0.0)
    }

    fn has_kerning(&self) -> bool {
        self.has_kerning
    }

    fn line_height(&self) -> f32 {
        self.font
            .horizontal_line_metrics(self.size)
            .map_or(self.size * 1.2, |m| m.new_line_size)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        assert!(matches!(
            FontdueFace::from_bytes(&[0, 1, 2, 3], 16.0),
            Err(FontLoadError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            FontdueFace::from_path("/no/such/font.ttf", 16.0),
            Err(FontLoadError::Io { .. })
        ));
    }
}
