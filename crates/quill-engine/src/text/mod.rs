//! Font loading, glyph atlases and text layout.

mod atlas;
pub(crate) mod face;
mod font_system;
mod layout;
pub mod sdf;

pub use atlas::{FontAtlas, FontGlyph, ShelfPacker};
pub use face::{FontFace, FontdueFace, GlyphBitmap, SDF_SPREAD};
pub use font_system::{Font, FontId, FontLoadError, FontSystem};
pub use layout::{TextStyle, draw_text, measure_text};
