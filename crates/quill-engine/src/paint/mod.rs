//! Paint model: packed vertex colors and the path style value type.

pub mod color;
pub mod style;

pub use color::Color;
pub use style::{PathKind, PathStyle};
