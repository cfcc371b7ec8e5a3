//! Geometry types shared by the batch, the tessellators and text layout.
//!
//! Canonical CPU space:
//! - pixels, origin top-left
//! - +X right, +Y down
//!
//! The projection built by [`ortho_top_left`] maps this space to clip space.

mod projection;
mod rect;
mod vec2;

pub use projection::{mul, ortho_top_left, translation, Mat4, IDENTITY};
pub use rect::{Corners, Rect};
pub use vec2::Vec2;
