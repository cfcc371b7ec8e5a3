//! Quill engine crate.
//!
//! Immediate-mode 2D vector rendering: a batching renderer over a small GPU
//! backend trait, path tessellation (fill + mitred stroke), an SDF glyph
//! atlas for text, and the [`core::Context`] that ties them together.

pub mod device;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod path;
pub mod render;
pub mod text;
