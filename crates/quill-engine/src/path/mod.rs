//! Path construction and tessellation.
//!
//! [`PathBuilder`] collects points (directly or from the curve flatteners in
//! [`flatten`]) together with run-length style changes; `end_path` turns
//! them into triangles through [`fill_path`] and [`stroke_path`].

mod builder;
mod fill;
pub mod flatten;
mod stroke;

pub use builder::{PathBuilder, PathView, StyleRun};
pub use fill::fill_path;
pub use flatten::EllipticalArc;
pub use stroke::stroke_path;
