//! Built-in WGSL programs.

use std::borrow::Cow;

use super::backend::ShaderSource;

const VERTEX: &str = include_str!("vertex.wgsl");
const DEFAULT_FRAGMENT: &str = include_str!("default.wgsl");
const SDF_FRAGMENT: &str = include_str!("sdf.wgsl");

/// Vertex color, optionally modulated by an RGBA or single-channel texture.
pub fn default_shader() -> ShaderSource {
    ShaderSource {
        label: Cow::Borrowed("quill default"),
        vertex: Cow::Borrowed(VERTEX),
        fragment: Cow::Borrowed(DEFAULT_FRAGMENT),
    }
}

/// Distance-field text with an optional outline.
pub fn sdf_shader() -> ShaderSource {
    ShaderSource {
        label: Cow::Borrowed("quill sdf text"),
        vertex: Cow::Borrowed(VERTEX),
        fragment: Cow::Borrowed(SDF_FRAGMENT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_programs_expose_entry_points() {
        for source in [default_shader(), sdf_shader()] {
            assert!(source.vertex.contains("fn vs_main"));
            assert!(source.fragment.contains("fn fs_main"));
        }
    }
}
