use bytemuck::{Pod, Zeroable};

use crate::paint::Color;

use super::backend::{ScissorRect, ShaderHandle, TextureHandle};

/// Batch vertex (48 bytes):
///
///  offset  0  position  [f32; 3]   loc 0
///  offset 12  normal    [f32; 3]   loc 1   (x = glyph outline width)
///  offset 24  uv        [f32; 2]   loc 2
///  offset 32  color     u32        loc 3   Unorm8x4
///  offset 36  color2    u32        loc 4   Unorm8x4 (glyph outline color)
///  offset 40  _pad      [u32; 2]
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: Color,
    pub color2: Color,
    pub _pad: [u32; 2],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2, // uv
        3 => Unorm8x4,  // color
        4 => Unorm8x4   // color2
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Everything a vertex carries besides its position.
///
/// Passed explicitly with every emission; the batch keeps no "current color".
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexStyle {
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub color: Color,
    pub color2: Color,
}

impl Default for VertexStyle {
    fn default() -> Self {
        Self {
            uv: [0.0, 0.0],
            normal: [0.0, 0.0, -1.0],
            color: Color::WHITE,
            color2: Color::TRANSPARENT,
        }
    }
}

impl VertexStyle {
    #[inline]
    pub fn color(color: Color) -> Self {
        Self { color, ..Self::default() }
    }

    #[inline]
    pub fn with_uv(self, u: f32, v: f32) -> Self {
        Self { uv: [u, v], ..self }
    }
}

/// Primitive assembly for a draw call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawMode {
    Points,
    Lines,
    Triangles,
    /// Four vertices per quad, drawn through the shared quad index buffer.
    Quads,
}

impl DrawMode {
    /// Vertices that make up one complete primitive.
    #[inline]
    pub const fn vertices_per_primitive(self) -> u32 {
        match self {
            DrawMode::Points => 1,
            DrawMode::Lines => 2,
            DrawMode::Triangles => 3,
            DrawMode::Quads => 4,
        }
    }
}

/// Texture + shader pair bound for a draw call. `None` fields fall back to the
/// context defaults at flush time.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Material {
    pub texture: Option<TextureHandle>,
    pub shader: Option<ShaderHandle>,
}

impl Material {
    #[inline]
    pub const fn textured(texture: TextureHandle) -> Self {
        Self { texture: Some(texture), shader: None }
    }
}

/// One recorded span of the vertex buffer sharing mode, material and scissor.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct DrawCall {
    /// `None` until the first `begin`; such calls are never submitted.
    pub mode: Option<DrawMode>,
    pub vertex_count: u32,
    /// Unused vertices after this call so the next one starts on a multiple of 4.
    pub padding: u32,
    pub material: Material,
    pub scissor: Option<ScissorRect>,
}

impl DrawCall {
    #[inline]
    pub fn matches(&self, mode: DrawMode, material: Material, scissor: Option<ScissorRect>) -> bool {
        self.mode == Some(mode) && self.material == material && self.scissor == scissor
    }

    /// Padding that rounds `vertex_count` up to a multiple of 4.
    #[inline]
    pub fn alignment_padding(&self) -> u32 {
        (4 - self.vertex_count % 4) % 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_48_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
    }

    #[test]
    fn padding_rounds_to_quad_boundary() {
        let mut call = DrawCall { mode: Some(DrawMode::Triangles), ..DrawCall::default() };
        for (count, pad) in [(0, 0), (3, 1), (4, 0), (6, 2), (9, 3)] {
            call.vertex_count = count;
            assert_eq!(call.alignment_padding(), pad, "count {count}");
        }
    }
}
