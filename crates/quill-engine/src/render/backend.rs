//! GPU backend contract.
//!
//! The batch renderer never touches wgpu directly; it drives this trait.
//! [`super::WgpuBackend`] is the production implementation, and the test
//! suite uses a recording implementation that keeps every call in memory.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

use crate::coords::Mat4;

use super::vertex::DrawMode;

/// Handle to a GPU buffer owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferHandle(pub(crate) u32);

/// Handle to a 2D texture owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle(pub(crate) u32);

/// Handle to a compiled shader program owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShaderHandle(pub(crate) u32);

/// Resource-load failure. Always logged at the failure site as well.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("shader `{label}` failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    #[error("texture {width}x{height} expects {expected} bytes, got {actual}")]
    TextureSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("failed to decode image `{path}`: {source}")]
    ImageDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),

    #[error("mesh has no vertices")]
    EmptyMesh,

    #[error("mesh {attribute} has {actual} entries for {expected} vertices")]
    MeshAttribute {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("mesh index {index} out of range for {vertices} vertices")]
    MeshIndex { index: u32, vertices: usize },
}

/// Vertex + fragment source pair compiled into one program.
///
/// Both stages are WGSL. The vertex stage must expose `vs_main` and the
/// fragment stage `fs_main`; both see the bindings of group 0 (uniforms,
/// texture, sampler).
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub label: Cow<'static, str>,
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

/// Texel layouts the core uploads.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    /// One byte per texel. Sampled as `rrrr` (glyph atlases, grayscale images).
    R8,
    /// Four bytes per texel.
    Rgba8,
}

impl TextureFormat {
    #[inline]
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// Texture creation parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    #[inline]
    pub const fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_texel()
    }
}

/// How the fragment stage treats the bound texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum TextureMode {
    None = 0,
    Rgba = 1,
    SingleChannel = 2,
}

/// Per-draw uniform block (group 0, binding 0).
///
/// 80 bytes; backends place each draw's copy at an aligned dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ShaderUniforms {
    pub projection: Mat4,
    pub texture_mode: u32,
    pub _pad: [u32; 3],
}

impl ShaderUniforms {
    #[inline]
    pub fn new(projection: Mat4, texture_mode: TextureMode) -> Self {
        Self {
            projection,
            texture_mode: texture_mode as u32,
            _pad: [0; 3],
        }
    }
}

/// Scissor rectangle in target pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Capability set the batch renderer needs from a GPU.
///
/// Calls are synchronous from the caller's point of view. Between
/// `begin_pass` and `end_pass` the backend records state changes and draws;
/// `end_pass` submits them in order.
pub trait GpuBackend {
    /// Creates a vertex buffer of `size` bytes, contents undefined.
    fn create_vertex_buffer(&mut self, size: u64) -> BufferHandle;

    /// Creates an immutable index buffer.
    fn create_index_buffer(&mut self, indices: &[u32]) -> BufferHandle;

    /// Uploads `data` at byte `offset` of `buffer`.
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, ResourceError>;

    fn destroy_shader(&mut self, shader: ShaderHandle);

    /// Creates a texture initialised with `data` (`desc.byte_len()` bytes).
    fn create_texture(
        &mut self,
        desc: &TextureDesc,
        data: &[u8],
    ) -> Result<TextureHandle, ResourceError>;

    /// Replaces the full contents of `texture`.
    fn update_texture(&mut self, texture: TextureHandle, data: &[u8]);

    fn destroy_texture(&mut self, texture: TextureHandle);

    /// Clears color and depth at the start of the next pass.
    fn clear(&mut self, color: [f32; 4]);

    /// Starts a submission that reads vertices from `vertices` and triangle
    /// indices from `indices`.
    fn begin_pass(&mut self, vertices: BufferHandle, indices: BufferHandle);

    fn bind_material(&mut self, shader: ShaderHandle, texture: Option<TextureHandle>);

    fn set_uniforms(&mut self, uniforms: &ShaderUniforms);

    /// `None` disables the scissor test.
    fn set_scissor(&mut self, rect: Option<ScissorRect>);

    /// Non-indexed draw of `count` vertices starting at `first`.
    /// `mode` is never [`DrawMode::Quads`].
    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);

    /// Indexed triangle-list draw from the pass's index buffer.
    fn draw_indexed(&mut self, first_index: u32, index_count: u32);

    fn end_pass(&mut self);

    /// Format `texture` was created with; `None` for an unknown handle.
    fn texture_format(&self, texture: TextureHandle) -> Option<TextureFormat>;
}
