//! GPU rendering subsystem.
//!
//! The [`Batch`] renderer accumulates vertices and draw calls on the CPU and
//! submits them through a [`GpuBackend`]. Retained [`Mesh`]es own their
//! buffers and are submitted through the same batch.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - The vertex shader applies the projection from [`ShaderUniforms`].

mod backend;
pub mod batch;
mod buffer;
pub mod mesh;
pub mod shaders;
pub mod texture;
mod vertex;
mod wgpu_backend;

#[cfg(test)]
pub(crate) mod recording;

pub use backend::{
    BufferHandle, GpuBackend, ResourceError, ScissorRect, ShaderHandle, ShaderSource,
    ShaderUniforms, TextureDesc, TextureFormat, TextureHandle, TextureMode,
};
pub use batch::{Batch, BatchConfig, BatchStats, DEPTH_STEP, GLYPH_DEPTH_STEP};
pub use buffer::{DrawCallTable, VertexArena};
pub use mesh::{Mesh, MeshData};
pub use vertex::{DrawCall, DrawMode, Material, Vertex, VertexStyle};
pub use wgpu_backend::{DEPTH_FORMAT, FrameTarget, WgpuBackend};
