//! Retained triangle meshes.
//!
//! A [`Mesh`] keeps its attribute arrays on the CPU until they are uploaded
//! into buffers it owns on the backend. Drawing goes through
//! [`super::Batch::draw_mesh`], which submits the mesh as its own pass.

use crate::paint::Color;

use super::backend::{BufferHandle, GpuBackend, ResourceError};
use super::vertex::Vertex;

/// Per-vertex attribute arrays. Optional attributes are either empty or as
/// long as `positions`; `indices` empty means a plain triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Defaults to white.
    pub colors: Vec<Color>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_colors(mut self, colors: Vec<Color>) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = normals;
        self
    }

    fn validate(&self) -> Result<(), ResourceError> {
        let n = self.positions.len();
        if n == 0 {
            return Err(ResourceError::EmptyMesh);
        }

        for (attribute, len) in [
            ("normals", self.normals.len()),
            ("uvs", self.uvs.len()),
            ("colors", self.colors.len()),
        ] {
            if len != 0 && len != n {
                return Err(ResourceError::MeshAttribute {
                    attribute,
                    expected: n,
                    actual: len,
                });
            }
        }

        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= n) {
            return Err(ResourceError::MeshIndex { index, vertices: n });
        }
        Ok(())
    }

    /// Interleaves the attribute arrays into batch vertices.
    pub fn vertices(&self) -> Vec<Vertex> {
        (0..self.positions.len())
            .map(|i| Vertex {
                position: self.positions[i],
                normal: self.normals.get(i).copied().unwrap_or_default(),
                uv: self.uvs.get(i).copied().unwrap_or_default(),
                color: self.colors.get(i).copied().unwrap_or(Color::WHITE),
                color2: Color::TRANSPARENT,
                _pad: [0; 2],
            })
            .collect()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct MeshBuffers {
    pub vertices: BufferHandle,
    pub indices: Option<BufferHandle>,
}

/// Triangle mesh with an optional CPU copy and optional GPU buffers.
///
/// The buffers are not freed on drop; call [`Mesh::release`] with the
/// backend that uploaded them, or let [`crate::core::Context`] own the mesh.
#[derive(Debug)]
pub struct Mesh {
    data: Option<MeshData>,
    vertex_count: u32,
    index_count: u32,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// Validates `data` and keeps it on the CPU. Nothing is uploaded yet.
    pub fn new(data: MeshData) -> Result<Self, ResourceError> {
        data.validate()?;
        Ok(Self {
            vertex_count: data.positions.len() as u32,
            index_count: data.indices.len() as u32,
            data: Some(data),
            buffers: None,
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Zero for a non-indexed mesh.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.index_count > 0
    }

    #[inline]
    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    #[inline]
    pub fn cpu_data(&self) -> Option<&MeshData> {
        self.data.as_ref()
    }

    #[inline]
    pub(crate) fn buffers(&self) -> Option<MeshBuffers> {
        self.buffers
    }

    /// Creates the vertex (and index) buffers from the CPU copy.
    ///
    /// A no-op when already uploaded. Returns `false` when there is neither
    /// GPU data nor a CPU copy to upload from.
    pub fn upload<B: GpuBackend>(&mut self, backend: &mut B) -> bool {
        if self.buffers.is_some() {
            return true;
        }
        let Some(data) = self.data.as_ref() else {
            log::error!("mesh upload: CPU data was already deleted");
            return false;
        };

        let vertices = data.vertices();
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        let vertex_buffer = backend.create_vertex_buffer(bytes.len() as u64);
        backend.write_buffer(vertex_buffer, 0, bytes);

        let index_buffer = (!data.indices.is_empty()).then(|| backend.create_index_buffer(&data.indices));

        log::debug!(
            "mesh uploaded: {} vertices, {} indices",
            self.vertex_count,
            self.index_count
        );
        self.buffers = Some(MeshBuffers {
            vertices: vertex_buffer,
            indices: index_buffer,
        });
        true
    }

    /// Drops the CPU copy; uploaded buffers stay valid.
    pub fn delete_cpu_data(&mut self) {
        self.data = None;
    }

    /// Destroys the GPU buffers and the CPU copy.
    pub fn release<B: GpuBackend>(&mut self, backend: &mut B) {
        if let Some(buffers) = self.buffers.take() {
            backend.destroy_buffer(buffers.vertices);
            if let Some(indices) = buffers.indices {
                backend.destroy_buffer(indices);
            }
        }
        self.data = None;
    }
}
