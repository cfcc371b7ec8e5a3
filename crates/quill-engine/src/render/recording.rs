//! In-memory [`GpuBackend`] used by the test suite.
//!
//! Every submitted draw is resolved against the uploaded vertex and index
//! data, so tests can assert on the exact geometry the GPU would receive.

use std::collections::{HashMap, HashSet};

use super::backend::{
    BufferHandle, GpuBackend, ResourceError, ScissorRect, ShaderHandle, ShaderSource,
    ShaderUniforms, TextureDesc, TextureFormat, TextureHandle,
};
use super::vertex::{DrawMode, Vertex};
use crate::coords::Mat4;

#[derive(Debug, Clone)]
pub(crate) struct RecordedDraw {
    pub mode: DrawMode,
    pub indexed: bool,
    /// First vertex (arrays) or first index (indexed).
    pub first: u32,
    pub count: u32,
    pub shader: ShaderHandle,
    pub texture: Option<TextureHandle>,
    pub texture_mode: u32,
    pub projection: Mat4,
    pub scissor: Option<ScissorRect>,
    /// Vertices in submission order; indexed draws are expanded.
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    next_id: u32,

    buffers: HashMap<u32, Vec<u8>>,
    textures: HashMap<u32, (TextureDesc, Vec<u8>)>,
    pub shaders: HashMap<u32, String>,

    /// Shader labels that fail to compile.
    pub failing_shaders: HashSet<String>,

    pub texture_creates: usize,
    pub texture_uploads: usize,
    pub clears: Vec<[f32; 4]>,
    pub passes: usize,
    pub draws: Vec<RecordedDraw>,

    pass: Option<(BufferHandle, BufferHandle)>,
    shader: Option<ShaderHandle>,
    texture: Option<TextureHandle>,
    texture_mode: u32,
    projection: Mat4,
    scissor: Option<ScissorRect>,
}

impl RecordingBackend {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn texture_data(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(&texture.0).map(|(_, data)| data.as_slice())
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn vertices_of(&self, buffer: BufferHandle) -> Vec<Vertex> {
        self.buffers
            .get(&buffer.0)
            .map(|bytes| {
                let whole = bytes.len() / std::mem::size_of::<Vertex>() * std::mem::size_of::<Vertex>();
                bytemuck::pod_collect_to_vec(&bytes[..whole])
            })
            .unwrap_or_default()
    }

    fn indices_of(&self, buffer: BufferHandle) -> Vec<u32> {
        self.buffers
            .get(&buffer.0)
            .map(|bytes| bytemuck::pod_collect_to_vec(bytes))
            .unwrap_or_default()
    }

    fn record(&mut self, mode: DrawMode, indexed: bool, first: u32, count: u32, vertices: Vec<Vertex>) {
        let shader = self.shader.expect("draw without bound material");
        self.draws.push(RecordedDraw {
            mode,
            indexed,
            first,
            count,
            shader,
            texture: self.texture,
            texture_mode: self.texture_mode,
            projection: self.projection,
            scissor: self.scissor,
            vertices,
        });
    }
}

impl GpuBackend for RecordingBackend {
    fn create_vertex_buffer(&mut self, size: u64) -> BufferHandle {
        let id = self.next();
        self.buffers.insert(id, vec![0; size as usize]);
        BufferHandle(id)
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> BufferHandle {
        let id = self.next();
        self.buffers.insert(id, bytemuck::cast_slice(indices).to_vec());
        BufferHandle(id)
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let bytes = self.buffers.get_mut(&buffer.0).expect("write to unknown buffer");
        let start = offset as usize;
        assert!(start + data.len() <= bytes.len(), "buffer overrun");
        bytes[start..start + data.len()].copy_from_slice(data);
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, ResourceError> {
        if self.failing_shaders.contains(source.label.as_ref()) {
            return Err(ResourceError::ShaderCompile {
                label: source.label.to_string(),
                message: "rejected by test".into(),
            });
        }
        let id = self.next();
        self.shaders.insert(id, source.label.to_string());
        Ok(ShaderHandle(id))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader.0);
    }

    fn create_texture(&mut self, desc: &TextureDesc, data: &[u8]) -> Result<TextureHandle, ResourceError> {
        if data.len() != desc.byte_len() {
            return Err(ResourceError::TextureSize {
                width: desc.width,
                height: desc.height,
                expected: desc.byte_len(),
                actual: data.len(),
            });
        }
        let id = self.next();
        self.textures.insert(id, (*desc, data.to_vec()));
        self.texture_creates += 1;
        Ok(TextureHandle(id))
    }

    fn update_texture(&mut self, texture: TextureHandle, data: &[u8]) {
        if let Some((desc, bytes)) = self.textures.get_mut(&texture.0) {
            assert_eq!(data.len(), desc.byte_len());
            bytes.copy_from_slice(data);
            self.texture_uploads += 1;
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture.0);
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.clears.push(color);
    }

    fn begin_pass(&mut self, vertices: BufferHandle, indices: BufferHandle) {
        assert!(self.pass.is_none(), "nested pass");
        self.pass = Some((vertices, indices));
    }

    fn bind_material(&mut self, shader: ShaderHandle, texture: Option<TextureHandle>) {
        self.shader = Some(shader);
        self.texture = texture;
    }

    fn set_uniforms(&mut self, uniforms: &ShaderUniforms) {
        self.texture_mode = uniforms.texture_mode;
        self.projection = uniforms.projection;
    }

    fn set_scissor(&mut self, rect: Option<ScissorRect>) {
        self.scissor = rect;
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        assert_ne!(mode, DrawMode::Quads);
        let (vb, _) = self.pass.expect("draw outside pass");
        let all = self.vertices_of(vb);
        let vertices = all[first as usize..(first + count) as usize].to_vec();
        self.record(mode, false, first, count, vertices);
    }

    fn draw_indexed(&mut self, first_index: u32, index_count: u32) {
        let (vb, ib) = self.pass.expect("draw outside pass");
        let all = self.vertices_of(vb);
        let indices = self.indices_of(ib);
        let vertices = indices[first_index as usize..(first_index + index_count) as usize]
            .iter()
            .map(|&i| all[i as usize])
            .collect();
        self.record(DrawMode::Quads, true, first_index, index_count, vertices);
    }

    fn end_pass(&mut self) {
        assert!(self.pass.take().is_some(), "end without begin");
        self.passes += 1;
    }

    fn texture_format(&self, texture: TextureHandle) -> Option<TextureFormat> {
        self.textures.get(&texture.0).map(|(desc, _)| desc.format)
    }
}
