//! Batch renderer.
//!
//! Accumulates vertices into a fixed-capacity buffer and records one
//! [`DrawCall`] per run of identical (mode, material, scissor) state. Nothing
//! reaches the GPU until [`Batch::flush`], which is also triggered implicitly
//! whenever the vertex buffer or the draw-call table runs out of room.

use anyhow::{Context as _, Result};

use crate::coords::{self, IDENTITY, Mat4, Vec2};

use super::backend::{
    BufferHandle, GpuBackend, ScissorRect, ShaderHandle, ShaderUniforms, TextureFormat,
    TextureHandle, TextureMode,
};
use super::buffer::{DrawCallTable, VertexArena};
use super::mesh::Mesh;
use super::shaders;
use super::vertex::{DrawCall, DrawMode, Material, Vertex, VertexStyle};

/// Depth advanced by [`Batch::end`] after every primitive group.
pub const DEPTH_STEP: f32 = 0.0001;

/// Depth advanced per glyph inside a text run.
pub const GLYPH_DEPTH_STEP: f32 = 0.00001;

/// Capacity settings for a [`Batch`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Vertex buffer size, in quads (4 vertices each).
    pub quad_capacity: usize,
    /// Draw calls recorded before a forced flush.
    pub draw_call_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            quad_capacity: 5000,
            draw_call_capacity: 256,
        }
    }
}

/// Counters since the last [`Batch::reset_stats`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct BatchStats {
    pub vertices: u64,
    pub draw_calls: u64,
    pub flushes: u64,
}

/// Builds the shared quad index list: quad `k` covers vertices `4k..4k+4` as
/// the two triangles `(0, 1, 2)` and `(0, 2, 3)`.
pub fn quad_indices(quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quads * 6);
    for k in 0..quads as u32 {
        let base = 4 * k;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}

pub struct Batch<B: GpuBackend> {
    backend: B,

    vertices: VertexArena,
    draws: DrawCallTable,

    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    default_shader: ShaderHandle,

    projection: Mat4,
    scissor: Option<ScissorRect>,
    depth: f32,

    stats: BatchStats,
}

impl<B: GpuBackend> Batch<B> {
    /// Allocates CPU and GPU storage and compiles the default shader.
    ///
    /// Fails only when the default shader does not compile: every draw call
    /// without an explicit shader falls back to it.
    pub fn new(mut backend: B, config: &BatchConfig) -> Result<Self> {
        let quads = config.quad_capacity.max(1);
        let capacity = quads * 4;

        let default_shader = backend
            .compile_shader(&shaders::default_shader())
            .context("default shader is required for batching")?;

        let vertex_buffer =
            backend.create_vertex_buffer((capacity * std::mem::size_of::<Vertex>()) as u64);
        let index_buffer = backend.create_index_buffer(&quad_indices(quads));

        log::debug!(
            "batch created: {capacity} vertices, {} draw calls",
            config.draw_call_capacity
        );

        Ok(Self {
            backend,
            vertices: VertexArena::new(capacity),
            draws: DrawCallTable::new(config.draw_call_capacity),
            vertex_buffer,
            index_buffer,
            default_shader,
            projection: IDENTITY,
            scissor: None,
            depth: 0.0,
            stats: BatchStats::default(),
        })
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn default_shader(&self) -> ShaderHandle {
        self.default_shader
    }

    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// Vertices waiting for the next flush, padding included.
    #[inline]
    pub fn pending_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Draw calls recorded since the last flush, the open one included.
    #[inline]
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.draws.iter()
    }

    #[inline]
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = BatchStats::default();
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    #[inline]
    pub fn scissor(&self) -> Option<ScissorRect> {
        self.scissor
    }

    /// Scissor state applied to draw calls opened from now on.
    #[inline]
    pub fn set_scissor(&mut self, scissor: Option<ScissorRect>) {
        self.scissor = scissor;
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.depth
    }

    #[inline]
    pub fn reset_depth(&mut self) {
        self.depth = 0.0;
    }

    /// Moves the depth counter towards the viewer by `amount`.
    #[inline]
    pub fn step_depth(&mut self, amount: f32) {
        self.depth -= amount;
    }

    pub fn clear(&mut self, color: [f32; 4]) {
        self.backend.clear(color);
    }

    // ── emission ──────────────────────────────────────────────────────────

    /// Starts (or continues) a primitive group with the default material.
    #[inline]
    pub fn begin(&mut self, mode: DrawMode) {
        self.begin_with(mode, Material::default());
    }

    /// Starts (or continues) a primitive group with `material`.
    ///
    /// Consecutive groups with identical mode, material and scissor share one
    /// draw call.
    pub fn begin_with(&mut self, mode: DrawMode, material: Material) {
        let scissor = self.scissor;
        let current = self.draws.current();
        if current.matches(mode, material, scissor) {
            return;
        }

        let fresh = DrawCall {
            mode: Some(mode),
            material,
            scissor,
            ..DrawCall::default()
        };

        if current.vertex_count == 0 {
            *self.draws.current_mut() = fresh;
            return;
        }

        self.open_call(fresh);
    }

    /// Closes the current call (padding it to a quad boundary) and opens
    /// `fresh`, flushing first if either table runs out of room.
    fn open_call(&mut self, fresh: DrawCall) {
        let padding = self.draws.current().alignment_padding();

        if self.draws.is_full() || !self.vertices.skip(padding as usize) {
            log::trace!("batch full on new draw call; flushing");
            self.flush();
            *self.draws.current_mut() = fresh;
            return;
        }

        self.draws.current_mut().padding = padding;
        self.draws.open(fresh);
    }

    /// Appends one vertex to the current draw call.
    pub fn vertex(&mut self, position: [f32; 3], style: &VertexStyle) {
        self.ensure_room(1);

        let pushed = self.vertices.push(Vertex {
            position,
            normal: style.normal,
            uv: style.uv,
            color: style.color,
            color2: style.color2,
            _pad: [0; 2],
        });

        if pushed {
            self.draws.current_mut().vertex_count += 1;
            self.stats.vertices += 1;
        }
    }

    /// Appends a 2D vertex at the current depth.
    #[inline]
    pub fn vertex2(&mut self, point: Vec2, style: &VertexStyle) {
        self.vertex([point.x, point.y, self.depth], style);
    }

    /// Flushes up front when `count` vertices would not fit in what is left
    /// but would fit in an empty buffer, so a primitive group stays in one call.
    pub fn reserve(&mut self, count: usize) {
        if self.vertices.has_room(count) || self.vertices.is_empty() {
            return;
        }
        if count <= self.vertices.capacity() {
            self.ensure_room(count);
        }
    }

    /// Ends a primitive group.
    #[inline]
    pub fn end(&mut self) {
        self.depth -= DEPTH_STEP;
    }

    /// Flushes when fewer than `count` slots are left. Vertices of a primitive
    /// that is still incomplete are moved into the fresh buffer so no triangle
    /// is split across submissions.
    fn ensure_room(&mut self, count: usize) {
        if self.vertices.has_room(count) {
            return;
        }

        let current = *self.draws.current();
        let partial = current
            .mode
            .map_or(0, |mode| current.vertex_count % mode.vertices_per_primitive());

        let carried = self.vertices.split_off_tail(partial as usize);
        self.draws.current_mut().vertex_count -= partial;

        log::trace!("vertex buffer full; flushing and carrying {partial} vertices");
        self.flush();

        for v in carried {
            if self.vertices.push(v) {
                self.draws.current_mut().vertex_count += 1;
            }
        }
    }

    // ── submission ────────────────────────────────────────────────────────

    /// Uploads pending vertices and submits every recorded draw call in order.
    ///
    /// The open call's mode, material and scissor survive the flush, so
    /// emission can continue right after it.
    pub fn flush(&mut self) {
        let current = *self.draws.current();
        let carry_over = DrawCall {
            vertex_count: 0,
            padding: 0,
            ..current
        };

        if self.vertices.is_empty() {
            self.draws.reset(carry_over);
            return;
        }

        self.backend.write_buffer(
            self.vertex_buffer,
            0,
            bytemuck::cast_slice(self.vertices.as_slice()),
        );
        self.backend.begin_pass(self.vertex_buffer, self.index_buffer);

        let mut offset = 0u32;
        let mut submitted = 0u64;

        for call in self.draws.iter() {
            let start = offset;
            offset += call.vertex_count + call.padding;

            let Some(mode) = call.mode else { continue };
            if call.vertex_count == 0 {
                continue;
            }

            let shader = call.material.shader.unwrap_or(self.default_shader);
            let (texture, texture_mode) = self.resolve_texture(call.material.texture);

            self.backend.bind_material(shader, texture);
            self.backend
                .set_uniforms(&ShaderUniforms::new(self.projection, texture_mode));
            self.backend.set_scissor(call.scissor);

            match mode {
                DrawMode::Quads => {
                    self.backend
                        .draw_indexed(start / 4 * 6, call.vertex_count / 4 * 6);
                }
                DrawMode::Points | DrawMode::Lines | DrawMode::Triangles => {
                    self.backend.draw_arrays(mode, start, call.vertex_count);
                }
            }
            submitted += 1;
        }

        self.backend.end_pass();

        self.stats.flushes += 1;
        self.stats.draw_calls += submitted;

        self.vertices.clear();
        self.draws.reset(carry_over);
    }

    /// Submits an uploaded mesh as its own pass, after everything batched
    /// so far.
    ///
    /// `transform` maps mesh space to pixel space. The mesh is placed at the
    /// current depth and the counter steps once, so later primitives draw
    /// over it.
    pub fn draw_mesh(&mut self, mesh: &Mesh, transform: &Mat4, material: Material) {
        let Some(buffers) = mesh.buffers() else {
            log::error!("draw_mesh: mesh is not uploaded");
            return;
        };

        self.flush();

        let shader = material.shader.unwrap_or(self.default_shader);
        let (texture, texture_mode) = self.resolve_texture(material.texture);
        let model = coords::mul(&coords::translation(0.0, 0.0, self.depth), transform);
        let projection = coords::mul(&self.projection, &model);

        self.backend
            .begin_pass(buffers.vertices, buffers.indices.unwrap_or(self.index_buffer));
        self.backend.bind_material(shader, texture);
        self.backend
            .set_uniforms(&ShaderUniforms::new(projection, texture_mode));
        self.backend.set_scissor(self.scissor);
        if mesh.is_indexed() {
            self.backend.draw_indexed(0, mesh.index_count());
        } else {
            self.backend
                .draw_arrays(DrawMode::Triangles, 0, mesh.vertex_count());
        }
        self.backend.end_pass();

        self.depth -= DEPTH_STEP;
        self.stats.flushes += 1;
        self.stats.draw_calls += 1;
    }

    fn resolve_texture(&self, texture: Option<TextureHandle>) -> (Option<TextureHandle>, TextureMode) {
        let Some(t) = texture else {
            return (None, TextureMode::None);
        };
        match self.backend.texture_format(t) {
            Some(TextureFormat::R8) => (Some(t), TextureMode::SingleChannel),
            Some(TextureFormat::Rgba8) => (Some(t), TextureMode::Rgba),
            None => {
                log::warn!("draw call references unknown texture {t:?}; drawing untextured");
                (None, TextureMode::None)
            }
        }
    }
}

impl<B: GpuBackend> Drop for Batch<B> {
    fn drop(&mut self) {
        self.backend.destroy_buffer(self.vertex_buffer);
        self.backend.destroy_buffer(self.index_buffer);
        self.backend.destroy_shader(self.default_shader);
    }
}
