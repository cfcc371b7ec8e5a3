//! wgpu implementation of [`GpuBackend`].
//!
//! Resources live in slot tables indexed by handle. A pass is recorded on the
//! CPU between `begin_pass` and `end_pass`; `end_pass` uploads the per-draw
//! uniforms once, then encodes and submits a single render pass.

use std::collections::HashMap;
use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use super::backend::{
    BufferHandle, GpuBackend, ResourceError, ScissorRect, ShaderHandle, ShaderSource,
    ShaderUniforms, TextureDesc, TextureFormat, TextureHandle,
};
use super::vertex::{DrawMode, Vertex};

/// Depth attachment format every target must provide.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Color + depth views a pass renders into.
pub struct FrameTarget {
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    /// Physical pixels.
    pub width: u32,
    pub height: u32,
}

// ── slot table ────────────────────────────────────────────────────────────

/// Low bits of a handle id address the slot, high bits carry the slot's
/// generation, so a handle to a freed resource never reaches its successor.
const INDEX_BITS: u32 = 20;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = u32::MAX >> INDEX_BITS;

struct Slot<T> {
    generation: u32,
    item: Option<T>,
}

struct Slots<T> {
    items: Vec<Slot<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Slots<T> {
    fn id(index: usize, generation: u32) -> u32 {
        (generation << INDEX_BITS) | index as u32
    }

    fn insert(&mut self, item: T) -> u32 {
        if let Some(i) = self.items.iter().position(|s| s.item.is_none()) {
            let slot = &mut self.items[i];
            slot.item = Some(item);
            return Self::id(i, slot.generation);
        }
        self.items.push(Slot { generation: 0, item: Some(item) });
        Self::id(self.items.len() - 1, 0)
    }

    fn slot(&self, id: u32) -> Option<&Slot<T>> {
        self.items
            .get((id & INDEX_MASK) as usize)
            .filter(|s| s.generation == id >> INDEX_BITS)
    }

    fn get(&self, id: u32) -> Option<&T> {
        self.slot(id).and_then(|s| s.item.as_ref())
    }

    fn remove(&mut self, id: u32) -> Option<T> {
        self.slot(id)?;
        let slot = &mut self.items[(id & INDEX_MASK) as usize];
        let item = slot.item.take()?;
        slot.generation = (slot.generation + 1) & GENERATION_MASK;
        Some(item)
    }
}

// ── resources ─────────────────────────────────────────────────────────────

struct GpuShader {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: TextureDesc,
}

#[derive(Copy, Clone)]
enum DrawRange {
    Arrays { first: u32, count: u32 },
    Indexed { first_index: u32, count: u32 },
}

#[derive(Copy, Clone)]
struct PendingDraw {
    shader: ShaderHandle,
    topology: wgpu::PrimitiveTopology,
    texture: Option<TextureHandle>,
    scissor: Option<ScissorRect>,
    uniform_offset: u32,
    range: DrawRange,
}

struct PassRecording {
    vertices: BufferHandle,
    indices: BufferHandle,
    uniforms: Vec<u8>,
    uniform_offset: Option<u32>,
    shader: Option<ShaderHandle>,
    texture: Option<TextureHandle>,
    scissor: Option<ScissorRect>,
    draws: Vec<PendingDraw>,
}

// ── backend ───────────────────────────────────────────────────────────────

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,

    buffers: Slots<wgpu::Buffer>,
    textures: Slots<GpuTexture>,
    shaders: Slots<GpuShader>,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(ShaderHandle, wgpu::PrimitiveTopology), wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    white: GpuTexture,

    uniform_buffer: wgpu::Buffer,
    uniform_stride: u32,
    uniform_slots: u32,
    uniform_generation: u64,
    bind_groups: HashMap<Option<TextureHandle>, (u64, wgpu::BindGroup)>,

    target: Option<FrameTarget>,
    pending_clear: Option<[f32; 4]>,
    pass: Option<PassRecording>,
}

fn uniform_binding_size() -> NonZeroU64 {
    NonZeroU64::new(std::mem::size_of::<ShaderUniforms>() as u64)
        .expect("ShaderUniforms is non-zero sized")
}

fn wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
        TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
    }
}

fn topology(mode: DrawMode) -> wgpu::PrimitiveTopology {
    match mode {
        DrawMode::Points => wgpu::PrimitiveTopology::PointList,
        DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
        DrawMode::Triangles | DrawMode::Quads => wgpu::PrimitiveTopology::TriangleList,
    }
}

/// Clamps `rect` to the target. `None` means "no scissor" and yields the
/// full target; a zero-area result yields `None` (skip the draw).
fn scissor_to_target(
    rect: Option<ScissorRect>,
    width: u32,
    height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let width = width.max(1);
    let height = height.max(1);

    let Some(r) = rect else {
        return Some((0, 0, width, height));
    };

    let x0 = r.x.min(width);
    let y0 = r.y.min(height);
    let x1 = r.x.saturating_add(r.width).min(width);
    let y1 = r.y.saturating_add(r.height).min(height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}

impl WgpuBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        let device = device.clone();
        let queue = queue.clone();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quill batch bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(uniform_binding_size()),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quill batch pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quill batch sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = Self::make_texture(
            &device,
            &queue,
            &TextureDesc { width: 1, height: 1, format: TextureFormat::Rgba8 },
            &[255; 4],
        );

        let align = device.limits().min_uniform_buffer_offset_alignment.max(1);
        let size = std::mem::size_of::<ShaderUniforms>() as u32;
        let uniform_stride = size.div_ceil(align) * align;
        let uniform_slots = 64;
        let uniform_buffer = Self::make_uniform_buffer(&device, uniform_stride, uniform_slots);

        Self {
            device,
            queue,
            color_format,
            buffers: Slots::default(),
            textures: Slots::default(),
            shaders: Slots::default(),
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            sampler,
            white,
            uniform_buffer,
            uniform_stride,
            uniform_slots,
            uniform_generation: 0,
            bind_groups: HashMap::new(),
            target: None,
            pending_clear: None,
            pass: None,
        }
    }

    /// Sets the views the next passes render into.
    pub fn set_target(&mut self, target: FrameTarget) {
        self.target = Some(target);
    }

    /// Drops the current target (e.g. before presenting its surface texture).
    pub fn take_target(&mut self) -> Option<FrameTarget> {
        self.target.take()
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Changes the color format; cached pipelines are rebuilt on next use.
    pub fn set_color_format(&mut self, format: wgpu::TextureFormat) {
        if self.color_format != format {
            self.color_format = format;
            self.pipelines.clear();
        }
    }

    /// Submits a pass that only clears, if a clear is still pending.
    pub fn finish_frame(&mut self) {
        if self.pending_clear.is_some() && self.pass.is_none() {
            let Some(target) = self.target.as_ref() else { return };
            let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quill clear encoder"),
            });
            let clear = self.pending_clear.take();
            drop(Self::begin_render_pass(&mut encoder, target, clear));
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    fn make_uniform_buffer(device: &wgpu::Device, stride: u32, slots: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill batch uniforms"),
            size: stride as u64 * slots as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn make_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        desc: &TextureDesc,
        data: &[u8],
    ) -> GpuTexture {
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("quill texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu_format(desc.format),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        Self::write_texture(queue, &texture, desc, data);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTexture { texture, view, desc: *desc }
    }

    fn write_texture(queue: &wgpu::Queue, texture: &wgpu::Texture, desc: &TextureDesc, data: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * desc.format.bytes_per_texel() as u32),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn create_module(&self, label: &str, stage: &str, code: &str) -> Result<wgpu::ShaderModule, ResourceError> {
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(code.into()),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(|m| m.message.clone())
            .collect();

        if !errors.is_empty() {
            return Err(ResourceError::ShaderCompile {
                label: format!("{label} ({stage})"),
                message: errors.join("; "),
            });
        }
        Ok(module)
    }

    fn ensure_uniform_capacity(&mut self, slots: u32) {
        if slots <= self.uniform_slots {
            return;
        }
        let new_slots = slots.next_power_of_two();
        self.uniform_buffer = Self::make_uniform_buffer(&self.device, self.uniform_stride, new_slots);
        self.uniform_slots = new_slots;
        self.uniform_generation += 1;
        log::debug!("uniform buffer grown to {new_slots} slots");
    }

    fn ensure_pipeline(&mut self, shader: ShaderHandle, topology: wgpu::PrimitiveTopology) -> bool {
        if self.pipelines.contains_key(&(shader, topology)) {
            return true;
        }
        let Some(program) = self.shaders.get(shader.0) else {
            log::warn!("draw references unknown shader {shader:?}; skipping");
            return false;
        };

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(program.label.as_str()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.fragment,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert((shader, topology), pipeline);
        true
    }

    fn ensure_bind_group(&mut self, texture: Option<TextureHandle>) {
        if let Some((generation, _)) = self.bind_groups.get(&texture) {
            if *generation == self.uniform_generation {
                return;
            }
        }

        let view = texture
            .and_then(|t| self.textures.get(t.0))
            .map_or(&self.white.view, |t| &t.view);

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quill batch bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.uniform_buffer,
                        offset: 0,
                        size: Some(uniform_binding_size()),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.bind_groups
            .insert(texture, (self.uniform_generation, bind_group));
    }

    fn begin_render_pass<'e>(
        encoder: &'e mut wgpu::CommandEncoder,
        target: &FrameTarget,
        clear: Option<[f32; 4]>,
    ) -> wgpu::RenderPass<'e> {
        let (color_load, depth_load) = match clear {
            Some([r, g, b, a]) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                }),
                wgpu::LoadOp::Clear(1.0),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("quill batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn record(&mut self, mode: DrawMode, range: DrawRange) {
        let Some(pass) = self.pass.as_mut() else {
            log::warn!("draw outside of a pass ignored");
            return;
        };
        let (Some(shader), Some(uniform_offset)) = (pass.shader, pass.uniform_offset) else {
            log::warn!("draw without bound material or uniforms ignored");
            return;
        };
        pass.draws.push(PendingDraw {
            shader,
            topology: topology(mode),
            texture: pass.texture,
            scissor: pass.scissor,
            uniform_offset,
            range,
        });
    }
}

impl GpuBackend for WgpuBackend {
    fn create_vertex_buffer(&mut self, size: u64) -> BufferHandle {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quill vertex buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        BufferHandle(self.buffers.insert(buffer))
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> BufferHandle {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quill index buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        BufferHandle(self.buffers.insert(buffer))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let Some(buffer) = self.buffers.get(buffer.0) else {
            log::warn!("write to unknown buffer {buffer:?}");
            return;
        };
        self.queue.write_buffer(buffer, offset, data);
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(buffer.0) {
            buffer.destroy();
        }
    }

    fn compile_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, ResourceError> {
        let vertex = self.create_module(&source.label, "vertex", &source.vertex)?;
        let fragment = self.create_module(&source.label, "fragment", &source.fragment)?;
        let id = self.shaders.insert(GpuShader {
            label: source.label.to_string(),
            vertex,
            fragment,
        });
        log::debug!("compiled shader `{}` as {id}", source.label);
        Ok(ShaderHandle(id))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(shader.0);
        self.pipelines.retain(|(s, _), _| *s != shader);
    }

    fn create_texture(
        &mut self,
        desc: &TextureDesc,
        data: &[u8],
    ) -> Result<TextureHandle, ResourceError> {
        if desc.width == 0 || desc.height == 0 || data.len() != desc.byte_len() {
            return Err(ResourceError::TextureSize {
                width: desc.width,
                height: desc.height,
                expected: desc.byte_len(),
                actual: data.len(),
            });
        }
        let texture = Self::make_texture(&self.device, &self.queue, desc, data);
        Ok(TextureHandle(self.textures.insert(texture)))
    }

    fn update_texture(&mut self, texture: TextureHandle, data: &[u8]) {
        let Some(gpu) = self.textures.get(texture.0) else {
            log::warn!("update of unknown texture {texture:?}");
            return;
        };
        if data.len() != gpu.desc.byte_len() {
            log::warn!(
                "texture update size mismatch: expected {}, got {}",
                gpu.desc.byte_len(),
                data.len()
            );
            return;
        }
        Self::write_texture(&self.queue, &gpu.texture, &gpu.desc, data);
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(gpu) = self.textures.remove(texture.0) {
            gpu.texture.destroy();
        }
        self.bind_groups.remove(&Some(texture));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.pending_clear = Some(color);
    }

    fn begin_pass(&mut self, vertices: BufferHandle, indices: BufferHandle) {
        if self.pass.is_some() {
            log::warn!("begin_pass while a pass is open; previous pass discarded");
        }
        self.pass = Some(PassRecording {
            vertices,
            indices,
            uniforms: Vec::new(),
            uniform_offset: None,
            shader: None,
            texture: None,
            scissor: None,
            draws: Vec::new(),
        });
    }

    fn bind_material(&mut self, shader: ShaderHandle, texture: Option<TextureHandle>) {
        if let Some(pass) = self.pass.as_mut() {
            pass.shader = Some(shader);
            pass.texture = texture;
        }
    }

    fn set_uniforms(&mut self, uniforms: &ShaderUniforms) {
        let stride = self.uniform_stride as usize;
        let Some(pass) = self.pass.as_mut() else { return };
        let offset = pass.uniforms.len();
        pass.uniforms.extend_from_slice(bytemuck::bytes_of(uniforms));
        pass.uniforms.resize(offset + stride, 0);
        pass.uniform_offset = Some(offset as u32);
    }

    fn set_scissor(&mut self, rect: Option<ScissorRect>) {
        if let Some(pass) = self.pass.as_mut() {
            pass.scissor = rect;
        }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.record(mode, DrawRange::Arrays { first, count });
    }

    fn draw_indexed(&mut self, first_index: u32, index_count: u32) {
        self.record(
            DrawMode::Quads,
            DrawRange::Indexed { first_index, count: index_count },
        );
    }

    fn end_pass(&mut self) {
        let Some(pass) = self.pass.take() else { return };

        if self.target.is_none() {
            log::warn!("no frame target; dropping {} draws", pass.draws.len());
            return;
        }

        let slots = (pass.uniforms.len() / self.uniform_stride as usize) as u32;
        self.ensure_uniform_capacity(slots.max(1));

        let mut draws = Vec::with_capacity(pass.draws.len());
        for draw in &pass.draws {
            if !self.ensure_pipeline(draw.shader, draw.topology) {
                continue;
            }
            self.ensure_bind_group(draw.texture);
            draws.push(*draw);
        }

        if !pass.uniforms.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &pass.uniforms);
        }

        let clear = self.pending_clear.take();
        let Some(target) = self.target.as_ref() else { return };
        let (Some(vertices), Some(indices)) =
            (self.buffers.get(pass.vertices.0), self.buffers.get(pass.indices.0))
        else {
            log::warn!("pass references unknown buffers; skipping");
            return;
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("quill batch encoder"),
        });

        {
            let mut rpass = Self::begin_render_pass(&mut encoder, target, clear);
            rpass.set_vertex_buffer(0, vertices.slice(..));
            rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &draws {
                let Some(pipeline) = self.pipelines.get(&(draw.shader, draw.topology)) else {
                    continue;
                };
                let Some((_, bind_group)) = self.bind_groups.get(&draw.texture) else {
                    continue;
                };
                let Some((x, y, w, h)) = scissor_to_target(draw.scissor, target.width, target.height)
                else {
                    continue;
                };

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, bind_group, &[draw.uniform_offset]);
                rpass.set_scissor_rect(x, y, w, h);

                match draw.range {
                    DrawRange::Arrays { first, count } => rpass.draw(first..first + count, 0..1),
                    DrawRange::Indexed { first_index, count } => {
                        rpass.draw_indexed(first_index..first_index + count, 0, 0..1)
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn texture_format(&self, texture: TextureHandle) -> Option<TextureFormat> {
        self.textures.get(texture.0).map(|t| t.desc.format)
    }
}
