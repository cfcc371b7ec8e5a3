use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::coords::{Mat4, Rect, Vec2, ortho_top_left};
use crate::paint::{Color, PathKind, PathStyle};
use crate::path::{EllipticalArc, PathBuilder};
use crate::render::texture::load_image;
use crate::render::{
    Batch, BatchStats, DrawMode, GpuBackend, Material, Mesh, MeshData, ResourceError, ScissorRect,
    ShaderHandle, TextureDesc, TextureFormat, TextureHandle, VertexStyle, shaders,
};
use crate::text::{self, FontFace, FontId, FontLoadError, FontSystem, FontdueFace, TextStyle};

use super::config::ContextConfig;

/// Handle to a mesh owned by a [`Context`]. Slots are never reused, so a
/// handle to an unloaded mesh stays invalid.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshId(u32);

/// Immediate-mode drawing context.
///
/// Owns the batch renderer (and through it the GPU backend), the path
/// builder, every loaded font and texture, and the per-frame projection and
/// scissor state. Everything it created is released on drop.
pub struct Context<B: GpuBackend> {
    pub(super) batch: Batch<B>,
    pub(super) path: PathBuilder,
    fonts: FontSystem,

    sdf_shader: ShaderHandle,
    shaders: Vec<ShaderHandle>,
    textures: Vec<TextureHandle>,
    meshes: Vec<Option<Mesh>>,

    atlas_size: u32,
    clear_color: Color,
    viewport: Vec2,
}

impl<B: GpuBackend> Context<B> {
    /// Builds the batch and compiles the built-in shaders.
    ///
    /// Fails when either built-in shader does not compile.
    pub fn new(backend: B, config: ContextConfig) -> Result<Self> {
        let mut batch = Batch::new(backend, &config.batch)?;

        let sdf_shader = match batch.backend_mut().compile_shader(&shaders::sdf_shader()) {
            Ok(handle) => handle,
            Err(err) => {
                log::error!("{err}");
                return Err(err).context("SDF text shader is required");
            }
        };

        log::info!(
            "context ready: {} vertices, atlas {}x{}",
            batch.vertex_capacity(),
            config.atlas_size,
            config.atlas_size
        );

        Ok(Self {
            batch,
            path: PathBuilder::new(),
            fonts: FontSystem::new(),
            sdf_shader,
            shaders: Vec::new(),
            textures: Vec::new(),
            meshes: Vec::new(),
            atlas_size: config.atlas_size,
            clear_color: config.clear_color,
            viewport: Vec2::zero(),
        })
    }

    /// Releases every resource. Dropping the context does the same.
    pub fn terminate(self) {
        drop(self);
    }

    #[inline]
    pub fn batch(&self) -> &Batch<B> {
        &self.batch
    }

    #[inline]
    pub fn batch_mut(&mut self) -> &mut Batch<B> {
        &mut self.batch
    }

    #[inline]
    pub fn backend(&self) -> &B {
        self.batch.backend()
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        self.batch.backend_mut()
    }

    #[inline]
    pub fn default_shader(&self) -> ShaderHandle {
        self.batch.default_shader()
    }

    #[inline]
    pub fn sdf_shader(&self) -> ShaderHandle {
        self.sdf_shader
    }

    #[inline]
    pub fn stats(&self) -> BatchStats {
        self.batch.stats()
    }

    #[inline]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    // ── frame ─────────────────────────────────────────────────────────────

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Starts a frame of `width x height` pixels: clears, installs the
    /// top-left orthographic projection, resets depth, stats and scissor.
    pub fn new_frame(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
        self.batch.clear(self.clear_color.to_rgba_f32());
        self.batch
            .set_projection(ortho_top_left(self.viewport.x, self.viewport.y));
        self.batch.reset_depth();
        self.batch.reset_stats();
        self.batch.set_scissor(None);
    }

    /// Submits everything recorded this frame.
    pub fn end_frame(&mut self) {
        self.batch.flush();
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.batch.set_projection(projection);
    }

    /// Restricts subsequent draws to `rect` (pixels); `None` lifts it.
    pub fn set_scissor(&mut self, rect: Option<Rect>) {
        let scissor = rect.map(|r| to_scissor(r, self.viewport));
        self.batch.set_scissor(scissor);
    }

    // ── immediate primitives ──────────────────────────────────────────────

    #[inline]
    pub fn begin(&mut self, mode: DrawMode) {
        self.batch.begin(mode);
    }

    #[inline]
    pub fn begin_with(&mut self, mode: DrawMode, material: Material) {
        self.batch.begin_with(mode, material);
    }

    #[inline]
    pub fn vertex(&mut self, position: [f32; 3], style: &VertexStyle) {
        self.batch.vertex(position, style);
    }

    #[inline]
    pub fn vertex2(&mut self, point: Vec2, style: &VertexStyle) {
        self.batch.vertex2(point, style);
    }

    #[inline]
    pub fn end(&mut self) {
        self.batch.end();
    }

    #[inline]
    pub fn flush(&mut self) {
        self.batch.flush();
    }

    // ── paths ─────────────────────────────────────────────────────────────

    pub fn begin_path(&mut self, kind: PathKind) {
        self.path.begin_path(kind);
    }

    pub fn set_stroke_enabled(&mut self, enabled: bool) {
        self.path.set_stroke_enabled(enabled);
    }

    pub fn set_fill_enabled(&mut self, enabled: bool) {
        self.path.set_fill_enabled(enabled);
    }

    pub fn line_to(&mut self, point: Vec2) {
        self.path.line_to(point);
    }

    pub fn arc(&mut self, center: Vec2, start_deg: f32, end_deg: f32, radius: f32, segments: u32) {
        self.path.arc(center, start_deg, end_deg, radius, segments);
    }

    pub fn elliptical_arc(&mut self, arc: &EllipticalArc, segments: u32) {
        self.path.elliptical_arc(arc, segments);
    }

    pub fn quadratic_bezier_to(&mut self, ctrl: Vec2, end: Vec2, segments: u32) {
        self.path.quadratic_bezier_to(ctrl, end, segments);
    }

    pub fn cubic_bezier_to(&mut self, c1: Vec2, c2: Vec2, end: Vec2, segments: u32) {
        self.path.cubic_bezier_to(c1, c2, end, segments);
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.path.set_stroke_color(color);
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.path.set_stroke_width(width);
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.path.set_fill_color(color);
    }

    pub fn set_style(&mut self, style: PathStyle) {
        self.path.set_style(style);
    }

    pub fn end_path(&mut self, closed: bool) {
        self.path.end_path(&mut self.batch, closed);
    }

    pub fn close_path(&mut self) {
        self.path.close_path(&mut self.batch);
    }

    // ── resources ─────────────────────────────────────────────────────────

    /// Compiles a custom program. On failure the error is logged and the
    /// default shader is returned instead.
    pub fn load_shader(
        &mut self,
        vertex: impl Into<Cow<'static, str>>,
        fragment: impl Into<Cow<'static, str>>,
    ) -> ShaderHandle {
        let source = crate::render::ShaderSource {
            label: Cow::Owned(format!("custom shader {}", self.shaders.len())),
            vertex: vertex.into(),
            fragment: fragment.into(),
        };

        match self.batch.backend_mut().compile_shader(&source) {
            Ok(handle) => {
                self.shaders.push(handle);
                handle
            }
            Err(err) => {
                log::error!("{err}; falling back to the default shader");
                self.batch.default_shader()
            }
        }
    }

    /// Releases a custom shader. Built-in shaders are left alone.
    pub fn unload_shader(&mut self, shader: ShaderHandle) {
        if let Some(i) = self.shaders.iter().position(|&s| s == shader) {
            self.shaders.swap_remove(i);
            self.batch.backend_mut().destroy_shader(shader);
        }
    }

    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle, ResourceError> {
        let image = load_image(path.as_ref()).inspect_err(|err| log::error!("{err}"))?;
        self.create_texture(&image.desc(), &image.bytes)
    }

    pub fn load_texture_from_memory(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
        bytes: &[u8],
    ) -> Result<TextureHandle, ResourceError> {
        self.create_texture(&TextureDesc { width, height, format }, bytes)
    }

    fn create_texture(&mut self, desc: &TextureDesc, bytes: &[u8]) -> Result<TextureHandle, ResourceError> {
        let texture = self
            .batch
            .backend_mut()
            .create_texture(desc, bytes)
            .inspect_err(|err| log::error!("{err}"))?;
        self.textures.push(texture);
        Ok(texture)
    }

    /// Flushes pending draws (they may reference the texture) and releases it.
    pub fn unload_texture(&mut self, texture: TextureHandle) {
        let Some(i) = self.textures.iter().position(|&t| t == texture) else {
            log::warn!("unload of unknown texture {texture:?}");
            return;
        };
        self.batch.flush();
        self.textures.swap_remove(i);
        self.batch.backend_mut().destroy_texture(texture);
    }

    pub fn load_font(&mut self, path: impl AsRef<Path>, size: f32) -> Result<FontId, FontLoadError> {
        let face = FontdueFace::from_path(path.as_ref(), size).inspect_err(|err| log::error!("{err}"))?;
        self.load_font_face(Box::new(face), size)
    }

    pub fn load_font_from_bytes(&mut self, bytes: &[u8], size: f32) -> Result<FontId, FontLoadError> {
        let face = FontdueFace::from_bytes(bytes, size).inspect_err(|err| log::error!("{err}"))?;
        self.load_font_face(Box::new(face), size)
    }

    /// Loads any [`FontFace`] implementation.
    pub fn load_font_face(&mut self, face: Box<dyn FontFace>, size: f32) -> Result<FontId, FontLoadError> {
        self.fonts
            .load(self.batch.backend_mut(), face, size, self.atlas_size)
            .inspect_err(|err| log::error!("{err}"))
    }

    pub fn unload_font(&mut self, font: FontId) {
        self.batch.flush();
        self.fonts.unload(self.batch.backend_mut(), font);
    }

    pub fn fonts(&self) -> &FontSystem {
        &self.fonts
    }

    // ── meshes ────────────────────────────────────────────────────────────

    /// Keeps `data` on the CPU without uploading it.
    pub fn create_mesh(&mut self, data: MeshData) -> Result<MeshId, ResourceError> {
        let mesh = Mesh::new(data).inspect_err(|err| log::error!("{err}"))?;
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(Some(mesh));
        Ok(id)
    }

    /// Creates, uploads, then drops the CPU copy.
    pub fn load_mesh(&mut self, data: MeshData) -> Result<MeshId, ResourceError> {
        let id = self.create_mesh(data)?;
        self.upload_mesh(id);
        self.delete_mesh_cpu_data(id);
        Ok(id)
    }

    /// Uploads the CPU copy into mesh-owned buffers. No-op once uploaded.
    pub fn upload_mesh(&mut self, mesh: MeshId) -> bool {
        let Some(Some(entry)) = self.meshes.get_mut(mesh.0 as usize) else {
            log::warn!("upload of unknown mesh {mesh:?}");
            return false;
        };
        entry.upload(self.batch.backend_mut())
    }

    pub fn delete_mesh_cpu_data(&mut self, mesh: MeshId) {
        if let Some(Some(entry)) = self.meshes.get_mut(mesh.0 as usize) {
            entry.delete_cpu_data();
        }
    }

    pub fn mesh(&self, mesh: MeshId) -> Option<&Mesh> {
        self.meshes.get(mesh.0 as usize)?.as_ref()
    }

    /// Draws an uploaded mesh after everything batched so far.
    pub fn draw_mesh(&mut self, mesh: MeshId, transform: &Mat4, material: Material) {
        let Some(Some(entry)) = self.meshes.get(mesh.0 as usize) else {
            log::warn!("draw_mesh with unknown mesh {mesh:?}");
            return;
        };
        self.batch.draw_mesh(entry, transform, material);
    }

    /// Frees the mesh's buffers and CPU copy.
    pub fn unload_mesh(&mut self, mesh: MeshId) {
        let Some(mut entry) = self.meshes.get_mut(mesh.0 as usize).and_then(Option::take) else {
            log::warn!("unload of unknown mesh {mesh:?}");
            return;
        };
        entry.release(self.batch.backend_mut());
    }

    // ── text ──────────────────────────────────────────────────────────────

    /// Draws `text` with `position` on the first baseline.
    pub fn draw_text(&mut self, font: FontId, text: &str, position: Vec2, style: &TextStyle) {
        let Some(loaded) = self.fonts.get_mut(font) else {
            log::warn!("draw_text with unknown font {font:?}");
            return;
        };
        text::draw_text(&mut self.batch, loaded, self.sdf_shader, text, position, style);
    }

    pub fn measure_text(&mut self, font: FontId, text: &str) -> Vec2 {
        let Some(loaded) = self.fonts.get_mut(font) else {
            log::warn!("measure_text with unknown font {font:?}");
            return Vec2::zero();
        };
        text::measure_text(loaded, self.batch.backend_mut(), text)
    }
}

impl<B: GpuBackend> Drop for Context<B> {
    fn drop(&mut self) {
        let backend = self.batch.backend_mut();
        self.fonts.release_all(backend);
        for mut mesh in self.meshes.drain(..).flatten() {
            mesh.release(backend);
        }
        for texture in self.textures.drain(..) {
            backend.destroy_texture(texture);
        }
        for shader in self.shaders.drain(..) {
            backend.destroy_shader(shader);
        }
        backend.destroy_shader(self.sdf_shader);
        log::debug!("context released");
    }
}

/// Pixel scissor covering `rect`, clamped to the viewport.
fn to_scissor(rect: Rect, viewport: Vec2) -> ScissorRect {
    let screen = Rect::new(0.0, 0.0, viewport.x, viewport.y);
    let Some(clipped) = rect.intersect(screen) else {
        return ScissorRect::default();
    };

    let x0 = clipped.origin.x.floor().max(0.0);
    let y0 = clipped.origin.y.floor().max(0.0);
    let x1 = clipped.max().x.ceil();
    let y1 = clipped.max().y.ceil();

    ScissorRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingBackend;
    use crate::text::face::scripted::ScriptedFace;

    fn context() -> Context<RecordingBackend> {
        Context::new(RecordingBackend::default(), ContextConfig::default()).expect("context")
    }

    #[test]
    fn failing_sdf_shader_aborts_creation() {
        let mut backend = RecordingBackend::default();
        backend
            .failing_shaders
            .insert(shaders::sdf_shader().label.into_owned());
        assert!(Context::new(backend, ContextConfig::default()).is_err());
    }

    #[test]
    fn failing_custom_shader_falls_back_to_default() {
        let mut ctx = context();
        ctx.backend_mut()
            .failing_shaders
            .insert("custom shader 0".to_string());
        let handle = ctx.load_shader("vs", "fs");
        assert_eq!(handle, ctx.default_shader());
    }

    #[test]
    fn new_frame_clears_and_resets_depth() {
        let mut ctx = context();
        ctx.set_clear_color(Color::from_rgba8(255, 0, 0, 255));
        ctx.begin(DrawMode::Triangles);
        ctx.end();
        assert!(ctx.batch().depth() < 0.0);

        ctx.new_frame(800.0, 600.0);
        assert_eq!(ctx.batch().depth(), 0.0);
        assert_eq!(ctx.backend().clears.last(), Some(&[1.0, 0.0, 0.0, 1.0]));
        assert_eq!(ctx.batch().projection(), ortho_top_left(800.0, 600.0));
    }

    #[test]
    fn scissor_is_converted_and_clamped() {
        assert_eq!(
            to_scissor(Rect::new(10.5, 20.0, 100.0, 1000.0), Vec2::new(800.0, 600.0)),
            ScissorRect { x: 10, y: 20, width: 101, height: 580 }
        );
        assert_eq!(
            to_scissor(Rect::new(900.0, 0.0, 10.0, 10.0), Vec2::new(800.0, 600.0)),
            ScissorRect::default()
        );
    }

    #[test]
    fn path_round_trip_through_context() {
        let mut ctx = context();
        ctx.new_frame(100.0, 100.0);
        ctx.begin_path(PathKind::FILL);
        ctx.set_fill_color(Color::WHITE);
        ctx.line_to(Vec2::new(0.0, 0.0));
        ctx.line_to(Vec2::new(10.0, 0.0));
        ctx.line_to(Vec2::new(5.0, 10.0));
        ctx.end_path(false);
        ctx.end_frame();

        let draws = &ctx.backend().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices.len(), 3);
        assert_eq!(ctx.stats().draw_calls, 1);
    }

    #[test]
    fn text_uses_atlas_and_sdf_shader() {
        let mut ctx = context();
        let font = ctx
            .load_font_face(Box::new(ScriptedFace::new(&[('H', 8.0), ('i', 4.0)])), 16.0)
            .expect("font");
        ctx.new_frame(200.0, 100.0);
        ctx.draw_text(font, "Hi", Vec2::new(10.0, 50.0), &TextStyle::default());
        ctx.end_frame();

        let draw = &ctx.backend().draws[0];
        assert_eq!(draw.shader, ctx.sdf_shader());
        assert_eq!(draw.texture, Some(ctx.fonts().get(font).expect("font").atlas().texture()));
        assert_eq!(draw.vertices.len(), 12);
    }

    #[test]
    fn unknown_font_draws_nothing() {
        let mut ctx = context();
        let font = ctx
            .load_font_face(Box::new(ScriptedFace::new(&[('a', 8.0)])), 16.0)
            .expect("font");
        ctx.unload_font(font);
        ctx.draw_text(font, "a", Vec2::zero(), &TextStyle::default());
        ctx.end_frame();
        assert!(ctx.backend().draws.is_empty());
    }

    #[test]
    fn textures_are_tracked_and_released() {
        let mut ctx = context();
        let texture = ctx
            .load_texture_from_memory(2, 2, TextureFormat::R8, &[0, 1, 2, 3])
            .expect("texture");
        assert!(ctx.backend().texture_data(texture).is_some());

        assert!(ctx
            .load_texture_from_memory(2, 2, TextureFormat::Rgba8, &[0; 3])
            .is_err());

        ctx.unload_texture(texture);
        assert!(ctx.backend().texture_data(texture).is_none());
    }

    #[test]
    fn missing_texture_file_is_an_error() {
        let mut ctx = context();
        assert!(matches!(
            ctx.load_texture("/no/such/image.png"),
            Err(ResourceError::ImageDecode { .. })
        ));
    }

    fn triangle_mesh() -> MeshData {
        MeshData::new(vec![[0.0, 0.0, 0.0], [8.0, 0.0, 0.0], [0.0, 8.0, 0.0]]).with_indices(vec![0, 1, 2])
    }

    #[test]
    fn meshes_are_loaded_drawn_and_unloaded() {
        let mut ctx = context();
        let baseline = ctx.backend().live_buffers();

        let mesh = ctx.load_mesh(triangle_mesh()).expect("mesh");
        assert_eq!(ctx.backend().live_buffers(), baseline + 2);
        assert!(ctx
            .mesh(mesh)
            .is_some_and(|m| m.is_uploaded() && m.cpu_data().is_none()));

        ctx.new_frame(64.0, 64.0);
        ctx.draw_mesh(mesh, &crate::coords::IDENTITY, Material::default());
        let draws = &ctx.backend().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertices[1].position, [8.0, 0.0, 0.0]);
        assert_eq!(draws[0].projection, ortho_top_left(64.0, 64.0));

        ctx.unload_mesh(mesh);
        assert_eq!(ctx.backend().live_buffers(), baseline);
        assert!(ctx.mesh(mesh).is_none());

        ctx.draw_mesh(mesh, &crate::coords::IDENTITY, Material::default());
        assert_eq!(ctx.backend().draws.len(), 1);
    }

    #[test]
    fn created_mesh_waits_for_upload() {
        let mut ctx = context();
        let baseline = ctx.backend().live_buffers();

        let mesh = ctx.create_mesh(triangle_mesh()).expect("mesh");
        assert_eq!(ctx.backend().live_buffers(), baseline);
        assert!(ctx.mesh(mesh).is_some_and(|m| m.cpu_data().is_some()));

        assert!(ctx.upload_mesh(mesh));
        assert_eq!(ctx.backend().live_buffers(), baseline + 2);
    }

    #[test]
    fn empty_mesh_is_an_error() {
        let mut ctx = context();
        assert!(matches!(
            ctx.load_mesh(MeshData::default()),
            Err(ResourceError::EmptyMesh)
        ));
    }
}
