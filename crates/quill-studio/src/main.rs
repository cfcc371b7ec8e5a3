use std::time::Instant;

use anyhow::{Context as _, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use quill_engine::coords::{Rect, Vec2};
use quill_engine::core::{Context, ContextConfig, MeshId};
use quill_engine::device::{Gpu, GpuInit, SurfaceErrorAction};
use quill_engine::logging::{LoggingConfig, init_logging};
use quill_engine::paint::{Color, PathKind, PathStyle};
use quill_engine::path::EllipticalArc;
use quill_engine::render::{Material, MeshData, TextureFormat, TextureHandle, WgpuBackend};
use quill_engine::text::{FontId, TextStyle};

const FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut studio = Studio::default();
    event_loop
        .run_app(&mut studio)
        .context("winit event loop terminated with error")?;
    Ok(())
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Resources the demo scene draws with.
struct Scene {
    ctx: Context<WgpuBackend>,
    font: Option<FontId>,
    checker: Option<TextureHandle>,
    hexagon: Option<MeshId>,
    started: Instant,
}

#[derive(Default)]
struct Studio {
    // Declared before `entry`: the context's GPU objects go first.
    scene: Option<Scene>,
    entry: Option<WindowEntry>,
}

impl Studio {
    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("quill studio")
            .with_inner_size(LogicalSize::new(1024.0, 720.0));
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, GpuInit::default())),
        }
        .try_build()?;

        let backend = entry.with_gpu(|gpu| {
            WgpuBackend::new(gpu.device(), gpu.queue(), gpu.surface_format())
        });
        let config = ContextConfig {
            clear_color: Color::from_rgba8(24, 26, 32, 255),
            ..ContextConfig::default()
        };
        let mut ctx = Context::new(backend, config)?;

        let font = FONT_PATHS
            .iter()
            .find(|p| std::path::Path::new(p).exists())
            .and_then(|p| ctx.load_font(p, 22.0).ok());
        if font.is_none() {
            log::warn!("no system font found; text is skipped");
        }

        let checker = ctx
            .load_texture_from_memory(8, 8, TextureFormat::Rgba8, &checkerboard(8))
            .ok();

        let hexagon = ctx.load_mesh(hexagon()).ok();

        entry.with_window(|w| w.request_redraw());
        self.scene = Some(Scene {
            ctx,
            font,
            checker,
            hexagon,
            started: Instant::now(),
        });
        self.entry = Some(entry);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(scene), Some(entry)) = (self.scene.as_mut(), self.entry.as_mut()) else {
            return;
        };

        let mut fatal = false;
        entry.with_gpu_mut(|gpu| {
            let size = gpu.size();
            if size.width == 0 || size.height == 0 {
                return;
            }

            let frame = match gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    fatal = gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal;
                    return;
                }
            };

            scene.ctx.backend_mut().set_target(frame.target());
            scene.ctx.new_frame(size.width as f32, size.height as f32);
            scene.draw();
            scene.ctx.end_frame();
            scene.ctx.backend_mut().finish_frame();
            scene.ctx.backend_mut().take_target();

            gpu.present(frame);
        });

        if fatal {
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(e) = self.open(event_loop) {
            log::error!("failed to open studio window: {e:#}");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.scene = None;
                self.entry = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(size));
                    entry.with_window(|w| w.request_redraw());
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(size));
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

impl Scene {
    fn draw(&mut self) {
        let t = self.started.elapsed().as_secs_f32();
        let ctx = &mut self.ctx;

        ctx.draw_grid(
            Vec2::new(0.0, 0.0),
            32,
            24,
            Vec2::new(32.0, 32.0),
            Color::from_rgba8(40, 44, 52, 255),
        );

        // rectangles
        let accent = PathStyle {
            stroke_width: 3.0,
            stroke_color: Color::from_rgba8(250, 200, 80, 255),
            fill_color: Color::from_rgba8(70, 130, 220, 255),
        };
        ctx.draw_rectangle(
            Vec2::new(40.0, 40.0),
            Rect::new(0.0, 0.0, 160.0, 90.0),
            Vec2::zero(),
            0.0,
            0.0,
            PathKind::FILL,
            accent,
        );
        ctx.draw_rectangle(
            Vec2::new(320.0, 85.0),
            Rect::new(0.0, 0.0, 160.0, 90.0),
            Vec2::new(80.0, 45.0),
            t * 30.0,
            0.4,
            PathKind::STROKE_AND_FILL,
            accent,
        );

        // hand-built path with a color change halfway
        ctx.begin_path(PathKind::STROKE);
        ctx.set_stroke_width(4.0);
        ctx.set_stroke_color(Color::from_rgba8(120, 220, 140, 255));
        ctx.line_to(Vec2::new(460.0, 40.0));
        ctx.line_to(Vec2::new(560.0, 120.0));
        ctx.set_stroke_color(Color::from_rgba8(230, 90, 110, 255));
        ctx.line_to(Vec2::new(660.0, 40.0));
        ctx.line_to(Vec2::new(760.0, 120.0));
        ctx.end_path(false);

        // curves
        ctx.begin_path(PathKind::STROKE);
        ctx.set_stroke_width(2.0);
        ctx.set_stroke_color(Color::WHITE);
        ctx.line_to(Vec2::new(40.0, 260.0));
        ctx.quadratic_bezier_to(Vec2::new(140.0, 160.0), Vec2::new(240.0, 260.0), 24);
        ctx.cubic_bezier_to(
            Vec2::new(300.0, 360.0),
            Vec2::new(380.0, 160.0),
            Vec2::new(440.0, 260.0),
            32,
        );
        ctx.elliptical_arc(
            &EllipticalArc {
                end: Vec2::new(600.0, 260.0),
                rotation_deg: 20.0,
                rx: 90.0,
                ry: 50.0,
                large_arc: false,
                sweep: true,
            },
            32,
        );
        ctx.end_path(false);

        // filled star
        ctx.begin_path(PathKind::STROKE_AND_FILL);
        ctx.set_style(PathStyle {
            stroke_width: 2.0,
            stroke_color: Color::WHITE,
            fill_color: Color::from_rgba8(200, 120, 240, 255),
        });
        let center = Vec2::new(820.0, 250.0);
        ctx.line_to(center);
        for i in 0..=10 {
            let radius = if i % 2 == 0 { 70.0 } else { 30.0 };
            let angle = (i as f32 * 36.0 - 90.0 + t * 20.0).to_radians();
            ctx.line_to(center + Vec2::new(angle.cos(), angle.sin()) * radius);
        }
        ctx.end_path(false);

        // circles, clipped
        ctx.set_scissor(Some(Rect::new(40.0, 340.0, 300.0, 120.0)));
        ctx.draw_circle(Vec2::new(120.0, 400.0), 80.0, Color::from_rgba8(240, 160, 60, 255), 48);
        ctx.draw_arc(
            Vec2::new(280.0, 400.0),
            0.0,
            270.0,
            60.0,
            Color::from_rgba8(90, 200, 200, 255),
            36,
        );
        ctx.set_scissor(None);

        if let Some(checker) = self.checker {
            ctx.draw_texture(
                checker,
                Vec2::new(440.0, 420.0),
                Rect::new(0.0, 0.0, 96.0, 96.0),
                Vec2::new(48.0, 48.0),
                -t * 45.0,
                Color::WHITE,
            );
        }

        if let Some(hexagon) = self.hexagon {
            let spin = t * 0.8;
            let (sin, cos) = spin.sin_cos();
            let transform = [
                [cos, sin, 0.0, 0.0],
                [-sin, cos, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [700.0, 440.0, 0.0, 1.0],
            ];
            ctx.draw_mesh(hexagon, &transform, Material::default());
        }

        if let Some(font) = self.font {
            let title = "Quill - immediate mode vectors";
            ctx.draw_text(
                font,
                title,
                Vec2::new(40.0, 560.0),
                &TextStyle {
                    outline_color: Color::BLACK,
                    outline_width: 0.2,
                    ..TextStyle::color(Color::WHITE)
                },
            );
            let extent = ctx.measure_text(font, title);
            ctx.draw_rectangle(
                Vec2::new(40.0, 570.0),
                Rect::new(0.0, 0.0, extent.x, 2.0),
                Vec2::zero(),
                0.0,
                0.0,
                PathKind::FILL,
                PathStyle {
                    fill_color: Color::from_rgba8(250, 200, 80, 255),
                    ..PathStyle::default()
                },
            );

            let stats = ctx.stats();
            let line = format!("{} vertices, {} draw calls", stats.vertices, stats.draw_calls);
            ctx.draw_text(font, &line, Vec2::new(40.0, 620.0), &TextStyle::color(Color::from_rgba8(160, 170, 180, 255)));
        }
    }
}

/// RGBA checkerboard of `size x size` texels.
fn checkerboard(size: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let v = if (x + y) % 2 == 0 { 235 } else { 60 };
            bytes.extend_from_slice(&[v, v, v, 255]);
        }
    }
    bytes
}

/// Indexed triangle fan with a white center fading to colored rim vertices.
fn hexagon() -> MeshData {
    let mut positions = vec![[0.0, 0.0, 0.0]];
    let mut colors = vec![Color::WHITE];
    for i in 0..6 {
        let angle = (i as f32 * 60.0).to_radians();
        positions.push([angle.cos() * 60.0, angle.sin() * 60.0, 0.0]);
        colors.push(Color::from_rgba8(60 + i * 30, 200 - i * 25, 160, 255));
    }
    let indices = (0..6u32).flat_map(|i| [0, i + 1, (i + 1) % 6 + 1]).collect();
    MeshData::new(positions)
        .with_colors(colors)
        .with_indices(indices)
}
