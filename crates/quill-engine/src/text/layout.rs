//! Byte-wise text layout into batched quads.

use crate::coords::Vec2;
use crate::paint::Color;
use crate::render::{
    Batch, DrawMode, GLYPH_DEPTH_STEP, GpuBackend, Material, ShaderHandle, VertexStyle,
};

use super::atlas::FontGlyph;
use super::font_system::Font;

/// Appearance of a text run.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub outline_color: Color,
    /// Outline width in distance-field units (0.0 to 0.5); 0 disables it.
    pub outline_width: f32,
    /// Draw untextured glyph boxes instead of SDF glyphs.
    pub debug_rects: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            outline_color: Color::TRANSPARENT,
            outline_width: 0.0,
            debug_rects: false,
        }
    }
}

impl TextStyle {
    pub fn color(color: Color) -> Self {
        Self { color, ..Self::default() }
    }
}

/// One positioned glyph produced by [`layout_bytes`].
#[derive(Debug, Copy, Clone)]
struct Placed {
    pen: Vec2,
    glyph: FontGlyph,
}

/// Walks `text` byte by byte from the baseline at `origin`, calling `place`
/// for every resolvable glyph. Returns the pen extent (widest line, line
/// count).
fn layout_bytes<B: GpuBackend + ?Sized>(
    font: &mut Font,
    backend: &mut B,
    text: &str,
    origin: Vec2,
    mut place: impl FnMut(Placed),
) -> (f32, usize) {
    let line_height = font.line_height();
    let mut pen = origin;
    let mut previous: Option<u16> = None;
    let mut widest = 0.0f32;
    let mut lines = 1;

    for byte in text.bytes() {
        if byte == b'\n' {
            widest = widest.max(pen.x - origin.x);
            pen.x = origin.x;
            pen.y += line_height;
            previous = None;
            lines += 1;
            continue;
        }

        let Some(index) = font.glyph_index(char::from(byte)) else { continue };
        let Some(glyph) = font.glyph(backend, index) else { continue };

        if let Some(prev) = previous {
            pen.x += font.kerning(prev, index);
        }

        place(Placed { pen, glyph });

        pen.x += glyph.advance;
        previous = Some(index);
    }

    (widest.max(pen.x - origin.x), lines)
}

/// Emits one quad per glyph of `text`, with `position` on the first
/// baseline. `'\n'` starts a new line; bytes without a glyph are skipped.
pub fn draw_text<B: GpuBackend>(
    batch: &mut Batch<B>,
    font: &mut Font,
    sdf_shader: ShaderHandle,
    text: &str,
    position: Vec2,
    style: &TextStyle,
) {
    let material = if style.debug_rects {
        Material::default()
    } else {
        Material {
            texture: Some(font.atlas().texture()),
            shader: Some(sdf_shader),
        }
    };

    let base = VertexStyle {
        normal: [style.outline_width, 0.0, -1.0],
        color: style.color,
        color2: style.outline_color,
        ..VertexStyle::default()
    };

    let mut quads = Vec::new();
    layout_bytes(font, batch.backend_mut(), text, position, |placed| {
        if !placed.glyph.is_blank() {
            quads.push(placed);
        }
    });

    batch.reserve(quads.len() * 4);
    batch.begin_with(DrawMode::Quads, material);

    for Placed { pen, glyph } in quads {
        let x0 = pen.x + glyph.left;
        let y0 = pen.y - glyph.top;
        let x1 = x0 + glyph.width as f32;
        let y1 = y0 + glyph.height as f32;
        let [u0, v0, u1, v1] = glyph.uv;

        batch.vertex2(Vec2::new(x0, y0), &base.with_uv(u0, v0));
        batch.vertex2(Vec2::new(x1, y0), &base.with_uv(u1, v0));
        batch.vertex2(Vec2::new(x1, y1), &base.with_uv(u1, v1));
        batch.vertex2(Vec2::new(x0, y1), &base.with_uv(u0, v1));

        batch.step_depth(GLYPH_DEPTH_STEP);
    }

    batch.end();
}

/// Width of the widest line and total height (`lines * line_height`) of
/// `text` laid out with the rules of [`draw_text`].
pub fn measure_text<B: GpuBackend + ?Sized>(font: &mut Font, backend: &mut B, text: &str) -> Vec2 {
    if text.is_empty() {
        return Vec2::zero();
    }
    let line_height = font.line_height();
    let (width, lines) = layout_bytes(font, backend, text, Vec2::zero(), |_| {});
    Vec2::new(width, lines as f32 * line_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingBackend;
    use crate::render::{BatchConfig, Vertex};
    use crate::text::face::scripted::ScriptedFace;
    use crate::text::{FontId, FontSystem};

    struct Fixture {
        batch: Batch<RecordingBackend>,
        fonts: FontSystem,
        font: FontId,
    }

    fn fixture(face: ScriptedFace) -> Fixture {
        let mut batch =
            Batch::new(RecordingBackend::default(), &BatchConfig::default()).expect("batch");
        let mut fonts = FontSystem::new();
        let font = fonts
            .load(batch.backend_mut(), Box::new(face), 16.0, 128)
            .expect("font");
        Fixture { batch, fonts, font }
    }

    fn ab_face() -> ScriptedFace {
        let mut face = ScriptedFace::new(&[('A', 10.0), ('B', 12.0), (' ', 5.0)]);
        face.kerning.insert(('A', 'B'), -1.0);
        face
    }

    fn draw(fx: &mut Fixture, text: &str, style: &TextStyle) -> Vec<Vertex> {
        let sdf = fx.batch.default_shader();
        let font = fx.fonts.get_mut(fx.font).expect("font");
        draw_text(&mut fx.batch, font, sdf, text, Vec2::new(0.0, 20.0), style);
        fx.batch.flush();
        fx.batch
            .backend()
            .draws
            .iter()
            .flat_map(|d| d.vertices.iter().copied())
            .collect()
    }

    #[test]
    fn kerning_moves_second_glyph() {
        let mut fx = fixture(ab_face());
        let vertices = draw(&mut fx, "AB", &TextStyle::default());

        // Two quads expanded to two triangles each.
        assert_eq!(vertices.len(), 12);
        assert_eq!(vertices[0].position[0], 0.0);
        assert_eq!(vertices[6].position[0], 9.0);
    }

    #[test]
    fn newline_resets_pen_and_kerning() {
        let mut fx = fixture(ab_face());
        let vertices = draw(&mut fx, "A\nB", &TextStyle::default());

        assert_eq!(vertices[6].position[0], 0.0);
        assert!(vertices[6].position[1] > vertices[0].position[1]);
    }

    #[test]
    fn glyph_top_sits_on_baseline_minus_bearing() {
        let mut fx = fixture(ab_face());
        let vertices = draw(&mut fx, "A", &TextStyle::default());
        // Scripted glyphs are 6 px tall with top bearing 6.
        assert_eq!(vertices[0].position[1], 14.0);
        assert_eq!(vertices[2].position[1], 20.0);
    }

    #[test]
    fn missing_and_blank_glyphs_emit_no_quads() {
        let mut fx = fixture(ab_face());
        let vertices = draw(&mut fx, "A ?B", &TextStyle::default());
        assert_eq!(vertices.len(), 12);
        // Space advances the pen: A(10) + space(5).
        assert_eq!(vertices[6].position[0], 15.0);
    }

    #[test]
    fn glyph_quads_step_depth() {
        let mut fx = fixture(ab_face());
        let vertices = draw(&mut fx, "AB", &TextStyle::default());
        assert!(vertices[6].position[2] < vertices[0].position[2]);
    }

    #[test]
    fn outline_rides_in_normal_and_color2() {
        let mut fx = fixture(ab_face());
        let style = TextStyle {
            color: Color::WHITE,
            outline_color: Color::BLACK,
            outline_width: 0.2,
            debug_rects: false,
        };
        let vertices = draw(&mut fx, "A", &style);
        assert!(vertices.iter().all(|v| v.normal[0] == 0.2 && v.color2 == Color::BLACK));
        let draws = &fx.batch.backend().draws;
        assert!(draws[0].texture.is_some());
    }

    #[test]
    fn debug_rects_draw_untextured() {
        let mut fx = fixture(ab_face());
        let style = TextStyle { debug_rects: true, ..TextStyle::default() };
        draw(&mut fx, "AB", &style);
        let draws = &fx.batch.backend().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].texture, None);
    }

    #[test]
    fn measure_matches_layout() {
        let mut fx = fixture(ab_face());
        let font = fx.fonts.get_mut(fx.font).expect("font");
        let size = measure_text(font, fx.batch.backend_mut(), "AB\nA");
        assert_eq!(size, Vec2::new(21.0, 40.0));
    }
}
