use crate::coords::{Rect, Vec2};
use crate::paint::{Color, PathKind, PathStyle};
use crate::render::{DrawMode, GpuBackend, Material, TextureHandle, VertexStyle};

use super::ctx::Context;

/// Arc points per rounded corner.
const CORNER_SEGMENTS: u32 = 8;

impl<B: GpuBackend> Context<B> {
    /// Draws `rect` offset by `position`, rotated by `rotation_deg` around
    /// `origin` (relative to the rectangle's top-left).
    ///
    /// `corner_radius` is a fraction (0..1) of half the shorter side. Stroked
    /// or rounded rectangles go through the path builder; a plain fill is a
    /// single quad. The path route starts a new path with `style`, so any
    /// path under construction is discarded and the current path style is
    /// replaced.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rectangle(
        &mut self,
        position: Vec2,
        rect: Rect,
        origin: Vec2,
        rotation_deg: f32,
        corner_radius: f32,
        kind: PathKind,
        style: PathStyle,
    ) {
        if kind == PathKind::NONE {
            return;
        }

        let corners = rect.rotated_corners(origin, rotation_deg).offset(position);

        if !kind.contains(PathKind::STROKE) && corner_radius <= 0.0 {
            self.batch.reserve(4);
            self.batch.begin(DrawMode::Quads);
            let vs = VertexStyle::color(style.fill_color);
            for corner in corners.to_array() {
                self.batch.vertex2(corner, &vs);
            }
            self.batch.end();
            return;
        }

        self.path.begin_path(kind);
        self.path.set_style(style);

        if corner_radius > 0.0 {
            let m = rect.size.x.min(rect.size.y) * 0.5 * corner_radius.clamp(0.0, 1.0);
            let (sin, cos) = rotation_deg.to_radians().sin_cos();
            let x = Vec2::new(cos, sin) * m;
            let y = Vec2::new(-sin, cos) * m;
            let r = rotation_deg;

            self.path.arc(corners.top_left + x + y, 180.0 + r, 270.0 + r, m, CORNER_SEGMENTS);
            self.path.arc(corners.top_right - x + y, 270.0 + r, 360.0 + r, m, CORNER_SEGMENTS);
            self.path.arc(corners.bottom_right - x - y, r, 90.0 + r, m, CORNER_SEGMENTS);
            self.path.arc(corners.bottom_left + x - y, 90.0 + r, 180.0 + r, m, CORNER_SEGMENTS);
        } else {
            for corner in corners.to_array() {
                self.path.line_to(corner);
            }
        }

        self.path.end_path(&mut self.batch, true);
    }

    /// Filled circle as a fan of `segments` triangles.
    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color, segments: u32) {
        self.draw_arc(center, 0.0, 360.0, radius, color, segments);
    }

    /// Filled pie slice from `start_deg` to `end_deg` (clockwise on screen).
    pub fn draw_arc(
        &mut self,
        center: Vec2,
        start_deg: f32,
        end_deg: f32,
        radius: f32,
        color: Color,
        segments: u32,
    ) {
        let segments = segments.max(1);
        let start = start_deg.to_radians();
        let step = (end_deg.to_radians() - start) / segments as f32;
        let at = |i: u32| {
            let (sin, cos) = (start + step * i as f32).sin_cos();
            center + Vec2::new(cos, sin) * radius
        };

        let vs = VertexStyle::color(color);
        self.batch.reserve(segments as usize * 3);
        self.batch.begin(DrawMode::Triangles);
        let mut last = at(0);
        for i in 1..=segments {
            let next = at(i);
            self.batch.vertex2(center, &vs);
            self.batch.vertex2(last, &vs);
            self.batch.vertex2(next, &vs);
            last = next;
        }
        self.batch.end();
    }

    /// Line-list grid of `columns x rows` cells, outer border included.
    pub fn draw_grid(&mut self, position: Vec2, columns: u32, rows: u32, cell: Vec2, color: Color) {
        let width = columns as f32 * cell.x;
        let height = rows as f32 * cell.y;
        let vs = VertexStyle::color(color);

        self.batch.reserve((columns + rows + 2) as usize * 2);
        self.batch.begin(DrawMode::Lines);
        for row in 0..=rows {
            let y = row as f32 * cell.y;
            self.batch.vertex2(position + Vec2::new(0.0, y), &vs);
            self.batch.vertex2(position + Vec2::new(width, y), &vs);
        }
        for column in 0..=columns {
            let x = column as f32 * cell.x;
            self.batch.vertex2(position + Vec2::new(x, 0.0), &vs);
            self.batch.vertex2(position + Vec2::new(x, height), &vs);
        }
        self.batch.end();
    }

    /// Textured quad covering `rect` (placed like [`Self::draw_rectangle`]),
    /// modulated by `tint`.
    pub fn draw_texture(
        &mut self,
        texture: TextureHandle,
        position: Vec2,
        rect: Rect,
        origin: Vec2,
        rotation_deg: f32,
        tint: Color,
    ) {
        let c = rect.rotated_corners(origin, rotation_deg).offset(position);
        let vs = VertexStyle::color(tint);

        self.batch.reserve(4);
        self.batch.begin_with(DrawMode::Quads, Material::textured(texture));
        self.batch.vertex2(c.top_left, &vs.with_uv(0.0, 0.0));
        self.batch.vertex2(c.top_right, &vs.with_uv(1.0, 0.0));
        self.batch.vertex2(c.bottom_right, &vs.with_uv(1.0, 1.0));
        self.batch.vertex2(c.bottom_left, &vs.with_uv(0.0, 1.0));
        self.batch.end();
    }
}
