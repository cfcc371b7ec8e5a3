use crate::coords::Vec2;
use crate::paint::{PathKind, PathStyle};
use crate::render::{Batch, GpuBackend};

use super::fill::fill_path;
use super::flatten::{self, EllipticalArc};
use super::stroke::stroke_path;

/// Tolerance for treating the last point of a closed path as the first.
const CLOSE_EPSILON: f32 = 0.1;

/// Style in effect from point index `start` on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StyleRun {
    pub start: usize,
    pub style: PathStyle,
}

/// Read-only view of a finished path handed to the tessellators.
#[derive(Debug, Copy, Clone)]
pub struct PathView<'a> {
    pub points: &'a [Vec2],
    runs: &'a [StyleRun],
    base: PathStyle,
}

impl<'a> PathView<'a> {
    pub fn new(points: &'a [Vec2], runs: &'a [StyleRun], base: PathStyle) -> Self {
        Self { points, runs, base }
    }

    /// Style of the last run starting at or before `index`.
    pub fn style_at(&self, index: usize) -> PathStyle {
        self.runs
            .iter()
            .rev()
            .find(|run| run.start <= index)
            .map_or(self.base, |run| run.style)
    }
}

/// Accumulates points and style runs between `begin_path` and `end_path`.
///
/// The current style persists across paths; runs do not.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    points: Vec<Vec2>,
    runs: Vec<StyleRun>,
    base: PathStyle,
    current: PathStyle,
    kind: PathKind,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_path(&mut self, kind: PathKind) {
        self.points.clear();
        self.runs.clear();
        self.base = self.current;
        self.kind = kind;
    }

    #[inline]
    pub fn kind(&self) -> PathKind {
        self.kind
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[inline]
    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    #[inline]
    pub fn style(&self) -> PathStyle {
        self.current
    }

    pub fn set_stroke_enabled(&mut self, enabled: bool) {
        self.kind.set(PathKind::STROKE, enabled);
    }

    pub fn set_fill_enabled(&mut self, enabled: bool) {
        self.kind.set(PathKind::FILL, enabled);
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[inline]
    pub fn line_to(&mut self, point: Vec2) {
        self.points.push(point);
    }

    pub fn arc(&mut self, center: Vec2, start_deg: f32, end_deg: f32, radius: f32, segments: u32) {
        flatten::arc(&mut self.points, center, start_deg, end_deg, radius, segments);
    }

    pub fn elliptical_arc(&mut self, arc: &EllipticalArc, segments: u32) {
        flatten::elliptical_arc(&mut self.points, arc, segments);
    }

    pub fn quadratic_bezier_to(&mut self, ctrl: Vec2, end: Vec2, segments: u32) {
        flatten::quadratic_bezier(&mut self.points, ctrl, end, segments);
    }

    pub fn cubic_bezier_to(&mut self, c1: Vec2, c2: Vec2, end: Vec2, segments: u32) {
        flatten::cubic_bezier(&mut self.points, c1, c2, end, segments);
    }

    // ── style runs ────────────────────────────────────────────────────────

    fn edit_style(&mut self, edit: impl FnOnce(&mut PathStyle)) {
        edit(&mut self.current);

        let start = self.points.len();
        match self.runs.last_mut() {
            Some(run) if run.start == start => run.style = self.current,
            _ => self.runs.push(StyleRun { start, style: self.current }),
        }
    }

    pub fn set_stroke_color(&mut self, color: crate::paint::Color) {
        self.edit_style(|s| s.stroke_color = color);
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.edit_style(|s| s.stroke_width = width);
    }

    pub fn set_fill_color(&mut self, color: crate::paint::Color) {
        self.edit_style(|s| s.fill_color = color);
    }

    pub fn set_style(&mut self, style: PathStyle) {
        self.edit_style(|s| *s = style);
    }

    // ── emission ──────────────────────────────────────────────────────────

    /// Tessellates the path into `batch` (fill first, then stroke) and clears
    /// it. With `closed`, a trailing point on top of the first is dropped and
    /// the stroke wraps around.
    pub fn end_path<B: GpuBackend>(&mut self, batch: &mut Batch<B>, closed: bool) {
        if self.points.is_empty() {
            return;
        }

        let mut count = self.points.len();
        if closed && count > 1 && self.points[count - 1].distance(self.points[0]) < CLOSE_EPSILON {
            count -= 1;
        }

        let view = PathView::new(&self.points[..count], &self.runs, self.base);
        if self.kind.contains(PathKind::FILL) {
            fill_path(batch, &view);
        }
        if self.kind.contains(PathKind::STROKE) {
            stroke_path(batch, &view, closed);
        }

        self.points.clear();
        self.runs.clear();
    }

    /// Appends a copy of the first point unless the path already ends there,
    /// then ends the path as closed.
    pub fn close_path<B: GpuBackend>(&mut self, batch: &mut Batch<B>) {
        let open_end = match self.points[..] {
            [first, .., last] if last.distance(first) >= CLOSE_EPSILON => Some(first),
            _ => None,
        };
        if let Some(first) = open_end {
            self.points.push(first);
        }
        self.end_path(batch, true);
    }
}
