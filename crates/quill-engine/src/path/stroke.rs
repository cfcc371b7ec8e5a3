use crate::coords::Vec2;
use crate::render::{Batch, DrawMode, GpuBackend, VertexStyle};

use super::builder::PathView;

/// Offset outline at one path point: the two extended points either side.
#[derive(Debug, Copy, Clone)]
struct Joint {
    top: Vec2,
    bottom: Vec2,
}

/// Extends point `i` of the (possibly wrapping) polyline by half the stroke
/// width on both sides, merging the offsets of the two adjacent segments
/// into one mitred joint.
fn joint(points: &[Vec2], i: usize, closed: bool, half_width: f32) -> Joint {
    let count = points.len();
    let current = points[i % count];
    let previous = match i {
        0 if closed => points[count - 1],
        0 => points[0],
        _ => points[i - 1],
    };
    let next = points[(i + 1) % count];

    let prev_len = current.distance(previous);
    let next_len = next.distance(current);

    let dir1 = (current - previous).normalize_or_zero();
    let dir2 = (next - current).normalize_or_zero();
    let normal2 = dir2.perp();
    let width1 = dir1.perp() * half_width;
    let width2 = normal2 * half_width;

    if !closed && i == 0 {
        return Joint { top: current + width2, bottom: current - width2 };
    }

    let mut top = current + width1;
    let mut bottom = current - width1;

    if closed || i < count - 1 {
        let corner_a = current + width1;
        let corner_b = current + width2;
        let center = corner_a + (corner_b - corner_a) / 2.0;

        let connection = corner_b.distance(corner_a);
        let diagonal = current.distance(center);
        let limit = prev_len.min(next_len);

        let along = if diagonal > f32::EPSILON {
            (connection / 2.0 / diagonal) * half_width
        } else if connection > f32::EPSILON {
            limit
        } else {
            0.0
        };
        let along = along.clamp(-limit, limit);

        let side = dir1.dot(normal2);
        let sign = if side < 0.0 { -1.0 } else { 1.0 };

        top += dir1 * (along * sign);
        bottom -= dir1 * (along * sign);
    }

    Joint { top, bottom }
}

/// Emits two triangles per segment between consecutive joints.
///
/// Closed paths with `n` points give `n` segments, open ones `n - 1`. Each
/// segment takes the stroke color active at its first point; each joint the
/// stroke width active at its own point. Fewer than two points is a no-op.
pub fn stroke_path<B: GpuBackend>(batch: &mut Batch<B>, path: &PathView<'_>, closed: bool) {
    let points = path.points;
    let count = points.len();
    if count < 2 {
        log::debug!("stroke skipped: {count} points");
        return;
    }

    let steps = if closed { count + 1 } else { count };
    batch.reserve((steps - 1) * 6);
    batch.begin(DrawMode::Triangles);

    let mut last: Option<Joint> = None;
    for i in 0..steps {
        let half_width = path.style_at(i % count).stroke_width * 0.5;
        let current = joint(points, i, closed, half_width);

        if let Some(prev) = last {
            let style = VertexStyle::color(path.style_at(i - 1).stroke_color);

            batch.vertex2(prev.bottom, &style);
            batch.vertex2(current.bottom, &style);
            batch.vertex2(current.top, &style);

            batch.vertex2(current.top, &style);
            batch.vertex2(prev.top, &style);
            batch.vertex2(prev.bottom, &style);
        }
        last = Some(current);
    }

    batch.end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Color, PathStyle};
    use crate::path::StyleRun;
    use crate::render::recording::RecordingBackend;
    use crate::render::{BatchConfig, Vertex};

    fn run(points: &[Vec2], runs: &[StyleRun], width: f32, closed: bool) -> Vec<Vertex> {
        let mut batch =
            Batch::new(RecordingBackend::default(), &BatchConfig::default()).expect("batch");
        let base = PathStyle { stroke_width: width, ..PathStyle::default() };
        stroke_path(&mut batch, &PathView::new(points, runs, base), closed);
        batch.flush();
        batch
            .backend()
            .draws
            .iter()
            .flat_map(|d| d.vertices.iter().copied())
            .collect()
    }

    fn square() -> Vec<Vec2> {
        [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
            .into_iter()
            .map(Vec2::from)
            .collect()
    }

    fn xy(v: &Vertex) -> Vec2 {
        Vec2::new(v.position[0], v.position[1])
    }

    #[test]
    fn closed_stroke_has_six_vertices_per_point() {
        assert_eq!(run(&square(), &[], 2.0, true).len(), 24);
    }

    #[test]
    fn open_stroke_has_one_segment_fewer() {
        assert_eq!(run(&square(), &[], 2.0, false).len(), 18);
    }

    #[test]
    fn single_point_is_ignored() {
        assert!(run(&[Vec2::zero()], &[], 2.0, false).is_empty());
    }

    #[test]
    fn straight_segment_is_offset_by_half_width() {
        let points = [Vec2::zero(), Vec2::new(10.0, 0.0)];
        let vertices = run(&points, &[], 4.0, false);
        assert_eq!(vertices.len(), 6);
        for v in &vertices {
            assert!((v.position[1].abs() - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn square_corner_joints_are_mitred() {
        let vertices = run(&square(), &[], 2.0, true);
        let corners: Vec<Vec2> = vertices.iter().map(xy).collect();
        // Outer and inner mitre points of the (10, 0) corner.
        assert!(corners.iter().any(|p| p.distance(Vec2::new(11.0, -1.0)) < 1e-3));
        assert!(corners.iter().any(|p| p.distance(Vec2::new(9.0, 1.0)) < 1e-3));
    }

    #[test]
    fn segment_color_follows_run_at_segment_start() {
        let red = Color::from_rgba8(255, 0, 0, 255);
        let runs = [StyleRun {
            start: 1,
            style: PathStyle { stroke_color: red, stroke_width: 2.0, ..PathStyle::default() },
        }];
        let points = [Vec2::zero(), Vec2::new(10.0, 0.0), Vec2::new(20.0, 0.0)];
        let vertices = run(&points, &runs, 2.0, false);
        assert!(vertices[..6].iter().all(|v| v.color == Color::WHITE));
        assert!(vertices[6..].iter().all(|v| v.color == red));
    }
}
