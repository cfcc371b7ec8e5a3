use crate::render::{Batch, DrawMode, GpuBackend, VertexStyle};

use super::builder::PathView;

/// Fans triangles out of the first point: `n` points give `n - 2` triangles.
/// Triangle `i` (`p0, pi, pi+1`) uses the fill color active at point `i`.
///
/// Fewer than three points is a no-op.
pub fn fill_path<B: GpuBackend>(batch: &mut Batch<B>, path: &PathView<'_>) {
    let points = path.points;
    if points.len() < 3 {
        log::debug!("fill skipped: {} points", points.len());
        return;
    }

    batch.reserve((points.len() - 2) * 3);
    batch.begin(DrawMode::Triangles);

    for i in 1..points.len() - 1 {
        let style = VertexStyle::color(path.style_at(i).fill_color);
        batch.vertex2(points[0], &style);
        batch.vertex2(points[i], &style);
        batch.vertex2(points[i + 1], &style);
    }

    batch.end();
}
