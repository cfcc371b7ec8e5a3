//! Curve flattening.
//!
//! Every function appends sampled points to `out`. Curves start from the last
//! point already in `out`; when `out` is empty they degrade to a single point
//! at the curve's end. A `segments` of 0 is treated as 1.

use crate::coords::Vec2;

#[inline]
fn segment_count(segments: u32) -> u32 {
    segments.max(1)
}

/// Circular arc around `center`, `segments + 1` points from `start_deg` to
/// `end_deg` inclusive. Angles grow clockwise on screen (x = cos, y = sin).
pub fn arc(out: &mut Vec<Vec2>, center: Vec2, start_deg: f32, end_deg: f32, radius: f32, segments: u32) {
    let segments = segment_count(segments);
    let start = start_deg.to_radians();
    let step = (end_deg.to_radians() - start) / segments as f32;

    out.reserve(segments as usize + 1);
    for i in 0..=segments {
        let (sin, cos) = (start + step * i as f32).sin_cos();
        out.push(center + Vec2::new(cos, sin) * radius);
    }
}

/// Quadratic Bézier from the current point through `ctrl` to `end`.
pub fn quadratic_bezier(out: &mut Vec<Vec2>, ctrl: Vec2, end: Vec2, segments: u32) {
    let Some(&p0) = out.last() else {
        out.push(end);
        return;
    };
    let segments = segment_count(segments);

    out.reserve(segments as usize);
    for i in 1..=segments {
        let t = i as f32 / segments as f32;
        let u = 1.0 - t;
        out.push(p0 * (u * u) + ctrl * (2.0 * u * t) + end * (t * t));
    }
}

/// Cubic Bézier from the current point through `c1`, `c2` to `end`.
pub fn cubic_bezier(out: &mut Vec<Vec2>, c1: Vec2, c2: Vec2, end: Vec2, segments: u32) {
    let Some(&p0) = out.last() else {
        out.push(end);
        return;
    };
    let segments = segment_count(segments);

    out.reserve(segments as usize);
    for i in 1..=segments {
        let t = i as f32 / segments as f32;
        let u = 1.0 - t;
        out.push(
            p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + end * (t * t * t),
        );
    }
}

/// Parameters of an SVG-style elliptical arc segment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EllipticalArc {
    pub end: Vec2,
    pub rotation_deg: f32,
    pub rx: f32,
    pub ry: f32,
    pub large_arc: bool,
    pub sweep: bool,
}

#[inline]
fn angle_between(u: Vec2, v: Vec2) -> f32 {
    (u.x * v.y - u.y * v.x).atan2(u.dot(v))
}

/// Elliptical arc from the current point to `arc.end`, using the endpoint to
/// center conversion of SVG 1.1 (F.6.5). Radii too small to span the
/// endpoints are scaled up. Appends `segments` points, the last being
/// `arc.end`.
pub fn elliptical_arc(out: &mut Vec<Vec2>, arc: &EllipticalArc, segments: u32) {
    let Some(&start) = out.last() else {
        out.push(arc.end);
        return;
    };
    let end = arc.end;

    if start.distance(end) <= f32::EPSILON {
        return;
    }

    let mut rx = arc.rx.abs();
    let mut ry = arc.ry.abs();
    if rx <= f32::EPSILON || ry <= f32::EPSILON {
        out.push(end);
        return;
    }

    let (sin_phi, cos_phi) = arc.rotation_deg.to_radians().sin_cos();

    // Step 1: midpoint in the ellipse's rotated frame.
    let half = (start - end) / 2.0;
    let x1 = cos_phi * half.x + sin_phi * half.y;
    let y1 = -sin_phi * half.x + cos_phi * half.y;

    let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
    if lambda > 1.0 {
        let scale = lambda.sqrt();
        rx *= scale;
        ry *= scale;
    }

    // Step 2: center in the rotated frame.
    let (rx2, ry2) = (rx * rx, ry * ry);
    let num = rx2 * ry2 - rx2 * y1 * y1 - ry2 * x1 * x1;
    let den = rx2 * y1 * y1 + ry2 * x1 * x1;
    let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
    if arc.large_arc == arc.sweep {
        coef = -coef;
    }
    let cx1 = coef * rx * y1 / ry;
    let cy1 = -coef * ry * x1 / rx;

    // Step 3: center in user space.
    let mid = (start + end) / 2.0;
    let center = Vec2::new(
        cos_phi * cx1 - sin_phi * cy1 + mid.x,
        sin_phi * cx1 + cos_phi * cy1 + mid.y,
    );

    // Step 4: start angle and sweep.
    let u = Vec2::new((x1 - cx1) / rx, (y1 - cy1) / ry);
    let v = Vec2::new((-x1 - cx1) / rx, (-y1 - cy1) / ry);
    let theta = angle_between(Vec2::new(1.0, 0.0), u);
    let mut delta = angle_between(u, v);
    if !arc.sweep && delta > 0.0 {
        delta -= std::f32::consts::TAU;
    } else if arc.sweep && delta < 0.0 {
        delta += std::f32::consts::TAU;
    }

    let segments = segment_count(segments);
    out.reserve(segments as usize);
    for i in 1..segments {
        let (sin, cos) = (theta + delta * i as f32 / segments as f32).sin_cos();
        let local = Vec2::new(rx * cos, ry * sin);
        out.push(
            center
                + Vec2::new(
                    cos_phi * local.x - sin_phi * local.y,
                    sin_phi * local.x + cos_phi * local.y,
                ),
        );
    }
    out.push(end);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-3
    }

    #[test]
    fn arc_emits_segments_plus_one_points() {
        let mut out = Vec::new();
        arc(&mut out, Vec2::new(10.0, 10.0), 0.0, 90.0, 5.0, 4);
        assert_eq!(out.len(), 5);
        assert!(close(out[0], Vec2::new(15.0, 10.0)));
        // 90 degrees points down in y-down space.
        assert!(close(out[4], Vec2::new(10.0, 15.0)));
    }

    #[test]
    fn zero_segments_behave_as_one() {
        let mut out = vec![Vec2::zero()];
        quadratic_bezier(&mut out, Vec2::new(5.0, 5.0), Vec2::new(10.0, 0.0), 0);
        assert_eq!(out.len(), 2);
        assert!(close(out[1], Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn quadratic_midpoint_matches_closed_form() {
        let mut out = vec![Vec2::zero()];
        quadratic_bezier(&mut out, Vec2::new(5.0, 10.0), Vec2::new(10.0, 0.0), 2);
        assert_eq!(out.len(), 3);
        assert!(close(out[1], Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn cubic_ends_on_endpoint() {
        let mut out = vec![Vec2::zero()];
        cubic_bezier(&mut out, Vec2::new(0.0, 10.0), Vec2::new(10.0, 10.0), Vec2::new(10.0, 0.0), 8);
        assert_eq!(out.len(), 9);
        assert!(close(out[8], Vec2::new(10.0, 0.0)));
        assert!(close(out[4], Vec2::new(5.0, 7.5)));
    }

    #[test]
    fn curve_without_current_point_jumps_to_end() {
        let mut out = Vec::new();
        cubic_bezier(&mut out, Vec2::zero(), Vec2::zero(), Vec2::new(3.0, 4.0), 8);
        assert_eq!(out, vec![Vec2::new(3.0, 4.0)]);
    }

    fn half_circle_arc() -> EllipticalArc {
        EllipticalArc {
            end: Vec2::new(20.0, 0.0),
            rotation_deg: 0.0,
            rx: 10.0,
            ry: 10.0,
            large_arc: false,
            sweep: false,
        }
    }

    #[test]
    fn elliptical_arc_half_circle_has_equal_chords() {
        let mut out = vec![Vec2::zero()];
        elliptical_arc(&mut out, &half_circle_arc(), 8);

        assert_eq!(out.len(), 9);
        assert!(close(out[8], Vec2::new(20.0, 0.0)));

        let center = Vec2::new(10.0, 0.0);
        let chords: Vec<f32> = out.windows(2).map(|w| w[0].distance(w[1])).collect();
        for (p, chord) in out.iter().zip(&chords) {
            assert!((p.distance(center) - 10.0).abs() < 1e-3);
            assert!((chord - chords[0]).abs() < 1e-3);
        }
    }

    #[test]
    fn elliptical_arc_sweep_picks_side() {
        let mut a = vec![Vec2::zero()];
        elliptical_arc(&mut a, &half_circle_arc(), 4);

        let mut b = vec![Vec2::zero()];
        elliptical_arc(&mut b, &EllipticalArc { sweep: true, ..half_circle_arc() }, 4);

        assert!(a[2].y * b[2].y < 0.0);
        assert!((a[2].y.abs() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn small_radii_are_scaled_up() {
        let mut out = vec![Vec2::zero()];
        let arc = EllipticalArc { rx: 1.0, ry: 1.0, ..half_circle_arc() };
        elliptical_arc(&mut out, &arc, 4);
        // Scaled to radius 10: the midpoint is one radius off the chord.
        assert!((out[2].y.abs() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_elliptical_arcs() {
        let mut out = vec![Vec2::new(20.0, 0.0)];
        elliptical_arc(&mut out, &half_circle_arc(), 8);
        assert_eq!(out.len(), 1);

        let mut out = vec![Vec2::zero()];
        elliptical_arc(&mut out, &EllipticalArc { rx: 0.0, ..half_circle_arc() }, 8);
        assert_eq!(out, vec![Vec2::zero(), Vec2::new(20.0, 0.0)]);
    }
}
