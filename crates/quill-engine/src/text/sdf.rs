//! Signed distance fields from coverage bitmaps.

/// Converts an 8-bit coverage bitmap (`width * height`, row-major) into a
/// distance field padded by `spread` pixels on every side.
///
/// Output texels store `0.5 + d / (2 * spread)` scaled to `0..=255`, where
/// `d` is the signed distance to the glyph edge in pixels (positive inside),
/// clamped to `±spread`. The edge therefore sits at 128.
pub fn coverage_to_sdf(coverage: &[u8], width: u32, height: u32, spread: u32) -> Vec<u8> {
    let (w, h) = (width as i32, height as i32);
    let s = spread.max(1) as i32;
    let out_w = w + 2 * s;
    let out_h = h + 2 * s;

    let inside = |x: i32, y: i32| -> bool {
        if x < 0 || y < 0 || x >= w || y >= h {
            return false;
        }
        coverage[(y * w + x) as usize] >= 128
    };

    let mut out = vec![0u8; (out_w * out_h) as usize];
    let max_dist = s as f32;

    for oy in 0..out_h {
        for ox in 0..out_w {
            let (x, y) = (ox - s, oy - s);
            let here = inside(x, y);

            let mut nearest_sq = i32::MAX;
            for dy in -s..=s {
                for dx in -s..=s {
                    let d_sq = dx * dx + dy * dy;
                    if d_sq >= nearest_sq || inside(x + dx, y + dy) == here {
                        continue;
                    }
                    nearest_sq = d_sq;
                }
            }

            let dist = if nearest_sq == i32::MAX {
                max_dist
            } else {
                ((nearest_sq as f32).sqrt() - 0.5).min(max_dist)
            };
            let signed = if here { dist } else { -dist };
            let value = 0.5 + signed / (2.0 * max_dist);
            out[(oy * out_w + ox) as usize] = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }

    out
}
