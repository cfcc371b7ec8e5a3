/// Column-major 4×4 matrix, laid out the way WGSL `mat4x4<f32>` expects.
pub type Mat4 = [[f32; 4]; 4];

pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Orthographic projection for a `width × height` pixel target with the origin
/// at the top-left corner and +Y pointing down.
///
/// Vertex z is the batch depth counter, which starts at 0 and decreases. It
/// maps to clip depth `0.5 + 0.5 * z`, so later primitives (smaller z) land
/// closer to the viewer and win a `LessEqual` depth test.
pub fn ortho_top_left(width: f32, height: f32) -> Mat4 {
    let w = width.max(1.0);
    let h = height.max(1.0);
    [
        [2.0 / w, 0.0, 0.0, 0.0],
        [0.0, -2.0 / h, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.0],
        [-1.0, 1.0, 0.5, 1.0],
    ]
}

/// Translation by `(x, y, z)`.
pub const fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [x, y, z, 1.0],
    ]
}

/// `a * b`: applying the result equals applying `b`, then `a`.
pub fn mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for (col, out_col) in out.iter_mut().enumerate() {
        for (row, o) in out_col.iter_mut().enumerate() {
            *o = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (row, o) in out.iter_mut().enumerate() {
            *o = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
        }
        out
    }

    #[test]
    fn corners_map_to_clip_space() {
        let m = ortho_top_left(200.0, 100.0);
        assert_eq!(apply(&m, [0.0, 0.0, 0.0]), [-1.0, 1.0, 0.5]);
        assert_eq!(apply(&m, [200.0, 100.0, 0.0]), [1.0, -1.0, 0.5]);
    }

    #[test]
    fn smaller_depth_is_nearer() {
        let m = ortho_top_left(10.0, 10.0);
        let early = apply(&m, [0.0, 0.0, -0.0001])[2];
        let late = apply(&m, [0.0, 0.0, -0.0002])[2];
        assert!(late < early);
    }

    #[test]
    fn product_applies_right_operand_first() {
        let m = mul(&ortho_top_left(256.0, 128.0), &translation(128.0, 64.0, 0.0));
        assert_eq!(apply(&m, [0.0, 0.0, 0.0]), [0.0, 0.0, 0.5]);
        assert_eq!(mul(&IDENTITY, &m), m);
    }
}
