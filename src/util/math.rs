//! Small fixed-size linear algebra helpers. Matrices are row-major.

pub const IDENTITY_MAT4: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Invert a rigid transform (rotation + translation) stored as a 4x4 row-major matrix.
///
/// Assumes the last row is `[0, 0, 0, 1]` and the upper-left 3x3 is orthonormal.
pub fn invert_rigid_mat4(m: &[f64; 16]) -> [f64; 16] {
    let rt = [m[0], m[4], m[8], m[1], m[5], m[9], m[2], m[6], m[10]];
    let t = [m[3], m[7], m[11]];
    let inv_t = mat3_mul_vec3(&rt, t);
    [
        rt[0], rt[1], rt[2], -inv_t[0], //
        rt[3], rt[4], rt[5], -inv_t[1], //
        rt[6], rt[7], rt[8], -inv_t[2], //
        0.0, 0.0, 0.0, 1.0,
    ]
}

/// Multiply two 4x4 matrices.
pub fn mat4_mul(a: &[f64; 16], b: &[f64; 16]) -> [f64; 16] {
    let mut out = [0.0; 16];
    for row in 0..4 {
        for col in 0..4 {
            out[row * 4 + col] = (0..4).map(|k| a[row * 4 + k] * b[k * 4 + col]).sum();
        }
    }
    out
}

/// Apply an affine 4x4 transform to a point (implicit `w = 1`).
pub fn transform_point(m: &[f64; 16], p: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, slot) in out.iter_mut().enumerate() {
        let base = row * 4;
        *slot = m[base] * p[0] + m[base + 1] * p[1] + m[base + 2] * p[2] + m[base + 3];
    }
    out
}

/// Build a 4x4 transform from a 3x3 rotation and a translation.
pub fn rigid_mat4(r: &[f64; 9], t: [f64; 3]) -> [f64; 16] {
    [
        r[0], r[1], r[2], t[0], //
        r[3], r[4], r[5], t[1], //
        r[6], r[7], r[8], t[2], //
        0.0, 0.0, 0.0, 1.0,
    ]
}

pub fn mat3_mul_vec3(m: &[f64; 9], v: [f64; 3]) -> [f64; 3] {
    [
        m[0] * v[0] + m[1] * v[1] + m[2] * v[2],
        m[3] * v[0] + m[4] * v[1] + m[5] * v[2],
        m[6] * v[0] + m[7] * v[1] + m[8] * v[2],
    ]
}

pub fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn sub3(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn norm3(a: [f64; 3]) -> f64 {
    dot3(a, a).sqrt()
}

pub fn squared_distance3(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d = sub3(a, b);
    dot3(d, d)
}

/// Rodrigues' rotation formula from rotation vector (axis * angle).
pub fn rotvec_to_rotmat(rv: [f64; 3]) -> [f64; 9] {
    let angle = norm3(rv);
    if angle == 0.0 {
        return [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
    }
    let (kx, ky, kz) = (rv[0] / angle, rv[1] / angle, rv[2] / angle);
    let (s, c) = angle.sin_cos();
    let v = 1.0 - c;
    [
        kx * kx * v + c,
        kx * ky * v - kz * s,
        kx * kz * v + ky * s,
        ky * kx * v + kz * s,
        ky * ky * v + c,
        ky * kz * v - kx * s,
        kz * kx * v - ky * s,
        kz * ky * v + kx * s,
        kz * kz * v + c,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rigid_inverse_round_trips() {
        let r = rotvec_to_rotmat([0.3, -0.2, 0.9]);
        let m = rigid_mat4(&r, [1.0, -2.0, 0.5]);
        let prod = mat4_mul(&m, &invert_rigid_mat4(&m));
        for (got, want) in prod.iter().zip(IDENTITY_MAT4.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn quarter_turn_about_z() {
        let r = rotvec_to_rotmat([0.0, 0.0, FRAC_PI_2]);
        let p = mat3_mul_vec3(&r, [1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(p[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn transform_point_applies_translation() {
        let m = rigid_mat4(&rotvec_to_rotmat([0.0; 3]), [1.0, 2.0, 3.0]);
        assert_eq!(transform_point(&m, [1.0, 1.0, 1.0]), [2.0, 3.0, 4.0]);
        assert_eq!(squared_distance3([1.0, 2.0, 3.0], [1.0, 0.0, 3.0]), 4.0);
    }
}
