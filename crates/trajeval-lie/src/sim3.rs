use glam::{DMat3, DMat4, DVec3, DVec4};

use crate::{se3, so3, GROUP_TOLERANCE};

/// Homogeneous Sim(3) matrix `[s * R | t]`.
///
/// The scale is expected to be positive; see [`is_sim3`].
pub fn sim3(r: DMat3, t: DVec3, s: f64) -> DMat4 {
    se3::se3(r * s, t)
}

/// Scale factor of a Sim(3) matrix, the cube root of the 3x3 block determinant.
pub fn scale(p: &DMat4) -> f64 {
    se3::rotation(p).determinant().cbrt()
}

/// Closed-form inverse of a Sim(3) matrix.
pub fn inverse(p: &DMat4) -> DMat4 {
    let s = scale(p);
    let r = se3::rotation(p) * (1.0 / s);
    let r_inv = r.transpose() * (1.0 / s);
    se3::se3(r_inv, -(r_inv * se3::translation(p)))
}

/// Returns true if `p` is a similarity transformation with scale `s`.
pub fn is_sim3(p: &DMat4, s: f64) -> bool {
    if s <= 0.0 {
        return false;
    }
    let unscaled = se3::rotation(p) * (1.0 / s);
    so3::is_so3(&unscaled) && p.row(3).abs_diff_eq(DVec4::W, GROUP_TOLERANCE)
}
