use glam::{DMat3, DQuat, DVec3};
use rand::Rng;

use crate::{LieError, GROUP_TOLERANCE};

const SMALL_ANGLE_EPSILON: f64 = 1e-10;

/// Vector space -> Lie algebra.
///
/// Returns the skew-symmetric matrix `[v]x` such that `[v]x * w == v.cross(w)`.
pub fn hat(v: DVec3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.0, v.z, -v.y),
        DVec3::new(-v.z, 0.0, v.x),
        DVec3::new(v.y, -v.x, 0.0),
    )
}

/// Lie algebra -> vector space.
///
/// Inverse of [`hat`] for skew-symmetric input.
pub fn vee(m: &DMat3) -> DVec3 {
    DVec3::new(-m.z_axis.y, m.z_axis.x, -m.y_axis.x)
}

/// Exponential map from a rotation vector (axis scaled by angle) to a rotation matrix.
pub fn exp(rotvec: DVec3) -> DMat3 {
    let theta = rotvec.length();
    if theta < SMALL_ANGLE_EPSILON {
        let k = hat(rotvec);
        return DMat3::IDENTITY + k + (k * k) * 0.5;
    }
    DMat3::from_axis_angle(rotvec / theta, theta)
}

/// Rotation matrix from a (not necessarily normalized) axis and an angle in radians.
pub fn exp_axis_angle(axis: DVec3, angle: f64) -> DMat3 {
    exp(axis.normalize_or_zero() * angle)
}

/// Logarithm map returning the rotation vector of `r`.
///
/// The norm of the result is the rotation angle in `[0, pi]`.
pub fn log(r: &DMat3) -> Result<DVec3, LieError> {
    if !is_so3(r) {
        return Err(LieError::InvalidRotation);
    }
    let q = to_quat(r);
    let v = DVec3::new(q.x, q.y, q.z);
    let n = v.length();
    if n < SMALL_ANGLE_EPSILON {
        return Ok(2.0 * v / q.w);
    }
    Ok(v * (2.0 * n.atan2(q.w) / n))
}

/// Rotation angle of `r` in radians, in `[0, pi]`.
pub fn log_angle(r: &DMat3) -> Result<f64, LieError> {
    if !is_so3(r) {
        return Err(LieError::InvalidRotation);
    }
    let cos_angle = (trace(r) - 1.0) / 2.0;
    Ok(cos_angle.clamp(-1.0, 1.0).acos())
}

/// Logarithm map returning the skew-symmetric generator of `r`.
pub fn log_skew(r: &DMat3) -> Result<DMat3, LieError> {
    Ok(hat(log(r)?))
}

/// Returns true if `r` is orthonormal with determinant +1 within [`GROUP_TOLERANCE`].
pub fn is_so3(r: &DMat3) -> bool {
    let det_valid = (r.determinant() - 1.0).abs() <= GROUP_TOLERANCE;
    let orthogonal = (r.transpose() * *r).abs_diff_eq(DMat3::IDENTITY, GROUP_TOLERANCE);
    det_valid && orthogonal
}

/// Relative rotation `a^T * b`, i.e. `b` expressed in the frame of `a`.
pub fn relative(a: &DMat3, b: &DMat3) -> DMat3 {
    a.transpose() * *b
}

/// Unit quaternion of `r` with a non-negative scalar part.
pub fn to_quat(r: &DMat3) -> DQuat {
    let q = DQuat::from_mat3(r).normalize();
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

/// Rotation matrix of a quaternion. The quaternion is normalized first.
pub fn from_quat(q: DQuat) -> DMat3 {
    DMat3::from_quat(q.normalize())
}

/// Builds a quaternion from scalar-first `[w, x, y, z]` components.
pub fn quat_from_wxyz(wxyz: [f64; 4]) -> DQuat {
    DQuat::from_xyzw(wxyz[1], wxyz[2], wxyz[3], wxyz[0])
}

/// Scalar-first `[w, x, y, z]` components of a quaternion.
pub fn quat_to_wxyz(q: DQuat) -> [f64; 4] {
    [q.w, q.x, q.y, q.z]
}

/// Compares two quaternions treating `q` and `-q` as the same rotation.
pub fn quat_eq(a: DQuat, b: DQuat, max_abs_diff: f64) -> bool {
    a.abs_diff_eq(b, max_abs_diff) || a.abs_diff_eq(-b, max_abs_diff)
}

/// Uniformly distributed random rotation using the thread-local generator.
pub fn random() -> DMat3 {
    random_with(&mut rand::rng())
}

/// Uniformly distributed random rotation (Shoemake's method).
pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> DMat3 {
    let r1: f64 = rng.random();
    let r2: f64 = rng.random();
    let r3: f64 = rng.random();

    let tau = 2.0 * std::f64::consts::PI;
    let w = (1.0 - r1).sqrt() * (tau * r2).sin();
    let x = (1.0 - r1).sqrt() * (tau * r2).cos();
    let y = r1.sqrt() * (tau * r3).sin();
    let z = r1.sqrt() * (tau * r3).cos();

    from_quat(DQuat::from_xyzw(x, y, z, w))
}

pub(crate) fn trace(r: &DMat3) -> f64 {
    r.x_axis.x + r.y_axis.y + r.z_axis.z
}
