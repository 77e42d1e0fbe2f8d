use glam::{DMat3, DMat4, DQuat, DVec3, DVec4};
use rand::Rng;

use crate::{so3, GROUP_TOLERANCE};

/// Homogeneous SE(3) matrix from a rotation and a translation.
pub fn se3(r: DMat3, t: DVec3) -> DMat4 {
    DMat4::from_cols(
        r.x_axis.extend(0.0),
        r.y_axis.extend(0.0),
        r.z_axis.extend(0.0),
        t.extend(1.0),
    )
}

/// SE(3) matrix with identity rotation and the given translation.
pub fn from_translation(t: DVec3) -> DMat4 {
    se3(DMat3::IDENTITY, t)
}

/// SE(3) matrix from a quaternion and a translation.
pub fn from_quat_translation(q: DQuat, t: DVec3) -> DMat4 {
    se3(so3::from_quat(q), t)
}

/// Upper-left 3x3 block of a homogeneous matrix.
pub fn rotation(p: &DMat4) -> DMat3 {
    DMat3::from_mat4(*p)
}

/// Translation column of a homogeneous matrix.
pub fn translation(p: &DMat4) -> DVec3 {
    p.w_axis.truncate()
}

/// Closed-form inverse of an SE(3) matrix.
pub fn inverse(p: &DMat4) -> DMat4 {
    let r_inv = rotation(p).transpose();
    se3(r_inv, -(r_inv * translation(p)))
}

/// Returns true if the rotation block is in SO(3) and the bottom row is `[0, 0, 0, 1]`.
pub fn is_se3(p: &DMat4) -> bool {
    so3::is_so3(&rotation(p)) && p.row(3).abs_diff_eq(DVec4::W, GROUP_TOLERANCE)
}

/// Relative transformation `a^-1 * b`, i.e. `b` expressed in the frame of `a`.
pub fn relative(a: &DMat4, b: &DMat4) -> DMat4 {
    inverse(a) * *b
}

/// Random SE(3) matrix using the thread-local generator.
pub fn random() -> DMat4 {
    random_with(&mut rand::rng())
}

/// Random SE(3) matrix with a uniform rotation and a translation in `[0, 1)^3`.
pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> DMat4 {
    let r = so3::random_with(rng);
    let t = DVec3::new(rng.random(), rng.random(), rng.random());
    se3(r, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_se3_blocks() {
        let r = so3::exp(DVec3::new(0.1, 0.2, 0.3));
        let t = DVec3::new(1.0, 2.0, 3.0);
        let p = se3(r, t);
        assert_eq!(rotation(&p), r);
        assert_eq!(translation(&p), t);
        assert_eq!(p.row(3), DVec4::W);
        assert_eq!(se3(DMat3::IDENTITY, DVec3::ZERO), DMat4::IDENTITY);
    }

    #[test]
    fn test_inverse() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let p = random_with(&mut rng);
            assert!(is_se3(&p));
            assert_relative_eq!(inverse(&p) * p, DMat4::IDENTITY, epsilon = 1e-6);
            assert_relative_eq!(inverse(&p), p.inverse(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_is_se3() {
        assert!(is_se3(&DMat4::IDENTITY));
        let mut bad_row = DMat4::IDENTITY;
        bad_row.x_axis.w = 0.5;
        assert!(!is_se3(&bad_row));
        assert!(!is_se3(&(DMat4::IDENTITY * 2.0)));
    }

    #[test]
    fn test_relative() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = random_with(&mut rng);
        let b = random_with(&mut rng);
        assert_relative_eq!(a * relative(&a, &b), b, epsilon = 1e-9);
        assert_relative_eq!(relative(&b, &b), DMat4::IDENTITY, epsilon = 1e-9);
    }

    #[test]
    fn test_from_quat_translation() {
        let q = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let p = from_quat_translation(q, DVec3::new(1.0, 0.0, 0.0));
        let x = p.transform_point3(DVec3::X);
        assert_relative_eq!(x, DVec3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
        assert_eq!(from_translation(DVec3::Z).w_axis, DVec4::new(0.0, 0.0, 1.0, 1.0));
    }
}
