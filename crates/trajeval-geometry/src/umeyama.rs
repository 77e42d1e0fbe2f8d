//! Umeyama alignment of corresponding point sets.
//!
//! S. Umeyama, "Least-squares estimation of transformation parameters between two
//! point patterns", IEEE PAMI, 1991.

use glam::{DMat3, DVec3};
use nalgebra::{Matrix3, SVD};
use trajeval_lie::so3;

/// Rotation (R), translation (t) and scale (c) such that `y ~ c * R * x + t`.
pub type UmeyamaOutput = (DMat3, DVec3, f64);

/// Error type for the geometry algorithms.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    /// Source and destination point sets must have the same length.
    #[error("point sets must have the same length, got {0} and {1}")]
    MismatchedInputLengths(usize, usize),

    /// At least one correspondence is needed.
    #[error("cannot align empty point sets")]
    EmptyInput,

    /// The points do not determine a unique rotation.
    #[error("degenerate covariance rank, Umeyama alignment is not possible")]
    DegenerateCovarianceRank,

    /// Failed to compute U in SVD.
    #[error("failed to compute U in SVD")]
    SvdU,

    /// Failed to compute V^T in SVD.
    #[error("failed to compute V^T in SVD")]
    SvdVT,
}

/// Least-squares similarity transformation mapping `x` onto `y`.
///
/// Points correspond by index. With `with_scale == false` the scale is fixed to 1.
/// With `yaw_only` the rotation is restricted to the z axis.
///
/// # Errors
///
/// Fails if the inputs differ in length, are empty, or if fewer than two singular
/// values of the cross-covariance are above machine epsilon.
pub fn umeyama_alignment(
    x: &[DVec3],
    y: &[DVec3],
    with_scale: bool,
    yaw_only: bool,
) -> Result<UmeyamaOutput, GeometryError> {
    if x.len() != y.len() {
        return Err(GeometryError::MismatchedInputLengths(x.len(), y.len()));
    }
    if x.is_empty() {
        return Err(GeometryError::EmptyInput);
    }
    let n = x.len() as f64;

    // means
    let mean_x = x.iter().copied().sum::<DVec3>() / n;
    let mean_y = y.iter().copied().sum::<DVec3>() / n;

    // variance of x about its mean
    let sigma_x = x.iter().map(|p| (*p - mean_x).length_squared()).sum::<f64>() / n;

    // cross-covariance (y - mean_y)(x - mean_x)^T / n
    let mut cov = Matrix3::<f64>::zeros();
    for (px, py) in x.iter().zip(y) {
        let dx = *px - mean_x;
        let dy = *py - mean_y;
        for r in 0..3 {
            for c in 0..3 {
                cov[(r, c)] += dy[r] * dx[c];
            }
        }
    }
    cov /= n;

    let svd = SVD::new(cov, true, true);
    let Some(u) = svd.u else {
        return Err(GeometryError::SvdU);
    };
    let Some(v_t) = svd.v_t else {
        return Err(GeometryError::SvdVT);
    };
    let d = svd.singular_values;

    if d.iter().filter(|s| **s > f64::EPSILON).count() < 2 {
        return Err(GeometryError::DegenerateCovarianceRank);
    }

    // flip the axis of the smallest singular value to get a right-handed system
    let mut s = Matrix3::<f64>::identity();
    if u.determinant() * v_t.determinant() < 0.0 {
        s[(d.imin(), d.imin())] = -1.0;
    }

    let r = if yaw_only {
        let mut c = DMat3::ZERO;
        for (px, py) in x.iter().zip(y) {
            let dx = *px - mean_x;
            let dy = *py - mean_y;
            c += DMat3::from_cols(dx * dy.x, dx * dy.y, dx * dy.z);
        }
        rot_z(best_yaw(&c))
    } else {
        to_dmat3(&(u * s * v_t))
    };

    let c = if with_scale {
        (Matrix3::from_diagonal(&d) * s).trace() / sigma_x
    } else {
        1.0
    };
    let t = mean_y - r * mean_x * c;

    log::debug!("umeyama alignment: scale {c}, translation {t}");

    Ok((r, t, c))
}

/// Rotation about the z axis by `theta` radians.
pub fn rot_z(theta: f64) -> DMat3 {
    so3::exp_axis_angle(DVec3::Z, theta)
}

/// Yaw angle maximizing `trace(Rz(theta) * c)` for a 3x3 cross term `c`.
pub fn best_yaw(c: &DMat3) -> f64 {
    // c.col(j)[i] is the entry at row i, column j
    let a = c.y_axis.x - c.x_axis.y;
    let b = c.x_axis.x + c.y_axis.y;
    a.atan2(b)
}

fn to_dmat3(m: &Matrix3<f64>) -> DMat3 {
    DMat3::from_cols_array(&[
        m[(0, 0)],
        m[(1, 0)],
        m[(2, 0)],
        m[(0, 1)],
        m[(1, 1)],
        m[(2, 1)],
        m[(0, 2)],
        m[(1, 2)],
        m[(2, 2)],
    ])
}
