use glam::{DMat3, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

use crate::so3;

/// Static (extrinsic) Euler axis sequences.
///
/// `Sxyz` rotates about the fixed x axis first, then the fixed y axis and finally
/// the fixed z axis, i.e. `R = Rz(ak) * Ry(aj) * Rx(ai)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EulerAxes {
    /// Fixed x, then y, then z (roll, pitch, yaw).
    #[default]
    Sxyz,
    /// Fixed x, then z, then y.
    Sxzy,
    /// Fixed y, then x, then z.
    Syxz,
    /// Fixed y, then z, then x.
    Syzx,
    /// Fixed z, then x, then y.
    Szxy,
    /// Fixed z, then y, then x.
    Szyx,
}

impl EulerAxes {
    /// Short name of the sequence, e.g. `"sxyz"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EulerAxes::Sxyz => "sxyz",
            EulerAxes::Sxzy => "sxzy",
            EulerAxes::Syxz => "syxz",
            EulerAxes::Syzx => "syzx",
            EulerAxes::Szxy => "szxy",
            EulerAxes::Szyx => "szyx",
        }
    }

    // a static sequence ijk is the intrinsic sequence kji with reversed angles
    fn intrinsic(self) -> EulerRot {
        match self {
            EulerAxes::Sxyz => EulerRot::ZYX,
            EulerAxes::Sxzy => EulerRot::YZX,
            EulerAxes::Syxz => EulerRot::ZXY,
            EulerAxes::Syzx => EulerRot::XZY,
            EulerAxes::Szxy => EulerRot::YXZ,
            EulerAxes::Szyx => EulerRot::XYZ,
        }
    }
}

impl std::fmt::Display for EulerAxes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Euler angles `(ai, aj, ak)` of a rotation matrix, in radians.
///
/// The components follow the order of the axes in the sequence name, so for
/// [`EulerAxes::Sxyz`] the result is `(roll, pitch, yaw)`.
pub fn euler_angles(r: &DMat3, axes: EulerAxes) -> DVec3 {
    let (ak, aj, ai) = so3::to_quat(r).to_euler(axes.intrinsic());
    DVec3::new(ai, aj, ak)
}

/// Rotation matrix from Euler angles `(ai, aj, ak)` in radians.
pub fn from_euler_angles(angles: DVec3, axes: EulerAxes) -> DMat3 {
    DMat3::from_quat(DQuat::from_euler(
        axes.intrinsic(),
        angles.z,
        angles.y,
        angles.x,
    ))
}
