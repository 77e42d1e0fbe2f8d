use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::ops::Range;

use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use trajeval_geometry::{accumulated_distances, arc_len, umeyama_alignment, UmeyamaOutput};
use trajeval_lie::euler::{self, EulerAxes};
use trajeval_lie::{se3, so3};

use crate::{filters, TrajectoryError};

/// Absolute tolerance used when comparing paths for equality.
pub const EQUALITY_TOLERANCE: f64 = 1e-6;

/// Canonical coordinate plane for [`PosePath3D::project`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// The x-y plane, normal z.
    XY,
    /// The x-z plane, normal y.
    XZ,
    /// The y-z plane, normal x.
    YZ,
}

impl Plane {
    /// Index of the coordinate that is zeroed by the projection.
    pub fn null_dim(&self) -> usize {
        match self {
            Plane::XY => 2,
            Plane::XZ => 1,
            Plane::YZ => 0,
        }
    }

    fn normal(&self) -> DVec3 {
        match self {
            Plane::XY => DVec3::Z,
            Plane::XZ => DVec3::Y,
            Plane::YZ => DVec3::X,
        }
    }
}

/// Summary of a pose path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathInfos {
    /// Number of poses.
    pub num_poses: usize,
    /// Path length in meters.
    pub path_length: f64,
    /// First position in meters.
    pub pos_start: [f64; 3],
    /// Last position in meters.
    pub pos_end: [f64; 3],
}

/// An ordered sequence of SE(3) poses without timing information.
///
/// A path stores either positions with orientations, SE(3) matrices, or both.
/// Whatever representation is missing is derived on first access and cached.
/// Every mutating operation replaces the caches as a whole.
#[derive(Debug, Clone)]
pub struct PosePath3D {
    positions: OnceCell<Vec<DVec3>>,
    orientations: OnceCell<Vec<DQuat>>,
    poses: OnceCell<Vec<DMat4>>,
    projected: bool,
}

impl PosePath3D {
    /// Creates a path from any combination of complete representations.
    ///
    /// Positions and orientations must be given together, or the SE(3) poses must
    /// be given, or all three.
    ///
    /// # Errors
    ///
    /// Fails if no complete representation is given, if the lengths disagree or
    /// if the path would be empty.
    pub fn new(
        positions: Option<Vec<DVec3>>,
        orientations: Option<Vec<DQuat>>,
        poses: Option<Vec<DMat4>>,
    ) -> Result<Self, TrajectoryError> {
        let (positions, orientations) = match (positions, orientations) {
            (Some(p), Some(o)) => (Some(p), Some(o)),
            _ if poses.is_some() => (None, None),
            _ => return Err(TrajectoryError::MissingData),
        };

        let num_poses = match (&positions, &poses) {
            (Some(p), _) => p.len(),
            (None, Some(p)) => p.len(),
            (None, None) => return Err(TrajectoryError::MissingData),
        };
        if num_poses == 0 {
            return Err(TrajectoryError::Empty);
        }
        check_len("orientations", num_poses, orientations.as_ref().map(Vec::len))?;
        check_len("poses", num_poses, poses.as_ref().map(Vec::len))?;

        Ok(Self {
            positions: positions.map(OnceCell::from).unwrap_or_default(),
            orientations: orientations.map(OnceCell::from).unwrap_or_default(),
            poses: poses.map(OnceCell::from).unwrap_or_default(),
            projected: false,
        })
    }

    /// Creates a path from positions and unit quaternions.
    pub fn from_positions_orientations(
        positions: Vec<DVec3>,
        orientations: Vec<DQuat>,
    ) -> Result<Self, TrajectoryError> {
        Self::new(Some(positions), Some(orientations), None)
    }

    /// Creates a path from SE(3) matrices.
    pub fn from_poses(poses: Vec<DMat4>) -> Result<Self, TrajectoryError> {
        Self::new(None, None, Some(poses))
    }

    /// Creates a path from `[x, y, z]` positions and scalar-first `[w, x, y, z]` quaternions.
    pub fn from_xyz_quat_wxyz(
        xyz: &[[f64; 3]],
        quat_wxyz: &[[f64; 4]],
    ) -> Result<Self, TrajectoryError> {
        Self::from_positions_orientations(
            xyz.iter().copied().map(DVec3::from_array).collect(),
            quat_wxyz.iter().copied().map(so3::quat_from_wxyz).collect(),
        )
    }

    /// Number of poses in the path.
    pub fn num_poses(&self) -> usize {
        if let Some(poses) = self.poses.get() {
            return poses.len();
        }
        self.positions().len()
    }

    /// Positions in meters.
    pub fn positions(&self) -> &[DVec3] {
        self.positions
            .get_or_init(|| self.poses().iter().map(se3::translation).collect())
    }

    /// Orientations as unit quaternions.
    pub fn orientations(&self) -> &[DQuat] {
        self.orientations.get_or_init(|| {
            self.poses()
                .iter()
                .map(|p| so3::to_quat(&se3::rotation(p)))
                .collect()
        })
    }

    /// SE(3) matrices.
    pub fn poses(&self) -> &[DMat4] {
        self.poses.get_or_init(|| {
            self.positions()
                .iter()
                .zip(self.orientations())
                .map(|(t, q)| se3::from_quat_translation(*q, *t))
                .collect()
        })
    }

    /// Orientations as scalar-first `[w, x, y, z]` quaternions.
    pub fn orientations_wxyz(&self) -> Vec<[f64; 4]> {
        self.orientations()
            .iter()
            .copied()
            .map(so3::quat_to_wxyz)
            .collect()
    }

    /// Orientations as Euler angles in radians.
    pub fn orientations_euler(&self, axes: EulerAxes) -> Vec<DVec3> {
        self.poses()
            .iter()
            .map(|p| euler::euler_angles(&se3::rotation(p), axes))
            .collect()
    }

    /// Accumulated distance along the path at each pose, starting at zero.
    pub fn distances(&self) -> Vec<f64> {
        accumulated_distances(self.positions())
    }

    /// Total arc length in meters.
    pub fn path_length(&self) -> f64 {
        arc_len(self.positions())
    }

    /// Arc length of the poses in `start..end`.
    pub fn path_length_between(&self, start: usize, end: usize) -> Result<f64, TrajectoryError> {
        let len = self.num_poses();
        if end > len || start > end {
            return Err(TrajectoryError::IndexOutOfBounds { index: end, len });
        }
        Ok(arc_len(&self.positions()[start..end]))
    }

    /// True once [`Self::project`] has been applied.
    pub fn is_projected(&self) -> bool {
        self.projected
    }

    /// Applies an SE(3) transformation to every pose.
    ///
    /// - left multiplication: `pose_i <- t * pose_i`
    /// - right multiplication: `pose_i <- pose_i * t`
    /// - right multiplication with `propagate`: the relative motion between
    ///   consecutive poses is multiplied by `t` and the path is chained again from
    ///   the first pose.
    pub fn transform(
        &mut self,
        t: &DMat4,
        right_mul: bool,
        propagate: bool,
    ) -> Result<(), TrajectoryError> {
        if !se3::is_se3(t) {
            return Err(TrajectoryError::InvalidTransform);
        }
        let poses = self.poses();
        let transformed = match (right_mul, propagate) {
            (true, true) => {
                let mut chained = Vec::with_capacity(poses.len());
                chained.push(poses[0]);
                for w in poses.windows(2) {
                    let step = se3::relative(&w[0], &w[1]) * *t;
                    let last = chained[chained.len() - 1];
                    chained.push(last * step);
                }
                chained
            }
            (true, false) => poses.iter().map(|p| *p * *t).collect(),
            (false, _) => poses.iter().map(|p| *t * *p).collect(),
        };
        self.set_poses(transformed);
        Ok(())
    }

    /// Multiplies all translations by `s`. Rotations are not affected.
    pub fn scale(&mut self, s: f64) -> Result<(), TrajectoryError> {
        if !(s > 0.0 && s.is_finite()) {
            return Err(TrajectoryError::InvalidScale(s));
        }
        if let Some(poses) = self.poses.get_mut() {
            for p in poses.iter_mut() {
                p.w_axis.x *= s;
                p.w_axis.y *= s;
                p.w_axis.z *= s;
            }
        }
        if let Some(positions) = self.positions.get_mut() {
            for p in positions.iter_mut() {
                *p *= s;
            }
        }
        Ok(())
    }

    /// Projects the path onto a coordinate plane.
    ///
    /// The out-of-plane coordinate is zeroed and every rotation is reduced to the
    /// rotation about the plane normal, taken from the static xyz Euler angles.
    /// A path can only be projected once.
    pub fn project(&mut self, plane: Plane) -> Result<(), TrajectoryError> {
        if self.projected {
            return Err(TrajectoryError::AlreadyProjected);
        }
        let null_dim = plane.null_dim();
        let axis = plane.normal();
        let projected = self
            .poses()
            .iter()
            .map(|p| {
                let angles = euler::euler_angles(&se3::rotation(p), EulerAxes::Sxyz);
                let mut t = se3::translation(p);
                t[null_dim] = 0.0;
                se3::se3(so3::exp_axis_angle(axis, angles[null_dim]), t)
            })
            .collect();
        self.set_poses(projected);
        self.projected = true;
        Ok(())
    }

    /// Aligns this path to `reference` with Umeyama's method and returns `(R, t, s)`.
    ///
    /// Only the first `n` positions of both paths are used if `n` is given.
    /// With `correct_only_scale` only the scale is applied. With `correct_scale`
    /// the scale and the rigid transformation are applied. Otherwise only the
    /// rigid transformation is applied.
    pub fn align(
        &mut self,
        reference: &PosePath3D,
        correct_scale: bool,
        correct_only_scale: bool,
        n: Option<usize>,
    ) -> Result<UmeyamaOutput, TrajectoryError> {
        let with_scale = correct_scale || correct_only_scale;
        let (r, t, s) = {
            let x = self.positions();
            let y = reference.positions();
            let n = n.unwrap_or(usize::MAX);
            umeyama_alignment(&x[..n.min(x.len())], &y[..n.min(y.len())], with_scale, false)?
        };

        if correct_only_scale {
            log::debug!("correcting scale by {s}");
            self.scale(s)?;
        } else if correct_scale {
            log::debug!("aligning with Sim(3), scale {s}");
            self.scale(s)?;
            self.transform(&se3::se3(r, t), false, false)?;
        } else {
            log::debug!("aligning with SE(3)");
            self.transform(&se3::se3(r, t), false, false)?;
        }
        Ok((r, t, s))
    }

    /// Moves this path so that its first pose coincides with the first pose of `reference`.
    ///
    /// Returns the applied transformation.
    pub fn align_origin(&mut self, reference: &PosePath3D) -> Result<DMat4, TrajectoryError> {
        let to_ref_origin = reference.poses()[0] * se3::inverse(&self.poses()[0]);
        log::debug!("origin alignment transformation: {to_ref_origin}");
        self.transform(&to_ref_origin, false, false)?;
        Ok(to_ref_origin)
    }

    /// Keeps only the poses at `ids`, in the given order.
    pub fn reduce_to_ids(&mut self, ids: &[usize]) -> Result<(), TrajectoryError> {
        self.check_ids(ids)?;
        self.select(ids);
        Ok(())
    }

    /// Reduces the path to at most `num_poses` evenly spaced poses.
    pub fn downsample(&mut self, num_poses: usize) -> Result<(), TrajectoryError> {
        if let Some(ids) = downsample_ids(self.num_poses(), num_poses)? {
            self.select(&ids);
        }
        Ok(())
    }

    /// Keeps only poses that moved at least `distance_threshold` meters along the
    /// path or rotated at least `angle_threshold` since the last kept pose.
    pub fn motion_filter(
        &mut self,
        distance_threshold: f64,
        angle_threshold: f64,
        degrees: bool,
    ) -> Result<(), TrajectoryError> {
        let ids =
            filters::filter_by_motion(self.poses(), distance_threshold, angle_threshold, degrees)?;
        self.select(&ids);
        Ok(())
    }

    /// Splits the path wherever consecutive positions are more than `max_gap` meters apart.
    pub fn split_distance_gaps(&self, max_gap: f64) -> Vec<PosePath3D> {
        let positions = self.positions();
        split_ranges(positions.len(), |i| {
            positions[i].distance(positions[i + 1]) > max_gap
        })
        .into_iter()
        .map(|range| self.subset(&range.collect::<Vec<_>>()))
        .collect()
    }

    /// Checks the internal consistency of the path.
    ///
    /// Returns the overall verdict and a human readable detail per check.
    pub fn check(&self) -> (bool, BTreeMap<String, String>) {
        let num_poses = self.num_poses();
        let same_len = self.positions().len() == num_poses
            && self.orientations().len() == num_poses
            && self.poses().len() == num_poses;
        let se3_valid = self.poses().iter().all(se3::is_se3);
        let quat_normed = self
            .orientations()
            .iter()
            .all(|q| (q.length() - 1.0).abs() <= EQUALITY_TOLERANCE);

        let mut details = BTreeMap::new();
        details.insert(
            "array shapes".to_string(),
            verdict(same_len, "ok", "invalid (lists must have same length)"),
        );
        details.insert(
            "SE(3) conform".to_string(),
            verdict(se3_valid, "yes", "no (poses are not valid SE(3) matrices)"),
        );
        details.insert(
            "quaternions".to_string(),
            verdict(quat_normed, "ok", "invalid (must be unit quaternions)"),
        );
        (same_len && se3_valid && quat_normed, details)
    }

    /// Summary of the path.
    pub fn infos(&self) -> PathInfos {
        let positions = self.positions();
        PathInfos {
            num_poses: positions.len(),
            path_length: self.path_length(),
            pos_start: positions[0].to_array(),
            pos_end: positions[positions.len() - 1].to_array(),
        }
    }

    /// Approximate comparison of poses, positions and orientations.
    ///
    /// Quaternions `q` and `-q` compare equal.
    pub fn approx_eq(&self, other: &PosePath3D, max_abs_diff: f64) -> bool {
        if self.num_poses() != other.num_poses() {
            return false;
        }
        let poses_eq = self
            .poses()
            .iter()
            .zip(other.poses())
            .all(|(a, b)| a.abs_diff_eq(*b, max_abs_diff));
        let positions_eq = self
            .positions()
            .iter()
            .zip(other.positions())
            .all(|(a, b)| a.abs_diff_eq(*b, max_abs_diff));
        let orientations_eq = self
            .orientations()
            .iter()
            .zip(other.orientations())
            .all(|(a, b)| so3::quat_eq(*a, *b, max_abs_diff));
        poses_eq && positions_eq && orientations_eq
    }

    pub(crate) fn check_ids(&self, ids: &[usize]) -> Result<(), TrajectoryError> {
        if ids.is_empty() {
            return Err(TrajectoryError::Empty);
        }
        let len = self.num_poses();
        match ids.iter().find(|&&i| i >= len) {
            Some(&index) => Err(TrajectoryError::IndexOutOfBounds { index, len }),
            None => Ok(()),
        }
    }

    // ids must be non-empty and in range
    pub(crate) fn select(&mut self, ids: &[usize]) {
        select_cell(&mut self.positions, ids);
        select_cell(&mut self.orientations, ids);
        select_cell(&mut self.poses, ids);
    }

    pub(crate) fn subset(&self, ids: &[usize]) -> Self {
        let mut path = self.clone();
        path.select(ids);
        path
    }

    fn set_poses(&mut self, poses: Vec<DMat4>) {
        self.positions = OnceCell::new();
        self.orientations = OnceCell::new();
        self.poses = OnceCell::from(poses);
    }
}

impl PartialEq for PosePath3D {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, EQUALITY_TOLERANCE)
    }
}

impl std::fmt::Display for PosePath3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} poses, {:.3}m path length",
            self.num_poses(),
            self.path_length()
        )
    }
}

/// Converts SE(3) matrices to positions and scalar-first quaternions.
pub fn se3_poses_to_xyz_quat_wxyz(poses: &[DMat4]) -> (Vec<[f64; 3]>, Vec<[f64; 4]>) {
    poses
        .iter()
        .map(|p| {
            let q = so3::to_quat(&DMat3::from_mat4(*p));
            (se3::translation(p).to_array(), so3::quat_to_wxyz(q))
        })
        .unzip()
}

/// Indices of `num_target` evenly spaced poses out of `num_poses`.
///
/// Returns `None` if no reduction is needed.
pub(crate) fn downsample_ids(
    num_poses: usize,
    num_target: usize,
) -> Result<Option<Vec<usize>>, TrajectoryError> {
    if num_target < 1 {
        return Err(TrajectoryError::InvalidDownsample(num_target));
    }
    if num_poses <= num_target {
        return Ok(None);
    }
    if num_target == 1 {
        return Ok(Some(vec![0]));
    }
    let last = num_poses - 1;
    let ids = (0..num_target)
        .map(|i| i * last / (num_target - 1))
        .collect();
    Ok(Some(ids))
}

/// Splits `0..len` into consecutive ranges, breaking between `i` and `i + 1`
/// whenever `is_gap(i)` holds.
pub(crate) fn split_ranges(len: usize, is_gap: impl Fn(usize) -> bool) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for i in 0..len.saturating_sub(1) {
        if is_gap(i) {
            ranges.push(start..i + 1);
            start = i + 1;
        }
    }
    if start < len {
        ranges.push(start..len);
    }
    ranges
}

pub(crate) fn verdict(ok: bool, good: &str, bad: &str) -> String {
    if ok {
        good.to_string()
    } else {
        bad.to_string()
    }
}

fn select_cell<T: Copy>(cell: &mut OnceCell<Vec<T>>, ids: &[usize]) {
    if let Some(values) = cell.take() {
        *cell = OnceCell::from(ids.iter().map(|&i| values[i]).collect::<Vec<_>>());
    }
}

fn check_len(
    what: &'static str,
    expected: usize,
    got: Option<usize>,
) -> Result<(), TrajectoryError> {
    match got {
        Some(got) if got != expected => Err(TrajectoryError::LengthMismatch {
            what,
            expected,
            got,
        }),
        _ => Ok(()),
    }
}
