use std::collections::BTreeMap;
use std::ops::Deref;

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use trajeval_geometry::UmeyamaOutput;
use trajeval_lie::{se3, so3};

use crate::path::{self, PathInfos, Plane, PosePath3D, EQUALITY_TOLERANCE};
use crate::{filters, TrajectoryError};

/// Summary of a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryInfos {
    /// Path summary.
    #[serde(flatten)]
    pub path: PathInfos,
    /// Duration in seconds.
    pub duration: f64,
    /// First timestamp in seconds.
    pub t_start: f64,
    /// Last timestamp in seconds.
    pub t_end: f64,
}

/// Speed statistics of a trajectory, in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStatistics {
    /// Maximum speed.
    pub v_max: f64,
    /// Minimum speed.
    pub v_min: f64,
    /// Average speed.
    pub v_avg: f64,
}

impl TrajectoryStatistics {
    /// Statistics keyed by name and unit, in m/s and km/h.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        for (name, value) in [("v_max", self.v_max), ("v_min", self.v_min), ("v_avg", self.v_avg)] {
            map.insert(format!("{name} (m/s)"), value);
            map.insert(format!("{name} (km/h)"), value * 3.6);
        }
        map
    }
}

/// A [`PosePath3D`] with one timestamp per pose.
///
/// Read access to the path is available through `Deref`. Operations that change
/// the number or order of poses are implemented here so the timestamps follow.
#[derive(Debug, Clone)]
pub struct PoseTrajectory3D {
    path: PosePath3D,
    timestamps: Vec<f64>,
}

impl PoseTrajectory3D {
    /// Attaches timestamps in seconds to a path.
    pub fn new(path: PosePath3D, timestamps: Vec<f64>) -> Result<Self, TrajectoryError> {
        if timestamps.len() != path.num_poses() {
            return Err(TrajectoryError::LengthMismatch {
                what: "timestamps",
                expected: path.num_poses(),
                got: timestamps.len(),
            });
        }
        Ok(Self { path, timestamps })
    }

    /// Creates a trajectory from SE(3) matrices and timestamps.
    pub fn from_poses(poses: Vec<DMat4>, timestamps: Vec<f64>) -> Result<Self, TrajectoryError> {
        Self::new(PosePath3D::from_poses(poses)?, timestamps)
    }

    /// Creates a trajectory from positions, unit quaternions and timestamps.
    pub fn from_positions_orientations(
        positions: Vec<DVec3>,
        orientations: Vec<DQuat>,
        timestamps: Vec<f64>,
    ) -> Result<Self, TrajectoryError> {
        Self::new(
            PosePath3D::from_positions_orientations(positions, orientations)?,
            timestamps,
        )
    }

    /// Timestamps in seconds.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// The underlying pose path.
    pub fn path(&self) -> &PosePath3D {
        &self.path
    }

    /// Drops the timestamps.
    pub fn into_path(self) -> PosePath3D {
        self.path
    }

    /// Timestamps relative to the first one.
    pub fn seconds_from_start(&self) -> Vec<f64> {
        let t0 = self.timestamps[0];
        self.timestamps.iter().map(|t| t - t0).collect()
    }

    /// Time between the first and the last pose.
    pub fn duration(&self) -> f64 {
        self.timestamps[self.timestamps.len() - 1] - self.timestamps[0]
    }

    /// True if the timestamps are strictly ascending.
    pub fn has_ascending_timestamps(&self) -> bool {
        self.timestamps.windows(2).all(|w| w[0] < w[1])
    }

    /// Speed between consecutive poses in m/s.
    pub fn speeds(&self) -> Result<Vec<f64>, TrajectoryError> {
        let positions = self.path.positions();
        (0..positions.len().saturating_sub(1))
            .map(|i| {
                calc_speed(
                    positions[i],
                    positions[i + 1],
                    self.timestamps[i],
                    self.timestamps[i + 1],
                )
            })
            .collect()
    }

    /// Maximum, minimum and average speed.
    pub fn statistics(&self) -> Result<TrajectoryStatistics, TrajectoryError> {
        let speeds = self.speeds()?;
        if speeds.is_empty() {
            return Err(TrajectoryError::TooFewPoses {
                required: 2,
                got: self.num_poses(),
            });
        }
        Ok(TrajectoryStatistics {
            v_max: speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            v_min: speeds.iter().copied().fold(f64::INFINITY, f64::min),
            v_avg: speeds.iter().sum::<f64>() / speeds.len() as f64,
        })
    }

    /// Summary of the trajectory.
    pub fn infos(&self) -> TrajectoryInfos {
        TrajectoryInfos {
            path: self.path.infos(),
            duration: self.duration(),
            t_start: self.timestamps[0],
            t_end: self.timestamps[self.timestamps.len() - 1],
        }
    }

    /// Path checks plus timestamp count and ordering.
    pub fn check(&self) -> (bool, BTreeMap<String, String>) {
        let (mut valid, mut details) = self.path.check();
        let len_valid = self.timestamps.len() == self.path.num_poses();
        let ascending = self.has_ascending_timestamps();
        details.insert(
            "nr. of stamps".to_string(),
            path::verdict(len_valid, "ok", "wrong"),
        );
        details.insert(
            "timestamps".to_string(),
            path::verdict(ascending, "ok", "wrong, not ascending or duplicates"),
        );
        valid &= len_valid && ascending;
        (valid, details)
    }

    /// See [`PosePath3D::transform`].
    pub fn transform(
        &mut self,
        t: &DMat4,
        right_mul: bool,
        propagate: bool,
    ) -> Result<(), TrajectoryError> {
        self.path.transform(t, right_mul, propagate)
    }

    /// See [`PosePath3D::scale`].
    pub fn scale(&mut self, s: f64) -> Result<(), TrajectoryError> {
        self.path.scale(s)
    }

    /// See [`PosePath3D::project`].
    pub fn project(&mut self, plane: Plane) -> Result<(), TrajectoryError> {
        self.path.project(plane)
    }

    /// See [`PosePath3D::align`].
    pub fn align(
        &mut self,
        reference: &PosePath3D,
        correct_scale: bool,
        correct_only_scale: bool,
        n: Option<usize>,
    ) -> Result<UmeyamaOutput, TrajectoryError> {
        self.path
            .align(reference, correct_scale, correct_only_scale, n)
    }

    /// See [`PosePath3D::align_origin`].
    pub fn align_origin(&mut self, reference: &PosePath3D) -> Result<DMat4, TrajectoryError> {
        self.path.align_origin(reference)
    }

    /// Keeps only the poses and timestamps at `ids`, in the given order.
    pub fn reduce_to_ids(&mut self, ids: &[usize]) -> Result<(), TrajectoryError> {
        self.path.check_ids(ids)?;
        self.select(ids);
        Ok(())
    }

    /// See [`PosePath3D::downsample`].
    pub fn downsample(&mut self, num_poses: usize) -> Result<(), TrajectoryError> {
        if let Some(ids) = path::downsample_ids(self.num_poses(), num_poses)? {
            self.select(&ids);
        }
        Ok(())
    }

    /// See [`PosePath3D::motion_filter`].
    pub fn motion_filter(
        &mut self,
        distance_threshold: f64,
        angle_threshold: f64,
        degrees: bool,
    ) -> Result<(), TrajectoryError> {
        let ids = filters::filter_by_motion(
            self.path.poses(),
            distance_threshold,
            angle_threshold,
            degrees,
        )?;
        self.select(&ids);
        Ok(())
    }

    /// Keeps the poses with timestamps in `[start, end]`.
    ///
    /// Missing bounds default to the first and last timestamp.
    pub fn reduce_to_time_range(
        &mut self,
        start: Option<f64>,
        end: Option<f64>,
    ) -> Result<(), TrajectoryError> {
        if self.timestamps.windows(2).any(|w| w[0] > w[1]) {
            return Err(TrajectoryError::UnsortedTimestamps);
        }
        let start = start.unwrap_or(self.timestamps[0]);
        let end = end.unwrap_or(self.timestamps[self.timestamps.len() - 1]);
        if start > end {
            return Err(TrajectoryError::InvalidTimeRange { start, end });
        }
        let first = self.timestamps.partition_point(|t| *t < start);
        let last = self.timestamps.partition_point(|t| *t <= end);
        if first >= last {
            return Err(TrajectoryError::Empty);
        }
        self.select(&(first..last).collect::<Vec<_>>());
        Ok(())
    }

    /// Splits wherever consecutive positions are more than `max_gap` meters apart.
    pub fn split_distance_gaps(&self, max_gap: f64) -> Vec<PoseTrajectory3D> {
        let positions = self.path.positions();
        self.split(|i| positions[i].distance(positions[i + 1]) > max_gap)
    }

    /// Splits wherever consecutive timestamps are more than `max_gap` seconds apart.
    pub fn split_time_gaps(&self, max_gap: f64) -> Vec<PoseTrajectory3D> {
        self.split(|i| self.timestamps[i + 1] - self.timestamps[i] > max_gap)
    }

    /// Splits wherever the speed between consecutive poses exceeds `max_speed` m/s.
    pub fn split_speed_outliers(
        &self,
        max_speed: f64,
    ) -> Result<Vec<PoseTrajectory3D>, TrajectoryError> {
        let speeds = self.speeds()?;
        Ok(self.split(|i| speeds[i] > max_speed))
    }

    /// Concatenates trajectories and sorts the result by timestamp.
    ///
    /// Poses with equal timestamps keep their input order.
    pub fn merge(trajectories: &[PoseTrajectory3D]) -> Result<PoseTrajectory3D, TrajectoryError> {
        let mut entries: Vec<(f64, DMat4)> = trajectories
            .iter()
            .flat_map(|traj| traj.timestamps.iter().copied().zip(traj.poses().iter().copied()))
            .collect();
        if entries.is_empty() {
            return Err(TrajectoryError::Empty);
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (timestamps, poses) = entries.into_iter().unzip();
        PoseTrajectory3D::from_poses(poses, timestamps)
    }

    fn split(&self, is_gap: impl Fn(usize) -> bool) -> Vec<PoseTrajectory3D> {
        path::split_ranges(self.num_poses(), is_gap)
            .into_iter()
            .map(|range| {
                let ids: Vec<usize> = range.collect();
                PoseTrajectory3D {
                    path: self.path.subset(&ids),
                    timestamps: ids.iter().map(|&i| self.timestamps[i]).collect(),
                }
            })
            .collect()
    }

    // ids must be non-empty and in range
    fn select(&mut self, ids: &[usize]) {
        self.path.select(ids);
        self.timestamps = ids.iter().map(|&i| self.timestamps[i]).collect();
    }
}

impl Deref for PoseTrajectory3D {
    type Target = PosePath3D;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl AsRef<PosePath3D> for PoseTrajectory3D {
    fn as_ref(&self) -> &PosePath3D {
        &self.path
    }
}

impl From<PoseTrajectory3D> for PosePath3D {
    fn from(traj: PoseTrajectory3D) -> Self {
        traj.path
    }
}

impl PartialEq for PoseTrajectory3D {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.timestamps.len() == other.timestamps.len()
            && self
                .timestamps
                .iter()
                .zip(&other.timestamps)
                .all(|(a, b)| (a - b).abs() <= EQUALITY_TOLERANCE)
    }
}

impl std::fmt::Display for PoseTrajectory3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {:.3}s duration", self.path, self.duration())
    }
}

/// Speed in m/s between two positions.
///
/// Fails unless `t_2 > t_1`.
pub fn calc_speed(xyz_1: DVec3, xyz_2: DVec3, t_1: f64, t_2: f64) -> Result<f64, TrajectoryError> {
    if t_2 - t_1 <= 0.0 {
        return Err(TrajectoryError::BadTimestamps(t_1, t_2));
    }
    Ok(xyz_1.distance(xyz_2) / (t_2 - t_1))
}

/// Angular speed between two poses in rad/s, or deg/s with `degrees`.
///
/// Fails unless `t_2 > t_1`.
pub fn calc_angular_speed(
    p_1: &DMat4,
    p_2: &DMat4,
    t_1: f64,
    t_2: f64,
    degrees: bool,
) -> Result<f64, TrajectoryError> {
    if t_2 - t_1 <= 0.0 {
        return Err(TrajectoryError::BadTimestamps(t_1, t_2));
    }
    let rel = so3::relative(&se3::rotation(p_1), &se3::rotation(p_2));
    let mut angle = so3::log_angle(&rel)?;
    if degrees {
        angle = angle.to_degrees();
    }
    Ok(angle / (t_2 - t_1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line_trajectory(stamps: &[f64]) -> PoseTrajectory3D {
        let poses = (0..stamps.len())
            .map(|i| se3::from_translation(DVec3::new(i as f64, 0.0, 0.0)))
            .collect();
        PoseTrajectory3D::from_poses(poses, stamps.to_vec()).unwrap()
    }

    #[test]
    fn test_length_mismatch() {
        let path = PosePath3D::from_poses(vec![DMat4::IDENTITY; 3]).unwrap();
        assert_eq!(
            PoseTrajectory3D::new(path, vec![0.0, 1.0]).unwrap_err(),
            TrajectoryError::LengthMismatch {
                what: "timestamps",
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn test_speeds_and_statistics() -> Result<(), TrajectoryError> {
        let traj = line_trajectory(&[0.0, 1.0, 1.5, 2.5]);
        assert_eq!(traj.speeds()?, vec![1.0, 2.0, 1.0]);
        let stats = traj.statistics()?;
        assert_eq!(stats.v_max, 2.0);
        assert_eq!(stats.v_min, 1.0);
        assert_relative_eq!(stats.v_avg, 4.0 / 3.0);
        assert_relative_eq!(stats.to_map()["v_max (km/h)"], 7.2);

        let single = line_trajectory(&[0.0]);
        assert_eq!(
            single.statistics(),
            Err(TrajectoryError::TooFewPoses {
                required: 2,
                got: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_calc_speed_bad_timestamps() {
        assert_eq!(
            calc_speed(DVec3::ZERO, DVec3::X, 1.0, 1.0),
            Err(TrajectoryError::BadTimestamps(1.0, 1.0))
        );
        let p = DMat4::IDENTITY;
        assert!(calc_angular_speed(&p, &p, 2.0, 1.0, false).is_err());
    }

    #[test]
    fn test_reduce_to_ids_keeps_timestamps() -> Result<(), TrajectoryError> {
        let mut traj = line_trajectory(&[0.0, 0.1, 0.2, 0.3]);
        traj.reduce_to_ids(&[1, 3])?;
        assert_eq!(traj.timestamps(), &[0.1, 0.3]);
        assert_eq!(traj.positions()[1].x, 3.0);
        Ok(())
    }

    #[test]
    fn test_downsample() -> Result<(), TrajectoryError> {
        let mut traj = line_trajectory(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        traj.downsample(3)?;
        assert_eq!(traj.timestamps(), &[0.0, 2.0, 4.0]);
        assert_eq!(traj.num_poses(), 3);
        Ok(())
    }

    #[test]
    fn test_check_timestamps() {
        let traj = line_trajectory(&[0.0, 1.0, 1.0]);
        let (valid, details) = traj.check();
        assert!(!valid);
        assert_eq!(details["timestamps"], "wrong, not ascending or duplicates");
        assert_eq!(details["nr. of stamps"], "ok");
        assert!(line_trajectory(&[0.0, 1.0, 2.0]).check().0);
    }

    #[test]
    fn test_reduce_to_time_range() -> Result<(), TrajectoryError> {
        let mut traj = line_trajectory(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        traj.reduce_to_time_range(Some(0.5), Some(3.0))?;
        assert_eq!(traj.timestamps(), &[1.0, 2.0, 3.0]);
        traj.reduce_to_time_range(None, Some(2.0))?;
        assert_eq!(traj.timestamps(), &[1.0, 2.0]);
        assert_eq!(
            traj.reduce_to_time_range(Some(2.0), Some(1.0)),
            Err(TrajectoryError::InvalidTimeRange {
                start: 2.0,
                end: 1.0
            })
        );
        assert_eq!(
            traj.reduce_to_time_range(Some(5.0), None),
            Err(TrajectoryError::InvalidTimeRange {
                start: 5.0,
                end: 2.0
            })
        );

        let mut unsorted = line_trajectory(&[1.0, 0.0]);
        assert_eq!(
            unsorted.reduce_to_time_range(None, None),
            Err(TrajectoryError::UnsortedTimestamps)
        );
        Ok(())
    }

    #[test]
    fn test_split_time_gaps_and_speed_outliers() -> Result<(), TrajectoryError> {
        let traj = line_trajectory(&[0.0, 1.0, 2.0, 10.0, 11.0]);
        let segments = traj.split_time_gaps(2.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].timestamps(), &[0.0, 1.0, 2.0]);
        assert_eq!(segments[1].timestamps(), &[10.0, 11.0]);

        let segments = traj.split_speed_outliers(0.5)?;
        let sizes: Vec<usize> = segments.iter().map(|s| s.num_poses()).collect();
        assert_eq!(sizes, vec![1, 1, 2, 1]);
        assert_eq!(traj.split_distance_gaps(5.0).len(), 1);
        Ok(())
    }

    #[test]
    fn test_merge() -> Result<(), TrajectoryError> {
        let a = line_trajectory(&[0.0, 2.0, 4.0]);
        let b = line_trajectory(&[1.0, 3.0]);
        let merged = PoseTrajectory3D::merge(&[a, b])?;
        assert_eq!(merged.timestamps(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let xs: Vec<f64> = merged.positions().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.0, 1.0, 1.0, 2.0]);
        assert_eq!(PoseTrajectory3D::merge(&[]), Err(TrajectoryError::Empty));
        Ok(())
    }

    #[test]
    fn test_equality_and_display() {
        let a = line_trajectory(&[0.0, 1.0]);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.timestamps[1] = 1.5;
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "2 poses, 1.000m path length, 1.000s duration");
        let infos = a.infos();
        assert_eq!(infos.duration, 1.0);
        assert_eq!(infos.path.num_poses, 2);
    }

    #[test]
    fn test_seconds_from_start() {
        let traj = line_trajectory(&[10.0, 10.5, 12.0]);
        assert_eq!(traj.seconds_from_start(), vec![0.0, 0.5, 2.0]);
        assert_eq!(traj.duration(), 2.0);
    }
}
