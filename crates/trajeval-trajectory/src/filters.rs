//! Index pair selection for relative pose comparisons.
//!
//! In consecutive mode a filter walks the sequence once and cuts it into
//! non-overlapping segments whenever the accumulated criterion reaches `delta`.
//! In all-pairs mode every pair whose criterion lies in `delta +- tol` is kept.

use glam::DMat4;
use trajeval_geometry::accumulated_distances;
use trajeval_lie::{se3, so3, LieError};

use crate::trajectory::{calc_angular_speed, calc_speed};
use crate::{TrajectoryError, Unit};

/// Index pairs `(i, j)` into a pose sequence.
pub type IdPairs = Vec<(usize, usize)>;

/// An error type for the pair filters.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FilterError {
    /// Deltas must be positive, and integral when counted in frames.
    #[error("invalid delta {delta} for unit {unit}")]
    InvalidDelta {
        /// The rejected delta.
        delta: f64,
        /// Unit of the delta.
        unit: Unit,
    },

    /// Only frames, meters, degrees and radians can be used as delta units.
    #[error("unsupported delta unit: {0}")]
    UnsupportedDeltaUnit(Unit),

    /// No pair matched the criterion.
    #[error(
        "empty pair list for delta {delta} {unit} (relative tolerance {rel_tol}), \
         try a different delta or tolerance"
    )]
    NoPairs {
        /// Requested delta.
        delta: f64,
        /// Unit of the delta.
        unit: Unit,
        /// Relative tolerance.
        rel_tol: f64,
    },

    /// Timestamps and poses differ in length.
    #[error("got {timestamps} timestamps for {poses} poses")]
    TimestampMismatch {
        /// Number of timestamps.
        timestamps: usize,
        /// Number of poses.
        poses: usize,
    },

    /// Invalid rotation in the input poses.
    #[error(transparent)]
    Lie(#[from] LieError),

    /// Invalid timing in the input.
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}

/// Result of a bounded binary search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Index of the accepted value, if any.
    pub index: Option<usize>,
    /// Absolute difference between the accepted value and the target.
    pub residual: f64,
    /// Number of iterations.
    pub num_iterations: usize,
}

/// Binary search for `target` over `0..len` accepting values in `[lower, upper]`.
///
/// `f` is evaluated lazily and must be non-decreasing. Once a value inside the
/// bounds is found, the search keeps moving towards neighbours that are closer
/// to the target and stops at a local optimum. `f` is also called with `-1` and
/// `len` at the borders.
pub fn bounded_binary_search(
    f: impl Fn(isize) -> f64,
    len: usize,
    target: f64,
    lower: f64,
    upper: f64,
) -> SearchResult {
    let mut start: isize = 0;
    let mut end: isize = len as isize - 1;
    let mut residual = 0.0;
    let mut num_iterations = 0;

    while start <= end {
        num_iterations += 1;
        let mid = (start + end) / 2;
        let value = f(mid);
        if lower <= value && value <= upper {
            residual = (value - target).abs();
            if (f(mid - 1) - target).abs() <= residual {
                end = mid - 1;
                continue;
            } else if (f(mid + 1) - target).abs() < residual {
                start = mid + 1;
                continue;
            }
            return SearchResult {
                index: Some(mid as usize),
                residual,
                num_iterations,
            };
        }
        if target < value {
            end = mid - 1;
        } else {
            start = mid + 1;
        }
    }
    SearchResult {
        index: None,
        residual,
        num_iterations,
    }
}

/// Pairs of poses that are `delta` indices apart.
///
/// Consecutive mode yields `(0, delta), (delta, 2 * delta), ...`.
pub fn filter_pairs_by_index(
    num_poses: usize,
    delta: usize,
    all_pairs: bool,
) -> Result<IdPairs, FilterError> {
    if delta == 0 {
        return Err(FilterError::InvalidDelta {
            delta: 0.0,
            unit: Unit::Frames,
        });
    }
    if all_pairs {
        return Ok((0..num_poses)
            .filter(|i| i + delta < num_poses)
            .map(|i| (i, i + delta))
            .collect());
    }
    let ids: Vec<usize> = (0..num_poses).step_by(delta).collect();
    Ok(consecutive_pairs(&ids))
}

/// Pairs of poses whose direct Euclidean distance is `delta` meters.
pub fn filter_pairs_by_distance(poses: &[DMat4], delta: f64, tol: f64, all_pairs: bool) -> IdPairs {
    let positions: Vec<_> = poses.iter().map(se3::translation).collect();
    if all_pairs {
        let (lower, upper) = (delta - tol, delta + tol);
        let mut pairs = Vec::new();
        for i in 0..positions.len() {
            for j in i + 1..positions.len() {
                let dist = positions[i].distance(positions[j]);
                if lower <= dist && dist <= upper {
                    pairs.push((i, j));
                }
            }
        }
        return pairs;
    }
    let mut ids = vec![0];
    let mut anchor = 0;
    for (j, p) in positions.iter().enumerate().skip(1) {
        if positions[anchor].distance(*p) >= delta {
            ids.push(j);
            anchor = j;
        }
    }
    consecutive_pairs(&ids)
}

/// Pairs of poses whose traveled path length is `delta` meters.
///
/// In all-pairs mode the end index for each start is found by a bounded binary
/// search over the accumulated distances.
pub fn filter_pairs_by_path(poses: &[DMat4], delta: f64, tol: f64, all_pairs: bool) -> IdPairs {
    let positions: Vec<_> = poses.iter().map(se3::translation).collect();
    if positions.is_empty() {
        return Vec::new();
    }
    let distances = accumulated_distances(&positions);

    if all_pairs {
        let (lower, upper) = (delta - tol, delta + tol);
        let last = distances.len() as isize - 1;
        let mut pairs = Vec::new();
        let mut residual_sum = 0.0;
        for i in 0..distances.len() {
            // path length from i to x, zero for x <= i
            let path_to = |x: isize| {
                if x <= i as isize {
                    0.0
                } else {
                    distances[x.min(last) as usize] - distances[i]
                }
            };
            let result = bounded_binary_search(path_to, distances.len(), delta, lower, upper);
            if let Some(j) = result.index {
                residual_sum += result.residual;
                pairs.push((i, j));
            }
        }
        if pairs.is_empty() {
            log::debug!("found no pairs for path delta {delta}m");
        } else {
            log::debug!(
                "found {} pairs for path delta {delta}m, avg. residual {:.6}m",
                pairs.len(),
                residual_sum / pairs.len() as f64
            );
        }
        return pairs;
    }

    let mut ids = vec![0];
    let mut current_path = 0.0;
    for i in 1..positions.len() {
        current_path += distances[i] - distances[i - 1];
        if current_path >= delta {
            ids.push(i);
            current_path = 0.0;
        }
    }
    consecutive_pairs(&ids)
}

/// Pairs of poses whose relative rotation angle is `delta`.
///
/// Consecutive mode accumulates the rotation angle between neighbouring poses.
/// All-pairs mode uses the direct angle between the two poses of a pair. Both are
/// invariant to a global transformation of the poses.
pub fn filter_pairs_by_angle(
    poses: &[DMat4],
    delta: f64,
    tol: f64,
    degrees: bool,
    all_pairs: bool,
) -> Result<IdPairs, FilterError> {
    let rotations: Vec<_> = poses.iter().map(se3::rotation).collect();
    let angle_between = |i: usize, j: usize| -> Result<f64, LieError> {
        let angle = so3::log_angle(&so3::relative(&rotations[i], &rotations[j]))?;
        Ok(if degrees { angle.to_degrees() } else { angle })
    };

    if all_pairs {
        let (lower, upper) = (delta - tol, delta + tol);
        let mut pairs = Vec::new();
        for i in 0..rotations.len() {
            for j in i + 1..rotations.len() {
                let angle = angle_between(i, j)?;
                if lower <= angle && angle <= upper {
                    pairs.push((i, j));
                }
            }
        }
        return Ok(pairs);
    }

    if rotations.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids = vec![0];
    let mut current_delta = 0.0;
    for i in 1..rotations.len() {
        current_delta += angle_between(i - 1, i)?;
        if current_delta >= delta {
            ids.push(i);
            current_delta = 0.0;
        }
    }
    Ok(consecutive_pairs(&ids))
}

/// Consecutive pairs whose linear speed is within `speed +- tol` m/s.
pub fn filter_pairs_by_speed(
    poses: &[DMat4],
    timestamps: &[f64],
    speed: f64,
    tol: f64,
) -> Result<IdPairs, FilterError> {
    check_timestamps(poses, timestamps)?;
    let mut pairs = Vec::new();
    for i in 0..poses.len().saturating_sub(1) {
        let v = calc_speed(
            se3::translation(&poses[i]),
            se3::translation(&poses[i + 1]),
            timestamps[i],
            timestamps[i + 1],
        )?;
        if speed - tol <= v && v <= speed + tol {
            pairs.push((i, i + 1));
        }
    }
    Ok(pairs)
}

/// Consecutive pairs whose angular speed is within `speed +- tol` rad/s (or deg/s).
pub fn filter_pairs_by_angular_speed(
    poses: &[DMat4],
    timestamps: &[f64],
    speed: f64,
    tol: f64,
    degrees: bool,
) -> Result<IdPairs, FilterError> {
    check_timestamps(poses, timestamps)?;
    let mut pairs = Vec::new();
    for i in 0..poses.len().saturating_sub(1) {
        let v = calc_angular_speed(
            &poses[i],
            &poses[i + 1],
            timestamps[i],
            timestamps[i + 1],
            degrees,
        )?;
        if speed - tol <= v && v <= speed + tol {
            pairs.push((i, i + 1));
        }
    }
    Ok(pairs)
}

/// Indices of the poses that moved enough since the previously kept pose.
///
/// The first pose is always kept. A pose is kept if the path length since the
/// last kept pose reaches `distance_threshold` meters, or if its rotation
/// relative to the last kept pose reaches `angle_threshold`.
pub fn filter_by_motion(
    poses: &[DMat4],
    distance_threshold: f64,
    angle_threshold: f64,
    degrees: bool,
) -> Result<Vec<usize>, TrajectoryError> {
    for threshold in [distance_threshold, angle_threshold] {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(TrajectoryError::InvalidThreshold(threshold));
        }
    }
    if poses.is_empty() {
        return Ok(Vec::new());
    }
    let positions: Vec<_> = poses.iter().map(se3::translation).collect();
    let distances = accumulated_distances(&positions);

    let mut ids = vec![0];
    let mut last = 0;
    for i in 1..poses.len() {
        if distances[i] - distances[last] >= distance_threshold {
            ids.push(i);
            last = i;
            continue;
        }
        let rel = so3::relative(&se3::rotation(&poses[last]), &se3::rotation(&poses[i]));
        let mut angle = so3::log_angle(&rel)?;
        if degrees {
            angle = angle.to_degrees();
        }
        if angle >= angle_threshold {
            ids.push(i);
            last = i;
        }
    }
    log::debug!("motion filter kept {} of {} poses", ids.len(), poses.len());
    Ok(ids)
}

/// Selects index pairs for a delta given in `unit`.
///
/// Frames select by index, meters by traveled path, degrees and radians by
/// rotation angle. The tolerance of the all-pairs mode is `delta * rel_tol`.
///
/// # Errors
///
/// Fails for unsupported units, invalid deltas, or if no pair is found.
pub fn id_pairs_from_delta(
    poses: &[DMat4],
    delta: f64,
    unit: Unit,
    rel_tol: f64,
    all_pairs: bool,
) -> Result<IdPairs, FilterError> {
    if !(delta > 0.0 && delta.is_finite()) {
        return Err(FilterError::InvalidDelta { delta, unit });
    }
    let tol = delta * rel_tol;
    let pairs = match unit {
        Unit::Frames => {
            if delta.fract() != 0.0 {
                return Err(FilterError::InvalidDelta { delta, unit });
            }
            filter_pairs_by_index(poses.len(), delta as usize, all_pairs)?
        }
        Unit::Meters => filter_pairs_by_path(poses, delta, tol, all_pairs),
        Unit::Degrees => filter_pairs_by_angle(poses, delta, tol, true, all_pairs)?,
        Unit::Radians => filter_pairs_by_angle(poses, delta, tol, false, all_pairs)?,
        other => return Err(FilterError::UnsupportedDeltaUnit(other)),
    };
    if pairs.is_empty() {
        return Err(FilterError::NoPairs {
            delta,
            unit,
            rel_tol,
        });
    }
    Ok(pairs)
}

fn consecutive_pairs(ids: &[usize]) -> IdPairs {
    ids.windows(2).map(|w| (w[0], w[1])).collect()
}

fn check_timestamps(poses: &[DMat4], timestamps: &[f64]) -> Result<(), FilterError> {
    if poses.len() != timestamps.len() {
        return Err(FilterError::TimestampMismatch {
            timestamps: timestamps.len(),
            poses: poses.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DMat3, DVec3};
    use std::f64::consts::PI;

    fn translations(zs: &[f64]) -> Vec<DMat4> {
        zs.iter()
            .map(|z| se3::se3(DMat3::IDENTITY, DVec3::new(0.0, 0.0, *z)))
            .collect()
    }

    fn poses_1() -> Vec<DMat4> {
        translations(&[0.0, 0.5, 0.0, 1.0])
    }

    fn poses_2() -> Vec<DMat4> {
        translations(&[0.0, 0.5, 0.99, 1.0])
    }

    fn poses_3() -> Vec<DMat4> {
        translations(&[
            0.0, 0.9, 0.99, 0.999, 0.9999, 0.99999, 0.999999, 0.9999999,
        ])
    }

    fn rot_x(angle: f64) -> DMat4 {
        se3::se3(so3::exp(DVec3::X * angle), DVec3::ZERO)
    }

    fn poses_5() -> Vec<DMat4> {
        vec![
            rot_x(0.0),
            rot_x(PI),
            rot_x(0.0),
            rot_x(PI / 3.0),
            rot_x(PI),
        ]
    }

    fn poses_6() -> Vec<DMat4> {
        let pd = se3::se3(so3::exp(DVec3::X * (PI / 3.0)), DVec3::new(1.0, 2.0, 3.0));
        let p0 = rot_x(0.0);
        let p1 = p0 * pd;
        let p2 = p1 * pd;
        let p3 = p2 * pd;
        vec![p0, p1, p2, p3, p3]
    }

    fn transformed(poses: &[DMat4]) -> Vec<DMat4> {
        let t = se3::se3(so3::exp(DVec3::new(0.3, -1.1, 0.5)), DVec3::new(4.0, -2.0, 1.0));
        poses.iter().map(|p| t * *p).collect()
    }

    #[test]
    fn test_path_all_pairs() {
        assert_eq!(
            filter_pairs_by_path(&poses_1(), 1.0, 0.0, true),
            vec![(0, 2), (2, 3)]
        );
        assert!(filter_pairs_by_path(&poses_1(), 2.5, 0.0, true).is_empty());
        assert_eq!(filter_pairs_by_path(&poses_2(), 1.0, 0.001, true), vec![(0, 3)]);
        assert_eq!(filter_pairs_by_path(&poses_3(), 1.0, 0.2, true), vec![(0, 7)]);
    }

    #[test]
    fn test_path_all_pairs_within_tolerance() {
        let poses = translations(&[0.0, 0.3, 0.7, 1.2, 1.4, 2.1, 2.2, 3.0]);
        let positions: Vec<_> = poses.iter().map(se3::translation).collect();
        let distances = accumulated_distances(&positions);
        let (delta, tol) = (1.0, 0.15);
        let pairs = filter_pairs_by_path(&poses, delta, tol, true);
        assert!(!pairs.is_empty());
        for (i, j) in pairs {
            let length = distances[j] - distances[i];
            assert!((length - delta).abs() <= tol, "pair ({i}, {j}) has length {length}");
        }
    }

    #[test]
    fn test_path_consecutive() {
        let pairs = filter_pairs_by_path(&translations(&[0.0, 0.5, 1.0, 1.5, 2.0, 2.2]), 1.0, 0.0, false);
        assert_eq!(pairs, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_index() -> Result<(), FilterError> {
        assert_eq!(filter_pairs_by_index(7, 3, false)?, vec![(0, 3), (3, 6)]);
        assert_eq!(filter_pairs_by_index(5, 3, true)?, vec![(0, 3), (1, 4)]);
        assert_eq!(filter_pairs_by_index(4, 1, false)?, vec![(0, 1), (1, 2), (2, 3)]);
        assert!(filter_pairs_by_index(4, 0, false).is_err());
        Ok(())
    }

    #[test]
    fn test_distance() {
        let poses = translations(&[0.0, 0.4, 1.1, 1.5, 2.3]);
        assert_eq!(filter_pairs_by_distance(&poses, 1.0, 0.0, false), vec![(0, 2), (2, 4)]);
        assert_eq!(
            filter_pairs_by_distance(&poses, 1.1, 0.05, true),
            vec![(0, 2), (1, 3)]
        );
    }

    #[test]
    fn test_angle_poses_5() -> Result<(), FilterError> {
        let tol = 0.001;
        let expected = vec![(0, 1), (1, 2), (2, 4)];
        for poses in [poses_5(), transformed(&poses_5())] {
            let delta = PI - tol;
            assert_eq!(filter_pairs_by_angle(&poses, delta, tol, false, false)?, expected);
            let pairs = filter_pairs_by_angle(&poses, delta.to_degrees(), tol, true, false)?;
            assert_eq!(pairs, expected);
        }
        Ok(())
    }

    #[test]
    fn test_angle_poses_5_all_pairs() -> Result<(), FilterError> {
        let tol = 0.01;
        let expected = vec![(0, 1), (0, 4), (1, 2), (2, 4)];
        for poses in [poses_5(), transformed(&poses_5())] {
            assert_eq!(filter_pairs_by_angle(&poses, PI, tol, false, true)?, expected);
            let pairs = filter_pairs_by_angle(&poses, PI.to_degrees(), tol, true, true)?;
            assert_eq!(pairs, expected);
        }
        Ok(())
    }

    #[test]
    fn test_angle_poses_6() -> Result<(), FilterError> {
        let tol = 0.001;
        for poses in [poses_6(), transformed(&poses_6())] {
            assert_eq!(
                filter_pairs_by_angle(&poses, PI - tol, tol, false, false)?,
                vec![(0, 3)]
            );
            assert_eq!(
                filter_pairs_by_angle(&poses, PI, tol, false, true)?,
                vec![(0, 3), (0, 4)]
            );
        }
        Ok(())
    }

    #[test]
    fn test_motion_angle_threshold_only() -> Result<(), TrajectoryError> {
        assert_eq!(filter_by_motion(&poses_5(), 999.0, PI, false)?, vec![0, 1, 2, 4]);
        Ok(())
    }

    #[test]
    fn test_motion_distance_threshold_only() -> Result<(), TrajectoryError> {
        assert_eq!(filter_by_motion(&poses_2(), 0.5, 99.0, false)?, vec![0, 1, 3]);
        assert!(filter_by_motion(&poses_2(), -1.0, 1.0, false).is_err());
        Ok(())
    }

    #[test]
    fn test_speed() -> Result<(), FilterError> {
        let poses = translations(&[0.0, 1.0, 3.0, 4.0]);
        let stamps = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(filter_pairs_by_speed(&poses, &stamps, 1.0, 0.1)?, vec![(0, 1), (2, 3)]);
        let bad_stamps = [0.0, 1.0, 1.0, 2.0];
        assert_eq!(
            filter_pairs_by_speed(&poses, &bad_stamps, 1.0, 0.1),
            Err(FilterError::Trajectory(TrajectoryError::BadTimestamps(1.0, 1.0)))
        );
        Ok(())
    }

    #[test]
    fn test_angular_speed() -> Result<(), FilterError> {
        let poses = vec![rot_x(0.0), rot_x(0.5), rot_x(0.6)];
        let stamps = [0.0, 1.0, 2.0];
        assert_eq!(
            filter_pairs_by_angular_speed(&poses, &stamps, 0.5, 0.01, false)?,
            vec![(0, 1)]
        );
        Ok(())
    }

    #[test]
    fn test_id_pairs_from_delta() -> Result<(), FilterError> {
        let poses = poses_1();
        assert_eq!(
            id_pairs_from_delta(&poses, 1.0, Unit::Frames, 0.1, false)?,
            vec![(0, 1), (1, 2), (2, 3)]
        );
        assert_eq!(
            id_pairs_from_delta(&poses, 1.0, Unit::Meters, 0.0, true)?,
            vec![(0, 2), (2, 3)]
        );
        assert_eq!(
            id_pairs_from_delta(&poses, 1.5, Unit::Frames, 0.1, false),
            Err(FilterError::InvalidDelta {
                delta: 1.5,
                unit: Unit::Frames
            })
        );
        assert_eq!(
            id_pairs_from_delta(&poses, 1.0, Unit::Seconds, 0.1, false),
            Err(FilterError::UnsupportedDeltaUnit(Unit::Seconds))
        );
        assert!(matches!(
            id_pairs_from_delta(&poses, 10.0, Unit::Frames, 0.1, false),
            Err(FilterError::NoPairs { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_bounded_binary_search() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let f = |x: isize| values[x.clamp(0, 5) as usize];
        let result = bounded_binary_search(f, values.len(), 3.2, 2.5, 3.5);
        assert_eq!(result.index, Some(3));
        assert!(result.num_iterations > 0);
        assert_eq!(bounded_binary_search(f, values.len(), 9.0, 8.5, 9.5).index, None);
    }
}
