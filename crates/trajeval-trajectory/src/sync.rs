use serde::{Deserialize, Serialize};

use crate::{PoseTrajectory3D, TrajectoryError};

/// An error type for trajectory synchronization.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SyncError {
    /// No timestamp pair is within the allowed difference.
    #[error(
        "found no matching timestamps between {first_name} and {snd_name} \
         with max. time diff. {max_diff} (s) and time offset {offset_2} (s)"
    )]
    NoMatches {
        /// Name of the first trajectory.
        first_name: String,
        /// Name of the second trajectory.
        snd_name: String,
        /// Maximum allowed difference in seconds.
        max_diff: f64,
        /// Offset added to the second trajectory's timestamps.
        offset_2: f64,
    },

    /// Association needs ascending timestamps.
    #[error("timestamps of {0} are not sorted in ascending order")]
    UnsortedTimestamps(String),

    /// Reducing a trajectory to the matches failed.
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}

/// Parameters of [`associate_trajectories`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    /// Maximum timestamp difference of a match, in seconds.
    pub max_diff: f64,
    /// Offset added to the timestamps of the second trajectory, in seconds.
    pub offset_2: f64,
    /// Match the longer trajectory into the shorter one instead.
    pub invert: bool,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            max_diff: 0.01,
            offset_2: 0.0,
            invert: false,
        }
    }
}

/// Matches every timestamp of `stamps_1` to the closest one of `stamps_2 + offset_2`.
///
/// Returns the matched indices into `stamps_1` and `stamps_2`. Timestamps without
/// a partner within `max_diff` are dropped. Several entries of `stamps_1` may
/// match the same entry of `stamps_2`; the first closest entry wins ties.
pub fn matching_time_indices(
    stamps_1: &[f64],
    stamps_2: &[f64],
    max_diff: f64,
    offset_2: f64,
) -> (Vec<usize>, Vec<usize>) {
    let mut matching_1 = Vec::new();
    let mut matching_2 = Vec::new();
    for (index_1, stamp) in stamps_1.iter().enumerate() {
        let closest = stamps_2
            .iter()
            .map(|s| (s + offset_2 - stamp).abs())
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, diff)| match best {
                Some((_, best_diff)) if best_diff <= diff => best,
                _ => Some((i, diff)),
            });
        if let Some((index_2, diff)) = closest {
            if diff <= max_diff {
                matching_1.push(index_1);
                matching_2.push(index_2);
            }
        }
    }
    (matching_1, matching_2)
}

/// Associates two trajectories by their timestamps.
///
/// The shorter trajectory is matched into the longer one, which is then reduced
/// to the matched poses. The reduced trajectory is matched back into the
/// shorter one to reduce it as well. Both results have the same length and
/// pairwise corresponding timestamps. With `invert` the roles are swapped.
///
/// # Errors
///
/// Fails if a trajectory has unsorted timestamps or if no pair of timestamps
/// is within `max_diff`.
pub fn associate_trajectories(
    traj_1: &PoseTrajectory3D,
    traj_2: &PoseTrajectory3D,
    config: &AssociationConfig,
    first_name: &str,
    snd_name: &str,
) -> Result<(PoseTrajectory3D, PoseTrajectory3D), SyncError> {
    for (traj, name) in [(traj_1, first_name), (traj_2, snd_name)] {
        if traj.timestamps().windows(2).any(|w| w[0] > w[1]) {
            return Err(SyncError::UnsortedTimestamps(name.to_string()));
        }
    }

    let no_matches = || SyncError::NoMatches {
        first_name: first_name.to_string(),
        snd_name: snd_name.to_string(),
        max_diff: config.max_diff,
        offset_2: config.offset_2,
    };

    let snd_longer = traj_2.num_poses() > traj_1.num_poses();
    let snd_is_long = snd_longer != config.invert;
    let (mut traj_long, mut traj_short) = if snd_is_long {
        (traj_2.clone(), traj_1.clone())
    } else {
        (traj_1.clone(), traj_2.clone())
    };
    // offset of the long trajectory's timestamps relative to the short one
    let offset_long = if snd_is_long {
        config.offset_2
    } else {
        -config.offset_2
    };
    let num_short = traj_short.num_poses();

    let (_, matching_long) = matching_time_indices(
        traj_short.timestamps(),
        traj_long.timestamps(),
        config.max_diff,
        offset_long,
    );
    if matching_long.is_empty() {
        return Err(no_matches());
    }
    traj_long.reduce_to_ids(&matching_long)?;

    let (_, matching_short) = matching_time_indices(
        traj_long.timestamps(),
        traj_short.timestamps(),
        config.max_diff,
        -offset_long,
    );
    if matching_short.is_empty() {
        return Err(no_matches());
    }
    traj_short.reduce_to_ids(&matching_short)?;

    log::debug!(
        "found {} of max. {} possible matching timestamps between {} and {} \
         with max. time diff. {} (s) and time offset {} (s)",
        matching_short.len(),
        num_short,
        first_name,
        snd_name,
        config.max_diff,
        config.offset_2
    );

    if snd_is_long {
        Ok((traj_short, traj_long))
    } else {
        Ok((traj_long, traj_short))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DMat4;

    fn fake_trajectory(num_poses: usize, timestamp_distance: f64, start: f64) -> PoseTrajectory3D {
        let stamps: Vec<f64> = (0..num_poses)
            .map(|i| start + i as f64 * timestamp_distance)
            .collect();
        PoseTrajectory3D::from_poses(vec![DMat4::IDENTITY; num_poses], stamps).unwrap()
    }

    #[test]
    fn test_matching_time_indices() {
        let stamps_1 = [0.0, 1.0, 2.0, 3.0];
        let stamps_2 = [0.005, 2.02, 2.995, 5.0];
        let (ids_1, ids_2) = matching_time_indices(&stamps_1, &stamps_2, 0.01, 0.0);
        assert_eq!(ids_1, vec![0, 3]);
        assert_eq!(ids_2, vec![0, 2]);

        let (ids_1, ids_2) = matching_time_indices(&stamps_1, &stamps_2, 0.01, -0.02);
        assert_eq!(ids_1, vec![2]);
        assert_eq!(ids_2, vec![1]);
        assert_eq!(matching_time_indices(&stamps_1, &[], 1.0, 0.0), (vec![], vec![]));
    }

    #[test]
    fn test_association() -> Result<(), SyncError> {
        let traj_1 = fake_trajectory(10, 0.1, 0.0);
        let traj_2 = fake_trajectory(100, 0.01, 0.0);
        let (a, b) = associate_trajectories(
            &traj_1,
            &traj_2,
            &AssociationConfig::default(),
            "reference",
            "estimate",
        )?;
        assert_eq!(a.num_poses(), 10);
        assert_eq!(b.num_poses(), 10);
        for (t_a, t_b) in a.timestamps().iter().zip(b.timestamps()) {
            assert!((t_a - t_b).abs() <= 0.01);
        }
        Ok(())
    }

    #[test]
    fn test_association_first_longer() -> Result<(), SyncError> {
        let traj_1 = fake_trajectory(100, 0.01, 0.0);
        let traj_2 = fake_trajectory(10, 0.1, 0.0);
        let (a, b) =
            associate_trajectories(&traj_1, &traj_2, &AssociationConfig::default(), "a", "b")?;
        assert_eq!(a.num_poses(), 10);
        assert_eq!(b.num_poses(), 10);
        assert_eq!(b.timestamps(), traj_2.timestamps());
        Ok(())
    }

    #[test]
    fn test_association_disjoint() {
        let traj_1 = fake_trajectory(10, 0.1, 0.0);
        let traj_2 = fake_trajectory(10, 0.1, 2.0);
        let result =
            associate_trajectories(&traj_1, &traj_2, &AssociationConfig::default(), "a", "b");
        assert!(matches!(result, Err(SyncError::NoMatches { .. })));
    }

    #[test]
    fn test_association_with_offset() -> Result<(), SyncError> {
        let traj_1 = fake_trajectory(10, 0.1, 0.0);
        let traj_2 = fake_trajectory(10, 0.1, 0.5);
        let config = AssociationConfig {
            offset_2: -0.5,
            ..Default::default()
        };
        let (a, b) = associate_trajectories(&traj_1, &traj_2, &config, "a", "b")?;
        assert_eq!(a.num_poses(), 10);
        assert_eq!(b.num_poses(), 10);

        // the offset applies to whichever trajectory is passed second
        let config = AssociationConfig {
            offset_2: 0.5,
            ..Default::default()
        };
        let (b, a) = associate_trajectories(&traj_2, &traj_1, &config, "b", "a")?;
        assert_eq!(a.timestamps(), traj_1.timestamps());
        assert_eq!(b.timestamps(), traj_2.timestamps());
        Ok(())
    }

    fn assert_paired_stamps(a: &PoseTrajectory3D, b: &PoseTrajectory3D, config: &AssociationConfig) {
        assert_eq!(a.num_poses(), b.num_poses());
        for (t_a, t_b) in a.timestamps().iter().zip(b.timestamps()) {
            assert!((t_b + config.offset_2 - t_a).abs() <= config.max_diff);
        }
    }

    #[test]
    fn test_association_invert_with_offset() -> Result<(), SyncError> {
        // stamps 0.0..0.9 and 0.5..1.49, aligned by an offset of -0.5 s
        let traj_1 = fake_trajectory(10, 0.1, 0.0);
        let traj_2 = fake_trajectory(100, 0.01, 0.5);
        let config = AssociationConfig {
            max_diff: 0.015,
            offset_2: -0.5,
            invert: false,
        };

        let (a, b) = associate_trajectories(&traj_1, &traj_2, &config, "a", "b")?;
        assert_paired_stamps(&a, &b, &config);
        assert_eq!(a.num_poses(), 10);
        assert_eq!(a.timestamps(), traj_1.timestamps());

        let config = AssociationConfig {
            invert: true,
            ..config
        };
        let (a, b) = associate_trajectories(&traj_1, &traj_2, &config, "a", "b")?;
        assert_paired_stamps(&a, &b, &config);
        // every stamp of traj_2 within 0.015 s of a shifted traj_1 stamp is kept:
        // two for the first stamp, three for each of the nine others
        assert_eq!(a.num_poses(), 29);
        // the first matches win, so stamps of traj_1 repeat
        assert_eq!(a.timestamps()[0], a.timestamps()[1]);
        assert!(!a.check().0);
        Ok(())
    }

    #[test]
    fn test_association_unsorted() {
        let traj_1 = PoseTrajectory3D::from_poses(vec![DMat4::IDENTITY; 2], vec![1.0, 0.0]).unwrap();
        let traj_2 = fake_trajectory(2, 0.1, 0.0);
        let result =
            associate_trajectories(&traj_1, &traj_2, &AssociationConfig::default(), "a", "b");
        assert_eq!(result.unwrap_err(), SyncError::UnsortedTimestamps("a".to_string()));
    }
}
