use approx::assert_relative_eq;
use glam::{DMat4, DVec3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use trajeval_lie::{se3, so3};
use trajeval_trajectory::io::{kitti, tum};
use trajeval_trajectory::sync::{associate_trajectories, AssociationConfig};
use trajeval_trajectory::{PosePath3D, PoseTrajectory3D};

fn random_walk(rng: &mut StdRng, num_poses: usize) -> Vec<DMat4> {
    let mut poses = vec![DMat4::IDENTITY];
    for _ in 1..num_poses {
        let step = se3::se3(
            so3::exp(DVec3::new(
                rng.random_range(-0.1..0.1),
                rng.random_range(-0.1..0.1),
                rng.random_range(-0.3..0.3),
            )),
            DVec3::new(rng.random_range(0.5..1.0), rng.random_range(-0.2..0.2), 0.0),
        );
        let last = poses[poses.len() - 1];
        poses.push(last * step);
    }
    poses
}

#[test]
fn test_align_recovers_se3_perturbation() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let reference = PosePath3D::from_poses(random_walk(&mut rng, 100))?;

    let perturbation = se3::random_with(&mut rng);
    let mut estimate = reference.clone();
    estimate.transform(&perturbation, false, false)?;
    assert!(estimate != reference);

    let (r, t, s) = estimate.align(&reference, false, false, None)?;
    assert_eq!(s, 1.0);
    assert_relative_eq!(se3::se3(r, t), se3::inverse(&perturbation), epsilon = 1e-6);
    assert_eq!(estimate, reference);
    Ok(())
}

#[test]
fn test_align_recovers_sim3_perturbation() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(7);
    let reference = PosePath3D::from_poses(random_walk(&mut rng, 100))?;

    let mut estimate = reference.clone();
    estimate.transform(&se3::random_with(&mut rng), false, false)?;
    estimate.scale(0.4)?;

    let (_, _, s) = estimate.align(&reference, true, false, None)?;
    assert_relative_eq!(s, 2.5, epsilon = 1e-9);
    assert!(estimate.approx_eq(&reference, 1e-6));
    Ok(())
}

#[test]
fn test_transform_preserves_path_length() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(3);
    let mut path = PosePath3D::from_poses(random_walk(&mut rng, 50))?;
    let length = path.path_length();

    path.transform(&se3::random_with(&mut rng), false, false)?;
    assert_relative_eq!(path.path_length(), length, epsilon = 1e-9);

    path.scale(3.0)?;
    assert_relative_eq!(path.path_length(), 3.0 * length, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_tum_round_trip_after_association() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(5);
    let poses = random_walk(&mut rng, 200);
    let stamps: Vec<f64> = (0..200).map(|i| 100.0 + i as f64 * 0.01).collect();
    let reference = PoseTrajectory3D::from_poses(poses.clone(), stamps)?;

    // every tenth pose, as a slower estimator would deliver them
    let ids: Vec<usize> = (0..200).step_by(10).collect();
    let mut estimate = reference.clone();
    estimate.reduce_to_ids(&ids)?;

    let dir = tempfile::tempdir()?;
    let ref_file = dir.path().join("ref.tum");
    let est_file = dir.path().join("est.tum");
    tum::write_tum_trajectory_file(&ref_file, &reference)?;
    tum::write_tum_trajectory_file(&est_file, &estimate)?;

    let reference = tum::read_tum_trajectory_file(&ref_file)?;
    let estimate = tum::read_tum_trajectory_file(&est_file)?;
    let (reference, estimate) = associate_trajectories(
        &reference,
        &estimate,
        &AssociationConfig::default(),
        "reference",
        "estimate",
    )?;

    assert_eq!(reference.num_poses(), 20);
    assert_eq!(reference, estimate);
    Ok(())
}

#[test]
fn test_kitti_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(9);
    let path = PosePath3D::from_poses(random_walk(&mut rng, 30))?;

    let dir = tempfile::tempdir()?;
    let file_path = dir.path().join("poses.txt");
    kitti::write_kitti_poses_file(&file_path, &path)?;
    let path_read = kitti::read_kitti_poses_file(&file_path)?;

    assert_eq!(path_read, path);
    assert_relative_eq!(path_read.path_length(), path.path_length());
    Ok(())
}
