use argh::FromArgs;
use std::path::{Path, PathBuf};

use trajeval::metrics::{Ape, MetricResult, PoseErrorMetric, PoseRelation, Rpe, RpeConfig};
use trajeval::trajectory::io::{kitti, tum};
use trajeval::trajectory::sync::{associate_trajectories, AssociationConfig};
use trajeval::trajectory::{PosePath3D, Unit};

#[derive(FromArgs)]
/// Evaluate an estimated trajectory against a reference trajectory
struct Args {
    /// path to the reference trajectory
    #[argh(option, long = "ref")]
    ref_path: PathBuf,

    /// path to the estimated trajectory
    #[argh(option, long = "est")]
    est_path: PathBuf,

    /// file format, tum or kitti
    #[argh(option, default = "FileFormat::Tum")]
    format: FileFormat,

    /// pose relation: trans_part, rot_part, full, angle_rad or angle_deg
    #[argh(option, default = "PoseRelation::TranslationPart")]
    pose_relation: PoseRelation,

    /// align the estimate to the reference with SE(3) Umeyama alignment
    #[argh(switch, short = 'a')]
    align: bool,

    /// correct the scale of the estimate, Sim(3) alignment together with --align
    #[argh(switch, short = 's')]
    correct_scale: bool,

    /// move the estimate so that its first pose matches the reference's first pose,
    /// ignored when aligning or correcting the scale
    #[argh(switch)]
    align_origin: bool,

    /// maximum timestamp difference for associating tum files, in seconds
    #[argh(option, default = "0.01")]
    max_diff: f64,

    /// timestamp offset added to the estimate, in seconds
    #[argh(option, default = "0.0")]
    offset: f64,

    /// write the result as json to this path
    #[argh(option)]
    save_json: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Ape(ApeArgs),
    Rpe(RpeArgs),
}

#[derive(FromArgs)]
/// absolute pose error
#[argh(subcommand, name = "ape")]
struct ApeArgs {}

#[derive(FromArgs)]
/// relative pose error
#[argh(subcommand, name = "rpe")]
struct RpeArgs {
    /// delta between the poses of a pair
    #[argh(option, default = "1.0")]
    delta: f64,

    /// unit of the delta: f (frames), m (meters), d (degrees) or r (radians)
    #[argh(option, default = "Unit::Frames", from_str_fn(parse_delta_unit))]
    delta_unit: Unit,

    /// relative tolerance of the delta in all pairs mode
    #[argh(option, default = "0.1")]
    rel_delta_tol: f64,

    /// use all pairs within the tolerance instead of consecutive pairs
    #[argh(switch)]
    all_pairs: bool,
}

impl Args {
    fn association(&self) -> AssociationConfig {
        AssociationConfig {
            max_diff: self.max_diff,
            offset_2: self.offset,
            invert: false,
        }
    }

    fn alignment(&self) -> Alignment {
        Alignment {
            align: self.align,
            correct_scale: self.correct_scale,
            align_origin: self.align_origin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FileFormat {
    Tum,
    Kitti,
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tum" => Ok(FileFormat::Tum),
            "kitti" => Ok(FileFormat::Kitti),
            _ => Err(format!("unknown file format: {s}")),
        }
    }
}

fn parse_delta_unit(s: &str) -> Result<Unit, String> {
    match s {
        "f" => Ok(Unit::Frames),
        "m" => Ok(Unit::Meters),
        "d" => Ok(Unit::Degrees),
        "r" => Ok(Unit::Radians),
        _ => Err(format!("unknown delta unit: {s}")),
    }
}

/// How the estimate is moved onto the reference before evaluation.
#[derive(Debug, Clone, Copy, Default)]
struct Alignment {
    align: bool,
    correct_scale: bool,
    align_origin: bool,
}

/// Reference and estimate with corresponding poses.
struct Data {
    reference: PosePath3D,
    estimate: PosePath3D,
    // of the reference, tum only
    timestamps: Option<Vec<f64>>,
}

impl Data {
    fn reduce_to_ids(&mut self, ids: &[usize]) -> Result<(), Box<dyn std::error::Error>> {
        self.reference.reduce_to_ids(ids)?;
        self.estimate.reduce_to_ids(ids)?;
        if let Some(timestamps) = self.timestamps.as_mut() {
            *timestamps = ids.iter().map(|&i| timestamps[i]).collect();
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut data = load(&args)?;
    preprocess(args.alignment(), &mut data)?;

    let result = match &args.command {
        Command::Ape(_) => {
            let mut ape = Ape::new(args.pose_relation);
            ape.process_data(&data.reference, &data.estimate)?;
            finish(&args, &data, &ape)
        }
        Command::Rpe(rpe_args) => {
            let mut rpe = Rpe::new(RpeConfig {
                pose_relation: args.pose_relation,
                delta: rpe_args.delta,
                delta_unit: rpe_args.delta_unit,
                rel_delta_tol: rpe_args.rel_delta_tol,
                all_pairs: rpe_args.all_pairs,
            })?;
            rpe.process_data(&data.reference, &data.estimate)?;
            if !rpe_args.all_pairs {
                // keep only the poses that end a compared pair
                let ids = rpe.delta_ids().to_vec();
                data.reduce_to_ids(&ids)?;
            }
            finish(&args, &data, &rpe)
        }
    };
    report(&args, result)
}

fn load(args: &Args) -> Result<Data, Box<dyn std::error::Error>> {
    let data = match args.format {
        FileFormat::Tum => {
            let traj_ref = tum::read_tum_trajectory_file(&args.ref_path)?;
            let traj_est = tum::read_tum_trajectory_file(&args.est_path)?;
            let (traj_ref, traj_est) = associate_trajectories(
                &traj_ref,
                &traj_est,
                &args.association(),
                &file_name(&args.ref_path),
                &file_name(&args.est_path),
            )?;
            Data {
                timestamps: Some(traj_ref.timestamps().to_vec()),
                reference: traj_ref.into_path(),
                estimate: traj_est.into_path(),
            }
        }
        FileFormat::Kitti => Data {
            reference: kitti::read_kitti_poses_file(&args.ref_path)?,
            estimate: kitti::read_kitti_poses_file(&args.est_path)?,
            timestamps: None,
        },
    };
    println!("reference: {}", data.reference);
    println!("estimate: {}", data.estimate);
    Ok(data)
}

fn preprocess(alignment: Alignment, data: &mut Data) -> Result<(), Box<dyn std::error::Error>> {
    if alignment.align || alignment.correct_scale {
        let only_scale = alignment.correct_scale && !alignment.align;
        let (r, t, s) = data.estimate.align(
            &data.reference,
            alignment.correct_scale,
            only_scale,
            None,
        )?;
        log::info!("alignment rotation:\n{r}\ntranslation: {t}\nscale: {s}");
    } else if alignment.align_origin {
        let to_ref_origin = data.estimate.align_origin(&data.reference)?;
        log::info!("origin alignment transformation:\n{to_ref_origin}");
    }
    Ok(())
}

fn finish(args: &Args, data: &Data, metric: &impl PoseErrorMetric) -> MetricResult {
    let mut result = metric.result(&file_name(&args.ref_path), &file_name(&args.est_path));
    if let Some(timestamps) = &data.timestamps {
        let t_0 = timestamps.first().copied().unwrap_or_default();
        result.add_array(
            "seconds_from_start",
            timestamps.iter().map(|t| t - t_0).collect(),
        );
    }
    result.add_array("distances_from_start", data.reference.distances());
    result
}

fn report(args: &Args, result: MetricResult) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", result.pretty_string(true, true, false));
    if let Some(path) = &args.save_json {
        result.write_json(path)?;
        println!("result saved to {}", path.display());
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{DQuat, DVec3};

    fn square(scale: f64, offset: DVec3) -> Result<PosePath3D, Box<dyn std::error::Error>> {
        let corners = [DVec3::ZERO, DVec3::X, DVec3::X + DVec3::Y, DVec3::Y];
        Ok(PosePath3D::from_positions_orientations(
            corners.iter().map(|c| *c * scale + offset).collect(),
            vec![DQuat::IDENTITY; corners.len()],
        )?)
    }

    fn data() -> Result<Data, Box<dyn std::error::Error>> {
        Ok(Data {
            reference: square(1.0, DVec3::ZERO)?,
            estimate: square(2.0, DVec3::new(10.0, 0.0, 0.0))?,
            timestamps: None,
        })
    }

    #[test]
    fn test_origin_alignment() -> Result<(), Box<dyn std::error::Error>> {
        let mut data = data()?;
        let alignment = Alignment {
            align_origin: true,
            ..Default::default()
        };
        preprocess(alignment, &mut data)?;
        assert_relative_eq!(data.estimate.positions()[0], DVec3::ZERO, epsilon = 1e-12);
        assert_relative_eq!(data.estimate.positions()[2], DVec3::new(2.0, 2.0, 0.0), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_scale_correction_skips_origin_alignment() -> Result<(), Box<dyn std::error::Error>> {
        let mut data = data()?;
        let alignment = Alignment {
            correct_scale: true,
            align_origin: true,
            ..Default::default()
        };
        preprocess(alignment, &mut data)?;
        // only scaled by 0.5 about the origin, not moved onto the reference
        assert_relative_eq!(data.estimate.positions()[0], DVec3::new(5.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(data.estimate.positions()[2], DVec3::new(6.0, 1.0, 0.0), epsilon = 1e-9);
        Ok(())
    }
}
