#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::MetricsError;

/// Absolute pose error.
pub mod ape;

/// Shared interface of the pose error metrics.
pub mod metric;

/// Scalar reductions of SE(3) error poses.
pub mod pose_relation;

/// Result container and merging of results.
pub mod result;

/// Relative pose error.
pub mod rpe;

/// Summary statistics over error arrays.
pub mod statistics;

pub use ape::Ape;
pub use metric::PoseErrorMetric;
pub use pose_relation::PoseRelation;
pub use result::{merge_results, MetricResult, ResultError};
pub use rpe::{Rpe, RpeConfig};
pub use statistics::StatisticsType;
