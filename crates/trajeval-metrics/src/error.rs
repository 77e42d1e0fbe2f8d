use trajeval_lie::LieError;
use trajeval_trajectory::filters::FilterError;
use trajeval_trajectory::Unit;

/// An error type for the metrics module.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MetricsError {
    /// Reference and estimate must have the same number of poses.
    #[error("trajectories must have same number of poses, got {reference} and {estimate}")]
    LengthMismatch {
        /// Poses in the reference.
        reference: usize,
        /// Poses in the estimate.
        estimate: usize,
    },

    /// The delta must be a non-negative number.
    #[error("delta must be a positive number, got {0}")]
    NegativeDelta(f64),

    /// A delta counted in frames must be integral.
    #[error("delta must be integer for delta unit {unit}, got {delta}")]
    NonIntegerDelta {
        /// The rejected delta.
        delta: f64,
        /// Unit of the delta.
        unit: Unit,
    },

    /// Unknown statistics type name.
    #[error("unsupported statistics type: {0}")]
    UnsupportedStatistic(String),

    /// Unknown pose relation name.
    #[error("unsupported pose relation: {0}")]
    UnsupportedPoseRelation(String),

    /// An index pair refers to a pose that does not exist.
    #[error("pair ({0}, {1}) is out of bounds for {2} poses")]
    PairOutOfBounds(usize, usize, usize),

    /// A statistic was requested before any error was computed.
    #[error("no errors computed yet, call process_data first")]
    NoData,

    /// Failed to select the index pairs.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// An error pose is not a valid group element.
    #[error(transparent)]
    Lie(#[from] LieError),
}
