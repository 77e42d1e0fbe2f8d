use trajeval_geometry::GeometryError;
use trajeval_lie::LieError;

/// An error type for pose path and trajectory operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrajectoryError {
    /// Neither positions with orientations nor SE(3) poses were provided.
    #[error("must provide at least positions and orientations or SE(3) poses")]
    MissingData,

    /// Two inputs that must have the same length do not.
    #[error("length mismatch: {what} has {got} entries, expected {expected}")]
    LengthMismatch {
        /// Name of the offending input.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// The operation would leave no poses.
    #[error("a pose path must contain at least one pose")]
    Empty,

    /// The operation needs more poses than available.
    #[error("need at least {required} poses, got {got}")]
    TooFewPoses {
        /// Minimum number of poses.
        required: usize,
        /// Actual number of poses.
        got: usize,
    },

    /// An index is out of range.
    #[error("index {index} is out of bounds for {len} poses")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of poses.
        len: usize,
    },

    /// The transformation passed to `transform` is not in SE(3).
    #[error("transformation is not a valid SE(3) matrix")]
    InvalidTransform,

    /// Scale factors must be positive and finite.
    #[error("scale factor must be positive, got {0}")]
    InvalidScale(f64),

    /// A path can only be projected once.
    #[error("path was already projected")]
    AlreadyProjected,

    /// Downsampling needs at least one target pose.
    #[error("cannot downsample to {0} poses")]
    InvalidDownsample(usize),

    /// Filter thresholds must be non-negative.
    #[error("invalid threshold: {0}")]
    InvalidThreshold(f64),

    /// Consecutive timestamps that are not strictly increasing.
    #[error("bad timestamps: {0} & {1}")]
    BadTimestamps(f64, f64),

    /// The operation requires ascending timestamps.
    #[error("timestamps must be sorted in ascending order")]
    UnsortedTimestamps,

    /// Start of a time range after its end.
    #[error("start timestamp {start} is greater than end timestamp {end}")]
    InvalidTimeRange {
        /// Range start.
        start: f64,
        /// Range end.
        end: f64,
    },

    /// Alignment failure.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Invalid group element.
    #[error(transparent)]
    Lie(#[from] LieError),
}
