/// An error type for the Lie group primitives.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LieError {
    /// The matrix is not a valid rotation.
    #[error("matrix is not a valid SO(3) rotation")]
    InvalidRotation,

    /// The matrix is not a valid rigid body transformation.
    #[error("matrix is not a valid SE(3) transformation")]
    InvalidSe3,

    /// The matrix is not a valid similarity transformation.
    #[error("matrix is not a valid Sim(3) transformation")]
    InvalidSim3,
}
