#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use trajeval_lie as lie;

#[doc(inline)]
pub use trajeval_geometry as geometry;

#[doc(inline)]
pub use trajeval_trajectory as trajectory;

#[doc(inline)]
pub use trajeval_metrics as metrics;
