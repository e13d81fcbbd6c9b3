use stitcher_core::{CameraId, CoreError, Heading};

/// Errors that can occur while plotting or rasterizing cameras.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RasterError {
    #[error("camera {0} has no rotation and is not on the map")]
    CameraNotPlaced(CameraId),

    #[error("camera {0} is not in the camera list")]
    UnknownCamera(CameraId),

    #[error("exit event has no velocity to project")]
    NoVelocity,

    #[error("heading {0:?} is not normalized to -1, 0 or 1")]
    UnnormalizedHeading(Heading),

    #[error("pixels per meter must be positive, got {0}")]
    InvalidDensity(f64),

    #[error("a {side} x {side} pixel canvas exceeds the limit of {limit} pixels")]
    CanvasTooLarge { side: u64, limit: u64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}
