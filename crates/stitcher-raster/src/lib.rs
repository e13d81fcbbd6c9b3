//! Stitcher Raster - which cameras a person could have walked into next
//!
//! Cameras are plotted as field-of-view triangles around the camera a person
//! left, rasterized onto a pixel grid, and intersected with a capture net
//! projected along the person's exit heading.

pub mod error;
pub mod plot;
pub mod primitives;
pub mod rasterizer;

pub use error::RasterError;
pub use plot::{camera_plot, canvas_size, plot_cameras, CameraPlot};
pub use primitives::{left_of_line, CaptureNet, Triangle};
pub use rasterizer::{
    rasterize_cameras, rasterize_velocity, valid_cameras, CaptureNetScreen, Grid, Pixel,
    RasterConfig, Screen, VelocityRaster,
};
