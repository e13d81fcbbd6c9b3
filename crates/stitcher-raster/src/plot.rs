//! Camera field-of-view plots relative to an origin camera
//!
//! A plot is the camera's view drawn as a triangle in meters, with the origin
//! camera at (0, 0) and rotated so it faces up (+y).
//!
//! ```text
//!   v0 ########### v2
//!       ########
//!        ######
//!         ####
//!          ## v1 (camera position)
//! ```

use std::f64::consts::FRAC_PI_2;

use serde::Serialize;
use stitcher_core::math::{geodetic_to_enu, normalize_angle, rotation};
use stitcher_core::{Camera, CameraId, DVec2};
use tracing::{debug, warn};

use crate::error::RasterError;

/// A camera's view triangle in origin-relative meters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraPlot {
    pub id: CameraId,
    /// Counter-clockwise: far left, camera position, far right
    pub vertices: [DVec2; 3],
    /// Camera position in meters from the origin camera
    pub position: DVec2,
    /// Camera heading after aligning the origin camera to face up
    pub rotation: f64,
}

fn placed_rotation(camera: &Camera) -> Result<f64, RasterError> {
    camera
        .rotation_radians
        .filter(|r| r.is_finite())
        .ok_or(RasterError::CameraNotPlaced(camera.id))
}

/// Plot `camera` relative to `origin`
pub fn camera_plot(camera: &Camera, origin: &Camera) -> Result<CameraPlot, RasterError> {
    let rot = placed_rotation(camera)?;
    let origin_rot = placed_rotation(origin)?;
    let half_fov = camera.fov / 2.0;

    // Length of the triangle's sides so its far edge sits at view_distance
    let side = camera.view_distance / half_fov.cos();
    let offset = geodetic_to_enu(camera.location, origin.location);

    let local = [
        offset + side * DVec2::from_angle(rot + half_fov),
        offset,
        offset + side * DVec2::from_angle(rot - half_fov),
    ];

    let offset_rotation = normalize_angle(FRAC_PI_2 - origin_rot);
    let m = rotation(offset_rotation);
    let vertices = local.map(|v| m * v);

    debug!("Plotted camera {} at {:?}", camera.id, vertices[1]);

    Ok(CameraPlot {
        id: camera.id,
        vertices,
        position: vertices[1],
        rotation: offset_rotation + rot,
    })
}

/// Plot every placed camera, skipping those that are not on the map
pub fn plot_cameras<'a>(
    cameras: impl IntoIterator<Item = &'a Camera>,
    origin: &Camera,
) -> Result<Vec<CameraPlot>, RasterError> {
    placed_rotation(origin)?;

    let mut plots = Vec::new();
    for camera in cameras {
        if !camera.is_placed() {
            warn!("Skipping camera {} which is not on the map", camera.id);
            continue;
        }
        plots.push(camera_plot(camera, origin)?);
    }
    Ok(plots)
}

/// Side in meters of the smallest square centred on `origin` that holds the
/// view of every placed camera
pub fn canvas_size(plots: &[CameraPlot]) -> f64 {
    let (extreme_x, extreme_y) = plots
        .iter()
        .flat_map(|plot| plot.vertices)
        .fold((0.0f64, 0.0f64), |(ex, ey), v| {
            (ex.max(v.x.abs()), ey.max(v.y.abs()))
        });

    (extreme_x * 2.0).max(extreme_y * 2.0)
}
