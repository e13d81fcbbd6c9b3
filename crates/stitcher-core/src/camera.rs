//! Camera descriptions and hardware specs

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::math::{convert_rhombus_angle, degrees_to_radians, feet_to_meters};
use crate::types::DVec2;

/// Unique identifier of a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(pub Uuid);

impl CameraId {
    /// Create a new random camera ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a camera ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for CameraId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// A camera placed (or not yet placed) on the site map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: CameraId,
    /// Heading in radians, 0 = east, counter-clockwise. `None` if the camera
    /// is not on the map.
    #[serde(default)]
    pub rotation_radians: Option<f64>,
    /// Latitude (x) and longitude (y) in degrees
    pub location: DVec2,
    /// Horizontal field of view in radians
    pub fov: f64,
    /// Average distance in meters at which people are still detected
    pub view_distance: f64,
}

impl Camera {
    /// Build a camera from vendor data, converting the vendor heading into our convention
    pub fn from_model(
        id: CameraId,
        model: CameraModel,
        vendor_rotation: Option<f64>,
        location: DVec2,
    ) -> Self {
        let specs = model.specs();
        Self {
            id,
            rotation_radians: vendor_rotation.map(convert_rhombus_angle),
            location,
            fov: degrees_to_radians(specs.fov_degrees),
            view_distance: specs.view_distance_meters,
        }
    }

    /// Whether the camera has a heading and can be plotted
    pub fn is_placed(&self) -> bool {
        self.rotation_radians.is_some_and(f64::is_finite)
    }
}

/// Supported camera hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraModel {
    R1,
    R2,
    R100,
    R200,
    #[serde(other)]
    Unknown,
}

/// Optical characteristics of a camera model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSpecs {
    pub fov_degrees: f64,
    pub view_distance_meters: f64,
}

impl CameraModel {
    pub fn specs(&self) -> CameraSpecs {
        let (fov_degrees, view_feet) = match self {
            CameraModel::R100 => (96.0, 57.0),
            CameraModel::R1 => (135.0, 44.0),
            CameraModel::R2 => (96.0, 57.0),
            CameraModel::R200 => (112.0, 57.0),
            CameraModel::Unknown => {
                warn!("Unsupported camera model, using default FOV and view distance");
                (112.0, 57.0)
            }
        };
        CameraSpecs {
            fov_degrees,
            view_distance_meters: feet_to_meters(view_feet),
        }
    }
}
