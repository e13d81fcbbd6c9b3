//! Stitcher Core - shared vocabulary for following people across cameras
//!
//! This crate provides the foundational pieces used by the rest of the stitcher:
//! - Fixed-width scalar and math type aliases (re-exported from glam)
//! - Angle and geodetic helpers
//! - Camera descriptions and hardware specs
//! - Human detections, enter/exit events, and the isolators that filter them
//! - Linking exits to the entrances that continue them

pub mod camera;
pub mod error;
pub mod event;
pub mod isolate;
pub mod math;
pub mod related;
pub mod types;

pub use camera::{Camera, CameraId, CameraModel, CameraSpecs};
pub use error::CoreError;
pub use event::{
    CameraTracks, EdgeEvent, EnterEvent, ExitEvent, Heading, HumanEvent, ObjectId, Timestamp,
    Tracks,
};
pub use isolate::{EdgeKind, IsolationConfig};
pub use related::{link_exit_events, related_enter_events};
pub use types::{DMat2, DVec2, Mat4, Quat, Vec2, Vec3, Vec4};
