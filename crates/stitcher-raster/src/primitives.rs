//! Convex primitives used by the rasterizer
//!
//! Vertices are wound counter-clockwise, so a point is inside when it lies
//! to the left of every edge.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use serde::Serialize;
use stitcher_core::math::rotation;
use stitcher_core::{DVec2, Heading};

use crate::error::RasterError;
use crate::plot::CameraPlot;

/// Whether `c` is strictly left of the directed line `a -> b`.
///
/// ```text
///        b              a
///        |              |
///  left  |              |  left
///        |              |
///        a              b
/// ```
pub fn left_of_line(a: DVec2, b: DVec2, c: DVec2) -> bool {
    (b - a).perp_dot(c - a) > 0.0
}

/// A camera view triangle in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Triangle {
    pub p0: DVec2,
    pub p1: DVec2,
    pub p2: DVec2,
}

impl Triangle {
    /// Move a camera plot into screen space, where (0, 0) is the top-left corner
    pub fn from_plot(plot: &CameraPlot, offset: f64) -> Self {
        let shift = DVec2::splat(offset);
        let [p0, p1, p2] = plot.vertices;
        Self {
            p0: p0 + shift,
            p1: p1 + shift,
            p2: p2 + shift,
        }
    }

    pub fn contains(&self, point: DVec2) -> bool {
        left_of_line(self.p0, self.p1, point)
            && left_of_line(self.p1, self.p2, point)
            && left_of_line(self.p2, self.p0, point)
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (DVec2, DVec2) {
        (
            self.p0.min(self.p1).min(self.p2),
            self.p0.max(self.p1).max(self.p2),
        )
    }
}

/// Trapezoid projected from the origin camera along a person's heading.
///
/// Cameras whose views overlap the net are the ones the person most likely
/// walked into next. It starts 1 m wide at the origin and widens to
/// `capture_radius` at the far end of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaptureNet {
    pub p0: DVec2,
    pub p1: DVec2,
    pub p2: DVec2,
    pub p3: DVec2,
}

impl CaptureNet {
    /// An unrotated net pointing along +x from the origin, `meter_span` long
    pub fn new(capture_radius: f64, meter_span: f64) -> Self {
        let half_far = 0.5 + (capture_radius - 1.0) / 2.0;
        Self {
            p0: DVec2::new(meter_span, -half_far),
            p1: DVec2::new(meter_span, half_far),
            p2: DVec2::new(0.0, 0.5),
            p3: DVec2::new(0.0, -0.5),
        }
    }

    /// Translate every vertex by `offset` on both axes
    pub fn offset(&self, offset: f64) -> Self {
        let shift = DVec2::splat(offset);
        Self {
            p0: self.p0 + shift,
            p1: self.p1 + shift,
            p2: self.p2 + shift,
            p3: self.p3 + shift,
        }
    }

    /// Turn the net towards a heading observed in the origin camera's frame.
    ///
    /// The origin camera faces +y, so the right of its frame is +x and the
    /// bottom of its frame (towards the camera) is -y.
    pub fn rotate_towards(&self, heading: Heading) -> Result<Self, RasterError> {
        let theta = match (heading.x, heading.y) {
            (0, 0) => return Err(RasterError::NoVelocity),
            (1, 0) => return Ok(*self),
            (1, 1) => -FRAC_PI_4,
            (1, -1) => FRAC_PI_4,
            (-1, 0) => PI,
            (-1, 1) => -3.0 * FRAC_PI_4,
            (-1, -1) => -5.0 * FRAC_PI_4,
            (0, 1) => -FRAC_PI_2,
            (0, -1) => FRAC_PI_2,
            _ => return Err(RasterError::UnnormalizedHeading(heading)),
        };

        let m = rotation(theta);
        Ok(Self {
            p0: m * self.p0,
            p1: m * self.p1,
            p2: m * self.p2,
            p3: m * self.p3,
        })
    }

    pub fn contains(&self, point: DVec2) -> bool {
        left_of_line(self.p0, self.p1, point)
            && left_of_line(self.p1, self.p2, point)
            && left_of_line(self.p2, self.p3, point)
            && left_of_line(self.p3, self.p0, point)
    }
}
