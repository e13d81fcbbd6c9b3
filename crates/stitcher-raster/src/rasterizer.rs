//! Rasterizes camera views and capture nets onto a square pixel grid
//!
//! Screen space has (0, 0) at the top-left corner of the canvas, with the
//! origin camera at its centre. A pixel is sampled at its top-left corner.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use stitcher_core::{Camera, CoreError, DVec2, EdgeEvent, ExitEvent};
use tracing::{debug, info, warn};

use crate::error::RasterError;
use crate::plot::{canvas_size, plot_cameras, CameraPlot};
use crate::primitives::{CaptureNet, Triangle};

/// Rasterization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Pixel density. Accuracy barely matters here so keep this low.
    pub pixels_per_meter: f64,
    /// Width in meters of the capture net's far end
    pub capture_radius_meters: f64,
    /// Cameras farther than this from the origin camera are left off the canvas
    pub max_camera_distance_meters: f64,
    /// Upper bound on the pixel count of one screen
    pub max_screen_pixels: u64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: 10.0,
            capture_radius_meters: 300.0,
            max_camera_distance_meters: 200.0,
            max_screen_pixels: 25_000_000,
        }
    }
}

/// Square, row-major pixel buffer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid<T> {
    size: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a `size` x `size` grid filled with `value`
    pub fn new(size: usize, value: T) -> Self {
        Self {
            size,
            cells: vec![value; size * size],
        }
    }
}

impl<T> Grid<T> {
    /// Width and height in pixels
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        if row >= self.size || column >= self.size {
            return None;
        }
        self.cells.get(row * self.size + column)
    }

    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut T> {
        if row >= self.size || column >= self.size {
            return None;
        }
        self.cells.get_mut(row * self.size + column)
    }

    /// Iterate over rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks panics on 0
        self.cells.chunks(self.size.max(1))
    }

    /// Iterate over `(row, column, cell)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / size, i % size, cell))
    }
}

/// Cameras that can see a pixel. Overlapping views all stay listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pixel {
    pub cameras: Vec<stitcher_core::CameraId>,
}

/// Rasterized camera views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screen {
    pub pixels: Grid<Pixel>,
    /// Canvas side in meters
    pub meter_span: f64,
    /// Canvas side in pixels
    pub screen_size: usize,
    /// Side of one pixel in meters
    pub pixel_size: f64,
    /// Meters added to plot coordinates to reach screen space
    pub offset: f64,
}

impl Screen {
    /// Meter position of a pixel's sample point
    pub fn sample_point(&self, row: usize, column: usize) -> DVec2 {
        DVec2::new(column as f64, row as f64) * self.pixel_size
    }
}

/// Rasterized capture net
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureNetScreen {
    pub pixels: Grid<bool>,
    pub meter_span: f64,
    pub screen_size: usize,
    pub pixel_size: f64,
}

/// Capture net raster plus the cameras it caught
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityRaster {
    pub net: CaptureNetScreen,
    pub cameras: BTreeSet<stitcher_core::CameraId>,
}

/// Rasterize camera plots onto a `meter_span` square centred on the origin camera
pub fn rasterize_cameras(
    plots: &[CameraPlot],
    meter_span: f64,
    config: &RasterConfig,
) -> Result<Screen, RasterError> {
    let pixels_per_meter = config.pixels_per_meter;
    if !(pixels_per_meter.is_finite() && pixels_per_meter > 0.0) {
        return Err(RasterError::InvalidDensity(pixels_per_meter));
    }

    let side = (pixels_per_meter * meter_span).ceil().max(0.0);
    if !side.is_finite() || side * side > config.max_screen_pixels as f64 {
        return Err(RasterError::CanvasTooLarge {
            side: side as u64,
            limit: config.max_screen_pixels,
        });
    }

    let screen_size = side as usize;
    let pixel_size = 1.0 / pixels_per_meter;
    let offset = meter_span / 2.0;

    let mut screen = Screen {
        pixels: Grid::new(screen_size, Pixel::default()),
        meter_span,
        screen_size,
        pixel_size,
        offset,
    };
    if screen_size == 0 {
        return Ok(screen);
    }

    let last = (screen_size - 1) as f64;
    for plot in plots {
        let triangle = Triangle::from_plot(plot, offset);

        // Only walk the pixels under the triangle's bounding box
        let (min, max) = triangle.bounds();
        let first_col = (min.x / pixel_size).floor().clamp(0.0, last) as usize;
        let last_col = (max.x / pixel_size).ceil().clamp(0.0, last) as usize;
        let first_row = (min.y / pixel_size).floor().clamp(0.0, last) as usize;
        let last_row = (max.y / pixel_size).ceil().clamp(0.0, last) as usize;

        let mut covered = 0usize;
        for row in first_row..=last_row {
            for column in first_col..=last_col {
                if !triangle.contains(screen.sample_point(row, column)) {
                    continue;
                }
                if let Some(pixel) = screen.pixels.get_mut(row, column) {
                    pixel.cameras.push(plot.id);
                    covered += 1;
                }
            }
        }
        debug!("Camera {} covers {} pixels", plot.id, covered);
    }

    Ok(screen)
}

/// Project the exit event's heading as a capture net and collect every camera
/// whose view it crosses
pub fn rasterize_velocity(
    exit: &ExitEvent,
    capture_radius: f64,
    screen: &Screen,
) -> Result<VelocityRaster, RasterError> {
    let net = CaptureNet::new(capture_radius, screen.meter_span)
        .rotate_towards(exit.heading())?
        .offset(screen.offset);

    let mut pixels = Grid::new(screen.screen_size, false);
    let mut cameras = BTreeSet::new();

    for (row, column, pixel) in screen.pixels.iter() {
        if !net.contains(screen.sample_point(row, column)) {
            continue;
        }
        if let Some(cell) = pixels.get_mut(row, column) {
            *cell = true;
        }
        cameras.extend(pixel.cameras.iter().copied());
    }

    Ok(VelocityRaster {
        net: CaptureNetScreen {
            pixels,
            meter_span: screen.meter_span,
            screen_size: screen.screen_size,
            pixel_size: screen.pixel_size,
        },
        cameras,
    })
}

/// Cameras the person in `exit` most likely walked into next.
///
/// The exit event's own camera is the origin and never part of the result.
/// Cameras come back in the order they were given.
pub fn valid_cameras<'a>(
    cameras: &'a [Camera],
    exit: &ExitEvent,
    config: &RasterConfig,
) -> Result<Vec<&'a Camera>, RasterError> {
    let origin_id = exit.camera().ok_or(CoreError::EmptyEvent(exit.id))?;
    let origin = cameras
        .iter()
        .find(|c| c.id == origin_id)
        .ok_or(RasterError::UnknownCamera(origin_id))?;

    let others: Vec<&Camera> = cameras.iter().filter(|c| c.id != origin_id).collect();
    let mut plots = plot_cameras(others.iter().copied(), origin)?;
    plots.retain(|plot| {
        let distance = plot.position.length();
        if distance <= config.max_camera_distance_meters {
            return true;
        }
        warn!(
            "Camera {} is {:.0} m from camera {}, leaving it off the canvas",
            plot.id, distance, origin_id
        );
        false
    });
    let span = canvas_size(&plots);

    let screen = rasterize_cameras(&plots, span, config)?;
    let raster = rasterize_velocity(exit, config.capture_radius_meters, &screen)?;

    let valid: Vec<&Camera> = others
        .into_iter()
        .filter(|c| raster.cameras.contains(&c.id))
        .collect();

    info!(
        "Exit event {} from camera {}: {} of {} cameras are candidates",
        exit.id,
        origin_id,
        valid.len(),
        plots.len()
    );
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::tests::camera_at;
    use std::f64::consts::FRAC_PI_2;
    use stitcher_core::{HumanEvent, Vec2};

    fn exit_from(camera: &Camera, from: (f32, f32), to: (f32, f32)) -> ExitEvent {
        let event = |(x, y): (f32, f32), timestamp| HumanEvent {
            object_id: 1,
            position: Vec2::new(x, y),
            dimensions: Vec2::new(0.1, 0.3),
            timestamp,
            camera: camera.id,
        };
        ExitEvent::from_track(1, vec![event(from, 1_000), event(to, 1_100)]).unwrap()
    }

    fn density(pixels_per_meter: f64) -> RasterConfig {
        RasterConfig {
            pixels_per_meter,
            ..Default::default()
        }
    }

    #[test]
    fn test_grid() {
        let mut grid = Grid::new(3, 0u8);
        *grid.get_mut(1, 2).unwrap() = 7;
        assert_eq!(grid.get(1, 2), Some(&7));
        assert_eq!(grid.get(3, 0), None);
        assert_eq!(grid.rows().nth(1).unwrap(), &[0, 0, 7]);
        assert_eq!(grid.iter().filter(|(_, _, v)| **v == 7).count(), 1);
        assert_eq!(Grid::new(0, 0u8).rows().count(), 0);
    }

    #[test]
    fn test_rasterize_cameras() {
        let origin = camera_at(0.0, 0.0, Some(FRAC_PI_2));
        let plots = plot_cameras([&origin], &origin).unwrap();
        let screen = rasterize_cameras(&plots, 50.0, &density(2.0)).unwrap();

        assert_eq!(screen.screen_size, 100);
        assert_eq!(screen.pixel_size, 0.5);
        assert_eq!(screen.offset, 25.0);

        // Just in front of the camera, and just behind it
        let ahead = screen.pixels.get(70, 50).unwrap();
        assert_eq!(ahead.cameras, vec![origin.id]);
        assert!(screen.pixels.get(30, 50).unwrap().cameras.is_empty());
    }

    #[test]
    fn test_rasterize_overlapping_cameras() {
        let origin = camera_at(0.0, 0.0, Some(FRAC_PI_2));
        let twin = Camera {
            id: stitcher_core::CameraId::new(),
            ..origin.clone()
        };
        let plots = plot_cameras([&origin, &twin], &origin).unwrap();
        let screen = rasterize_cameras(&plots, 50.0, &density(1.0)).unwrap();
        assert_eq!(
            screen.pixels.get(35, 25).unwrap().cameras,
            vec![origin.id, twin.id]
        );
    }

    #[test]
    fn test_invalid_density() {
        assert_eq!(
            rasterize_cameras(&[], 10.0, &density(0.0)),
            Err(RasterError::InvalidDensity(0.0))
        );
        let empty = rasterize_cameras(&[], 0.0, &density(1.0)).unwrap();
        assert_eq!(empty.screen_size, 0);
    }

    #[test]
    fn test_canvas_too_large() {
        let config = RasterConfig {
            max_screen_pixels: 10_000,
            ..density(1.0)
        };
        assert!(rasterize_cameras(&[], 100.0, &config).is_ok());
        assert_eq!(
            rasterize_cameras(&[], 101.0, &config),
            Err(RasterError::CanvasTooLarge { side: 101, limit: 10_000 })
        );
        assert!(matches!(
            rasterize_cameras(&[], f64::INFINITY, &config),
            Err(RasterError::CanvasTooLarge { .. })
        ));
    }

    #[test]
    fn test_rasterize_velocity() {
        let origin = camera_at(0.0, 0.0, Some(FRAC_PI_2));
        let east = camera_at(30.0, 0.0, Some(FRAC_PI_2));
        let west = camera_at(-30.0, 0.0, Some(FRAC_PI_2));
        let plots = plot_cameras([&east, &west], &origin).unwrap();
        let screen = rasterize_cameras(&plots, canvas_size(&plots), &density(1.0)).unwrap();

        let right = exit_from(&origin, (0.8, 0.5), (0.9, 0.5));
        let raster = rasterize_velocity(&right, 300.0, &screen).unwrap();
        assert!(raster.cameras.contains(&east.id));
        assert!(!raster.cameras.contains(&west.id));
        assert!(raster.net.pixels.iter().any(|(_, _, inside)| *inside));

        let still = exit_from(&origin, (0.9, 0.5), (0.9, 0.5));
        assert_eq!(
            rasterize_velocity(&still, 300.0, &screen),
            Err(RasterError::NoVelocity)
        );
    }

    #[test]
    fn test_valid_cameras() {
        let origin = camera_at(0.0, 0.0, Some(FRAC_PI_2));
        let east = camera_at(60.0, 0.0, Some(FRAC_PI_2));
        let west = camera_at(-60.0, 0.0, Some(FRAC_PI_2));
        let ahead = camera_at(0.0, 40.0, Some(FRAC_PI_2));
        let unplaced = camera_at(10.0, 0.0, None);
        let cameras = vec![origin.clone(), east.clone(), west.clone(), ahead.clone(), unplaced];
        let config = density(2.0);

        let right = exit_from(&origin, (0.8, 0.5), (0.9, 0.5));
        let ids: Vec<_> = valid_cameras(&cameras, &right, &config)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![east.id]);

        let left = exit_from(&origin, (0.2, 0.5), (0.1, 0.5));
        let ids: Vec<_> = valid_cameras(&cameras, &left, &config)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![west.id]);

        let top = exit_from(&origin, (0.5, 0.2), (0.5, 0.1));
        let ids: Vec<_> = valid_cameras(&cameras, &top, &config)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![ahead.id]);
    }

    #[test]
    fn test_valid_cameras_unknown_origin() {
        let stranger = camera_at(0.0, 0.0, Some(0.0));
        let cameras = vec![camera_at(5.0, 5.0, Some(0.0))];
        let exit = exit_from(&stranger, (0.8, 0.5), (0.9, 0.5));
        assert_eq!(
            valid_cameras(&cameras, &exit, &RasterConfig::default()),
            Err(RasterError::UnknownCamera(stranger.id))
        );
    }

    #[test]
    fn test_far_camera_is_left_off_canvas() {
        let origin = camera_at(0.0, 0.0, Some(FRAC_PI_2));
        let east = camera_at(60.0, 0.0, Some(FRAC_PI_2));
        // Never geolocated, so it sits at (0, 0) on the other side of the planet
        let stray = Camera {
            location: DVec2::ZERO,
            ..camera_at(0.0, 0.0, Some(FRAC_PI_2))
        };
        let cameras = vec![origin.clone(), stray, east.clone()];

        let right = exit_from(&origin, (0.8, 0.5), (0.9, 0.5));
        let ids: Vec<_> = valid_cameras(&cameras, &right, &RasterConfig::default())
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![east.id]);
    }
}
