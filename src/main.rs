//! Stitcher - follows a person from the camera they left to the cameras they
//! most likely walked into next
//!
//! This is the command line entry point. It loads settings, reads a scene
//! file, and prints results as JSON.

mod scene;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::FromArgs;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stitcher_core::{CameraId, EdgeEvent, EnterEvent, ObjectId, Timestamp};
use stitcher_raster::{canvas_size, plot_cameras, CameraPlot};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::scene::{find_candidates, Scene};
use crate::settings::StitcherSettings;

/// Follow people across security cameras
#[derive(Debug, FromArgs)]
struct Args {
    /// path to a settings.toml, defaults to the user config directory
    #[argh(option, short = 's')]
    settings: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Plot(PlotArgs),
    ValidCameras(ValidCamerasArgs),
    InitSettings(InitSettingsArgs),
}

/// Print every camera's plot relative to an origin camera
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "plot")]
struct PlotArgs {
    /// scene JSON file
    #[argh(positional)]
    scene: PathBuf,

    /// id of the camera to place at the centre
    #[argh(option, short = 'o')]
    origin: Uuid,
}

/// Detect exit events and print the cameras each person may have walked into
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "valid-cameras")]
struct ValidCamerasArgs {
    /// scene JSON file
    #[argh(positional)]
    scene: PathBuf,
}

/// Write the current settings (defaults plus overrides) to the settings file
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "init-settings")]
struct InitSettingsArgs {}

#[derive(Serialize)]
struct PlotOutput {
    canvas_size: f64,
    cameras: Vec<CameraPlot>,
}

#[derive(Serialize)]
struct CandidateOutput {
    exit_event: ObjectId,
    camera: Option<CameraId>,
    left_at: Option<DateTime<Utc>>,
    cameras: Vec<CameraId>,
    related_events: Vec<RelatedOutput>,
    /// Index of the candidate the person went on to
    followed_by: Option<usize>,
}

#[derive(Serialize)]
struct RelatedOutput {
    object_id: ObjectId,
    camera: Option<CameraId>,
    entered_at: Option<DateTime<Utc>>,
}

impl From<&EnterEvent> for RelatedOutput {
    fn from(event: &EnterEvent) -> Self {
        Self {
            object_id: event.id,
            camera: event.camera(),
            entered_at: event.start_time().and_then(to_datetime),
        }
    }
}

fn to_datetime(timestamp: Timestamp) -> Option<DateTime<Utc>> {
    i64::try_from(timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let settings = StitcherSettings::load(args.settings.as_deref());

    match args.command {
        Command::Plot(plot) => run_plot(plot),
        Command::ValidCameras(valid) => run_valid_cameras(valid, &settings),
        Command::InitSettings(_) => settings.save(args.settings.as_deref()),
    }
}

fn run_plot(args: PlotArgs) -> Result<()> {
    let scene = Scene::load(&args.scene)?;
    let origin = scene
        .camera(CameraId::from_uuid(args.origin))
        .with_context(|| format!("Camera {} is not in the scene", args.origin))?;

    let cameras = plot_cameras(&scene.cameras, origin).context("Failed to plot cameras")?;
    let output = PlotOutput {
        canvas_size: canvas_size(&cameras),
        cameras,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_valid_cameras(args: ValidCamerasArgs, settings: &StitcherSettings) -> Result<()> {
    let scene = Scene::load(&args.scene)?;
    let candidates = find_candidates(&scene, settings)?;

    let output: Vec<CandidateOutput> = candidates
        .iter()
        .map(|c| CandidateOutput {
            exit_event: c.exit.id,
            camera: c.exit.camera(),
            // Exit time is when the person was last seen
            left_at: c.exit.end_time().and_then(to_datetime),
            cameras: c.cameras.iter().map(|cam| cam.id).collect(),
            related_events: c.exit.related_events.iter().map(RelatedOutput::from).collect(),
            followed_by: c.next,
        })
        .collect();

    info!("Found candidates for {} exit events", output.len());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
