//! Scene files and the exit-event pipeline
//!
//! A scene is a JSON snapshot of a site: its cameras and the raw human
//! detections, nested by camera and then by object ID.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stitcher_core::event::{exit_events_from_tracks, group_tracks};
use stitcher_core::isolate::{
    isolate_by_length, isolate_by_object_id, isolate_by_velocity, isolate_edge_events,
};
use stitcher_core::{
    link_exit_events, related_enter_events, Camera, CameraId, CameraTracks, EdgeEvent, EdgeKind,
    ExitEvent, HumanEvent,
};
use stitcher_raster::valid_cameras;
use tracing::{info, warn};

use crate::settings::StitcherSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SceneFile")]
pub struct Scene {
    pub cameras: Vec<Camera>,
    pub tracks: CameraTracks,
}

/// On-disk layout. Detections are regrouped on load, so a track is always
/// time-ordered and only holds detections of its own camera and object ID.
#[derive(Deserialize)]
struct SceneFile {
    cameras: Vec<Camera>,
    #[serde(default)]
    tracks: CameraTracks,
}

impl From<SceneFile> for Scene {
    fn from(file: SceneFile) -> Self {
        let mut misfiled = 0;
        let mut events = Vec::new();
        for (camera, tracks) in file.tracks {
            for (object_id, track) in tracks {
                misfiled += track
                    .iter()
                    .filter(|e| e.camera != camera || e.object_id != object_id)
                    .count();
                events.extend(track);
            }
        }
        if misfiled > 0 {
            warn!("Regrouped {} detections filed under another camera or object ID", misfiled);
        }
        Scene::new(file.cameras, events)
    }
}

impl Scene {
    pub fn new(cameras: Vec<Camera>, events: impl IntoIterator<Item = HumanEvent>) -> Self {
        Self {
            cameras,
            tracks: group_tracks(events),
        }
    }

    /// Read a scene from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene {}", path.display()))?;
        let scene: Scene = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scene {}", path.display()))?;
        info!(
            "Loaded scene with {} cameras and {} tracks",
            scene.cameras.len(),
            scene.tracks.values().map(|t| t.len()).sum::<usize>()
        );
        Ok(scene)
    }

    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.id == id)
    }
}

/// An exit event and the cameras the person may have walked into
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub exit: ExitEvent,
    pub cameras: Vec<&'a Camera>,
    /// Index of the later candidate this exit continues into
    pub next: Option<usize>,
}

/// Narrow every camera's tracks down to exit events, ordered by start time
pub fn detect_exits(tracks: &CameraTracks, settings: &StitcherSettings) -> Result<Vec<ExitEvent>> {
    let config = &settings.isolation;
    let mut exits = Vec::new();

    for (camera, tracks) in tracks {
        let tracks = isolate_by_object_id(tracks.clone(), config);
        let tracks = isolate_by_length(tracks, config);
        let tracks = isolate_edge_events(tracks, config);
        let tracks = isolate_by_velocity(tracks, EdgeKind::End, config);

        let found = exit_events_from_tracks(tracks)
            .with_context(|| format!("Failed to build exit events for camera {}", camera))?;
        exits.extend(found);
    }

    exits.sort_by_key(|e| e.start_time());
    info!("Detected {} exit events", exits.len());
    Ok(exits)
}

/// Run the full exit pipeline over a scene, then look for each person on
/// the cameras they may have walked into
pub fn find_candidates<'a>(
    scene: &'a Scene,
    settings: &StitcherSettings,
) -> Result<Vec<Candidate<'a>>> {
    let exits = detect_exits(&scene.tracks, settings)?;

    let mut kept = Vec::with_capacity(exits.len());
    let mut cameras = Vec::with_capacity(exits.len());
    for mut exit in exits {
        let valid = match valid_cameras(&scene.cameras, &exit, &settings.raster) {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Skipping exit event {}: {}", exit.id, e);
                continue;
            }
        };

        for camera in &valid {
            let Some(tracks) = scene.tracks.get(&camera.id) else {
                continue;
            };
            match related_enter_events(tracks, &exit, &settings.isolation) {
                Ok(entrances) => exit.related_events.extend(entrances),
                Err(e) => warn!("Skipping entrances on camera {}: {}", camera.id, e),
            }
        }

        kept.push(exit);
        cameras.push(valid);
    }

    let links = link_exit_events(&kept);
    Ok(kept
        .into_iter()
        .zip(cameras)
        .zip(links)
        .map(|((exit, cameras), next)| Candidate {
            exit,
            cameras,
            next,
        })
        .collect())
}
