//! Human detections and the enter/exit events built from them
//!
//! A track is the time-ordered list of detections the camera assigned to one
//! object ID. An exit event is a track that ends with the person leaving the
//! frame, an enter event one that starts with them walking in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::camera::CameraId;
use crate::error::CoreError;
use crate::types::{s64, s8, Vec2};

/// Object ID assigned by the camera's tracker
pub type ObjectId = u64;

/// Milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Detections grouped by object ID
pub type Tracks = BTreeMap<ObjectId, Vec<HumanEvent>>;

/// Tracks grouped by the camera that recorded them. Object IDs are only
/// unique within one camera.
pub type CameraTracks = BTreeMap<CameraId, Tracks>;

/// A single human bounding box at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanEvent {
    pub object_id: ObjectId,
    /// Top-left of the bounding box in frame coordinates (0..1)
    pub position: Vec2,
    /// Size of the bounding box in frame coordinates (0..1)
    pub dimensions: Vec2,
    pub timestamp: Timestamp,
    pub camera: CameraId,
}

/// Velocity of the bounding box from `a` to `b` in frame units per millisecond
pub fn velocity(a: &HumanEvent, b: &HumanEvent) -> Vec2 {
    let dt = (b.timestamp as s64 - a.timestamp as s64) as f32;
    if dt == 0.0 {
        return Vec2::ZERO;
    }
    (b.position - a.position) / dt
}

/// Direction reduced to -1, 0 or 1 per axis. +x is right, +y is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Heading {
    pub x: s8,
    pub y: s8,
}

impl Heading {
    pub const ZERO: Heading = Heading { x: 0, y: 0 };

    pub const fn new(x: s8, y: s8) -> Self {
        Self { x, y }
    }

    /// Reduce a velocity to a heading. A component only counts as moving once
    /// it is beyond `threshold` in either direction.
    pub fn from_velocity(velocity: Vec2, threshold: Vec2) -> Self {
        let axis = |v: f32, t: f32| -> s8 {
            if v > t {
                1
            } else if v < -t {
                -1
            } else {
                0
            }
        };
        Self {
            x: axis(velocity.x, threshold.x),
            y: axis(velocity.y, threshold.y),
        }
    }

    /// Which frame edge a position is near. 1 is right/bottom, -1 is left/top.
    pub fn from_position(position: Vec2, threshold: Vec2) -> Self {
        let axis = |p: f32, t: f32| -> s8 {
            if p > 1.0 - t {
                1
            } else if p < t {
                -1
            } else {
                0
            }
        };
        Self {
            x: axis(position.x, threshold.x),
            y: axis(position.y, threshold.y),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Shared view over enter and exit events
pub trait EdgeEvent {
    fn events(&self) -> &[HumanEvent];

    /// The earliest human event
    fn first(&self) -> Option<&HumanEvent> {
        self.events().first()
    }

    /// Camera that recorded the event
    fn camera(&self) -> Option<CameraId> {
        self.first().map(|e| e.camera)
    }

    /// Timestamp of the first human event
    fn start_time(&self) -> Option<Timestamp> {
        self.first().map(|e| e.timestamp)
    }

    /// Timestamp of the last human event
    fn end_time(&self) -> Option<Timestamp> {
        self.events().last().map(|e| e.timestamp)
    }
}

/// Someone walking into view of a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterEvent {
    pub id: ObjectId,
    pub events: Vec<HumanEvent>,
    /// Velocity between the first two human events
    pub velocity: Vec2,
}

/// Someone walking out of view of a camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitEvent {
    pub id: ObjectId,
    pub events: Vec<HumanEvent>,
    /// Enter events on other cameras that could be the same person
    #[serde(default)]
    pub related_events: Vec<EnterEvent>,
    /// Velocity between the last two human events
    pub velocity: Vec2,
}

impl EdgeEvent for EnterEvent {
    fn events(&self) -> &[HumanEvent] {
        &self.events
    }
}

impl EdgeEvent for ExitEvent {
    fn events(&self) -> &[HumanEvent] {
        &self.events
    }
}

impl EnterEvent {
    pub fn from_track(id: ObjectId, events: Vec<HumanEvent>) -> Result<Self, CoreError> {
        let [first, second, ..] = events.as_slice() else {
            return Err(CoreError::TrackTooShort {
                object_id: id,
                len: events.len(),
            });
        };
        let velocity = velocity(first, second);
        Ok(Self {
            id,
            events,
            velocity,
        })
    }
}

impl ExitEvent {
    pub fn from_track(id: ObjectId, events: Vec<HumanEvent>) -> Result<Self, CoreError> {
        let [.., second_last, last] = events.as_slice() else {
            return Err(CoreError::TrackTooShort {
                object_id: id,
                len: events.len(),
            });
        };
        let velocity = velocity(second_last, last);
        Ok(Self {
            id,
            events,
            related_events: Vec::new(),
            velocity,
        })
    }

    /// Whether this event is one of the related events of `previous`, which
    /// lets the two be chained into one path
    pub fn is_related_to(&self, previous: &ExitEvent) -> bool {
        previous
            .related_events
            .iter()
            .any(|related| events_are_the_same(related, self))
    }

    /// Heading of the final velocity with no dead zone
    pub fn heading(&self) -> Heading {
        Heading::from_velocity(self.velocity, Vec2::ZERO)
    }
}

/// Two events are the same when their first detections match on time,
/// camera and bounding box. Object IDs are unreliable and ignored.
pub fn events_are_the_same(a: &impl EdgeEvent, b: &impl EdgeEvent) -> bool {
    match (a.first(), b.first()) {
        (Some(a), Some(b)) => {
            a.timestamp == b.timestamp
                && a.camera == b.camera
                && a.dimensions == b.dimensions
                && a.position == b.position
        }
        _ => false,
    }
}

/// Group detections into time-ordered tracks per camera and object ID
pub fn group_tracks(events: impl IntoIterator<Item = HumanEvent>) -> CameraTracks {
    let mut grouped = CameraTracks::new();
    for event in events {
        grouped
            .entry(event.camera)
            .or_default()
            .entry(event.object_id)
            .or_default()
            .push(event);
    }
    for track in grouped.values_mut().flat_map(|tracks| tracks.values_mut()) {
        track.sort_by_key(|e| e.timestamp);
    }
    grouped
}

/// Build enter events from tracks, ordered by their first detection
pub fn enter_events_from_tracks(tracks: Tracks) -> Result<Vec<EnterEvent>, CoreError> {
    let mut events = tracks
        .into_iter()
        .map(|(id, track)| EnterEvent::from_track(id, track))
        .collect::<Result<Vec<_>, _>>()?;
    events.sort_by_key(|e| e.start_time());
    Ok(events)
}

/// Build exit events from tracks, ordered by their first detection
pub fn exit_events_from_tracks(tracks: Tracks) -> Result<Vec<ExitEvent>, CoreError> {
    let mut events = tracks
        .into_iter()
        .map(|(id, track)| ExitEvent::from_track(id, track))
        .collect::<Result<Vec<_>, _>>()?;
    events.sort_by_key(|e| e.start_time());
    Ok(events)
}
