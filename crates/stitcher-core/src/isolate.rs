//! Filters that narrow raw tracks down to real enter/exit candidates
//!
//! Every isolator takes ownership of the tracks and returns the survivors, so
//! they chain in whatever order a pipeline needs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{velocity, Heading, HumanEvent, Tracks};
use crate::types::Vec2;

/// Number of consecutive velocities sampled when ranking a track's direction
const VELOCITY_SAMPLES: usize = 3;

/// Which end of a track an isolator looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// The start of the track, used for enter events
    Begin,
    /// The end of the track, used for exit events
    End,
}

/// Thresholds used by the isolators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    /// Distance from a frame edge (0..1) that still counts as "at the edge"
    pub edge_distance: f32,
    /// Minimum number of detections for a track to be considered
    pub minimum_event_length: usize,
    /// Largest gap between detections before an object ID is assumed reused
    pub object_id_max_gap_ms: u64,
    /// Slowest speed in frame units per millisecond that still counts as moving
    pub minimum_speed: f32,
    /// Edge threshold for the last detection of an exit
    pub exit_position_threshold: f32,
    /// Edge threshold for the first detection of an entrance
    pub enter_position_threshold: f32,
    /// How long after an exit other cameras are searched for the same person
    pub related_event_duration_secs: u64,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            edge_distance: 0.4,
            minimum_event_length: 2,
            object_id_max_gap_ms: 10_000,
            minimum_speed: 0.015 / 1000.0,
            exit_position_threshold: 0.4,
            enter_position_threshold: 0.5,
            related_event_duration_secs: 30,
        }
    }
}

/// Drop tracks with too few detections
pub fn isolate_by_length(mut tracks: Tracks, config: &IsolationConfig) -> Tracks {
    let before = tracks.len();
    tracks.retain(|_, track| track.len() >= config.minimum_event_length);
    debug!("Length isolator kept {} of {} tracks", tracks.len(), before);
    tracks
}

/// Cut a track at gaps longer than `max_gap_ms`.
///
/// `Begin` keeps everything before the first gap, `End` everything after the last.
pub fn split_track_on_gap(
    mut track: Vec<HumanEvent>,
    max_gap_ms: u64,
    kind: EdgeKind,
) -> Vec<HumanEvent> {
    let is_gap =
        |pair: &[HumanEvent]| pair[1].timestamp.saturating_sub(pair[0].timestamp) > max_gap_ms;

    match kind {
        EdgeKind::Begin => {
            if let Some(i) = track.windows(2).position(is_gap) {
                track.truncate(i + 1);
            }
        }
        EdgeKind::End => {
            if let Some(i) = track.windows(2).rposition(is_gap) {
                track.drain(..=i);
            }
        }
    }
    track
}

/// Keep one stretch of each track, split at object ID reuse: the earliest
/// for `Begin`, the most recent for `End`
pub fn isolate_gaps(tracks: Tracks, kind: EdgeKind, config: &IsolationConfig) -> Tracks {
    tracks
        .into_iter()
        .map(|(id, track)| (id, split_track_on_gap(track, config.object_id_max_gap_ms, kind)))
        .filter(|(_, track)| !track.is_empty())
        .collect()
}

/// Keep only the most recent stretch of each track
pub fn isolate_by_object_id(tracks: Tracks, config: &IsolationConfig) -> Tracks {
    isolate_gaps(tracks, EdgeKind::End, config)
}

/// Keep tracks whose first (`Begin`) or last (`End`) detection is near a frame edge
pub fn isolate_edges(mut tracks: Tracks, kind: EdgeKind, config: &IsolationConfig) -> Tracks {
    let small = config.edge_distance;
    let large = 1.0 - config.edge_distance;
    let before = tracks.len();

    tracks.retain(|_, track| {
        let event = match kind {
            EdgeKind::Begin => track.first(),
            EdgeKind::End => track.last(),
        };
        match event {
            Some(event) => {
                let p = event.position;
                p.x < small || p.x > large || p.y < small || p.y > large
            }
            None => false,
        }
    });

    debug!("Edge isolator ({:?}) kept {} of {} tracks", kind, tracks.len(), before);
    tracks
}

/// Keep tracks whose last detection is near a frame edge
pub fn isolate_edge_events(tracks: Tracks, config: &IsolationConfig) -> Tracks {
    isolate_edges(tracks, EdgeKind::End, config)
}

/// Mean of the samples moving in the majority direction. Ties go to negative.
fn dominant_axis(samples: &[f32]) -> f32 {
    let positive = samples.iter().filter(|v| **v > 0.0).count();
    let negative = samples.iter().filter(|v| **v < 0.0).count();
    let count = positive.max(negative);
    if count == 0 {
        return 0.0;
    }

    let winning_sign = if positive > negative { 1.0 } else { -1.0 };
    let total: f32 = samples
        .iter()
        .filter(|v| v.signum() == winning_sign && **v != 0.0)
        .sum();
    total / count as f32
}

/// Direction a track is moving at its start or end.
///
/// Samples up to three velocities from that end, keeps an odd number of them
/// and averages each axis over the samples that agree with the majority.
/// Returns `None` for tracks with fewer than two detections.
pub fn dominant_velocity(track: &[HumanEvent], kind: EdgeKind) -> Option<Vec2> {
    let mut samples: Vec<Vec2> = match kind {
        EdgeKind::Begin => track
            .windows(2)
            .take(VELOCITY_SAMPLES)
            .map(|w| velocity(&w[0], &w[1]))
            .collect(),
        EdgeKind::End => track
            .windows(2)
            .rev()
            .take(VELOCITY_SAMPLES)
            .map(|w| velocity(&w[0], &w[1]))
            .collect(),
    };

    if samples.is_empty() {
        return None;
    }
    if samples.len() % 2 == 0 {
        samples.pop();
    }

    let xs: Vec<f32> = samples.iter().map(|v| v.x).collect();
    let ys: Vec<f32> = samples.iter().map(|v| v.y).collect();
    Some(Vec2::new(dominant_axis(&xs), dominant_axis(&ys)))
}

/// Keep tracks that move fast enough and in a direction consistent with the
/// frame edge they are at.
///
/// For `End`, the heading has to point through the edge the last detection
/// sits at on at least one axis. For `Begin`, it has to point away from the
/// entry edge on both axes.
pub fn isolate_by_velocity(
    mut tracks: Tracks,
    kind: EdgeKind,
    config: &IsolationConfig,
) -> Tracks {
    let before = tracks.len();

    tracks.retain(|id, track| {
        let Some(v) = dominant_velocity(track, kind) else {
            return false;
        };
        if v.abs().length() < config.minimum_speed {
            debug!("Track {} is too slow ({:?})", id, v);
            return false;
        }

        let heading = Heading::from_velocity(v, Vec2::ZERO);
        match kind {
            EdgeKind::End => {
                let Some(last) = track.last() else {
                    return false;
                };
                let edge = Heading::from_position(
                    last.position,
                    Vec2::splat(config.exit_position_threshold),
                );
                (edge.x != 0 && heading.x == edge.x) || (edge.y != 0 && heading.y == edge.y)
            }
            EdgeKind::Begin => {
                let Some(first) = track.first() else {
                    return false;
                };
                let edge = Heading::from_position(
                    first.position,
                    Vec2::splat(config.enter_position_threshold),
                );
                heading.x != edge.x && heading.y != edge.y
            }
        }
    });

    debug!(
        "Velocity isolator ({:?}) kept {} of {} tracks",
        kind,
        tracks.len(),
        before
    );
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::human;

    fn walk(id: u64, points: &[(f32, f32)], start: u64, step: u64) -> Vec<HumanEvent> {
        points
            .iter()
            .enumerate()
            .map(|(i, (x, y))| human(id, *x, *y, start + i as u64 * step))
            .collect()
    }

    #[test]
    fn test_isolate_by_length() {
        let mut tracks = Tracks::new();
        tracks.insert(1, walk(1, &[(0.5, 0.5)], 0, 100));
        tracks.insert(2, walk(2, &[(0.5, 0.5), (0.6, 0.5)], 0, 100));

        let kept = isolate_by_length(tracks, &IsolationConfig::default());
        assert_eq!(kept.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_split_track_on_gap() {
        let mut track = walk(1, &[(0.1, 0.1), (0.2, 0.1)], 0, 100);
        track.extend(walk(1, &[(0.7, 0.7), (0.8, 0.7), (0.9, 0.7)], 60_000, 100));

        let tail = split_track_on_gap(track.clone(), 10_000, EdgeKind::End);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].timestamp, 60_000);

        let head = split_track_on_gap(track.clone(), 10_000, EdgeKind::Begin);
        assert_eq!(head.len(), 2);
        assert_eq!(head[1].timestamp, 100);

        let untouched = split_track_on_gap(track, 100_000, EdgeKind::End);
        assert_eq!(untouched.len(), 5);
    }

    #[test]
    fn test_isolate_edge_events() {
        let mut tracks = Tracks::new();
        tracks.insert(1, walk(1, &[(0.5, 0.5), (0.95, 0.5)], 0, 100));
        tracks.insert(2, walk(2, &[(0.9, 0.5), (0.5, 0.5)], 0, 100));

        let kept = isolate_edge_events(tracks, &IsolationConfig::default());
        assert!(kept.contains_key(&1));
        assert!(!kept.contains_key(&2));
    }

    #[test]
    fn test_isolate_entering_edges() {
        let mut tracks = Tracks::new();
        tracks.insert(1, walk(1, &[(0.05, 0.5), (0.5, 0.5)], 0, 100));
        tracks.insert(2, walk(2, &[(0.5, 0.5), (0.95, 0.5)], 0, 100));

        let kept = isolate_edges(tracks, EdgeKind::Begin, &IsolationConfig::default());
        assert_eq!(kept.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_isolate_gaps_keeps_first_stretch() {
        let mut track = walk(1, &[(0.1, 0.1), (0.2, 0.1)], 0, 100);
        track.extend(walk(1, &[(0.7, 0.7)], 60_000, 100));
        let mut tracks = Tracks::new();
        tracks.insert(1, track);

        let config = IsolationConfig::default();
        assert_eq!(isolate_gaps(tracks.clone(), EdgeKind::Begin, &config)[&1].len(), 2);
        assert_eq!(isolate_by_object_id(tracks, &config)[&1].len(), 1);
    }

    #[test]
    fn test_dominant_velocity_ignores_outliers() {
        // Three samples at the end: right, right, then a jitter left
        let track = walk(1, &[(0.5, 0.5), (0.4, 0.5), (0.6, 0.5), (0.8, 0.5)], 0, 100);
        let v = dominant_velocity(&track, EdgeKind::End).unwrap();
        assert!((v.x - 0.002).abs() < 1e-6);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn test_dominant_velocity_even_samples() {
        // Two velocities: the later one is dropped
        let track = walk(1, &[(0.5, 0.5), (0.6, 0.5), (0.5, 0.5)], 0, 100);
        let begin = dominant_velocity(&track, EdgeKind::Begin).unwrap();
        assert!(begin.x > 0.0);
        let end = dominant_velocity(&track, EdgeKind::End).unwrap();
        assert!(end.x < 0.0);

        assert_eq!(dominant_velocity(&track[..1], EdgeKind::End), None);
    }

    #[test]
    fn test_isolate_exits_by_velocity() {
        let config = IsolationConfig::default();
        let mut tracks = Tracks::new();
        // Walking out the right edge
        tracks.insert(1, walk(1, &[(0.6, 0.5), (0.7, 0.5), (0.8, 0.5), (0.9, 0.5)], 0, 100));
        // At the right edge but walking back in
        tracks.insert(2, walk(2, &[(0.95, 0.5), (0.9, 0.5), (0.85, 0.5), (0.8, 0.5)], 0, 100));
        // Standing still
        tracks.insert(3, walk(3, &[(0.9, 0.5), (0.9, 0.5), (0.9, 0.5)], 0, 100));

        let kept = isolate_by_velocity(tracks, EdgeKind::End, &config);
        assert_eq!(kept.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_isolate_enters_by_velocity() {
        let config = IsolationConfig::default();
        let mut tracks = Tracks::new();
        // Entering from the top left, walking down and right
        tracks.insert(1, walk(1, &[(0.1, 0.1), (0.2, 0.2), (0.3, 0.3)], 0, 100));
        // Starting top left but walking further out
        tracks.insert(2, walk(2, &[(0.1, 0.1), (0.05, 0.05), (0.01, 0.01)], 0, 100));

        let kept = isolate_by_velocity(tracks, EdgeKind::Begin, &config);
        assert_eq!(kept.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: IsolationConfig = serde_json::from_str(r#"{ "edge_distance": 0.2 }"#).unwrap();
        assert_eq!(config.edge_distance, 0.2);
        assert_eq!(config.minimum_event_length, 2);
    }
}
