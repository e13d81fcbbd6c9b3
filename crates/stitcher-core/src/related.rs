//! Linking exit events to the entrances that may continue them
//!
//! After someone leaves a camera, the cameras they could have walked into are
//! searched for entrances shortly afterwards. An exit whose entrance is
//! itself the start of a later exit event chains into a path.

use tracing::debug;

use crate::error::CoreError;
use crate::event::{enter_events_from_tracks, EdgeEvent, EnterEvent, ExitEvent, Tracks};
use crate::isolate::{
    isolate_by_length, isolate_by_velocity, isolate_edges, isolate_gaps, EdgeKind,
    IsolationConfig,
};

/// Detections made within `duration_ms` after `exit` ended
pub fn tracks_after(tracks: &Tracks, exit: &ExitEvent, duration_ms: u64) -> Tracks {
    let Some(start) = exit.end_time() else {
        return Tracks::new();
    };
    let end = start.saturating_add(duration_ms);

    tracks
        .iter()
        .map(|(id, track)| {
            let window: Vec<_> = track
                .iter()
                .filter(|e| e.timestamp >= start && e.timestamp <= end)
                .cloned()
                .collect();
            (*id, window)
        })
        .filter(|(_, track)| !track.is_empty())
        .collect()
}

/// Entrances on one camera that could be the person who left in `exit`
pub fn related_enter_events(
    tracks: &Tracks,
    exit: &ExitEvent,
    config: &IsolationConfig,
) -> Result<Vec<EnterEvent>, CoreError> {
    let window = config.related_event_duration_secs.saturating_mul(1000);
    let tracks = tracks_after(tracks, exit, window);
    let tracks = isolate_gaps(tracks, EdgeKind::Begin, config);
    let tracks = isolate_by_length(tracks, config);
    let tracks = isolate_edges(tracks, EdgeKind::Begin, config);
    let tracks = isolate_by_velocity(tracks, EdgeKind::Begin, config);

    let entrances = enter_events_from_tracks(tracks)?;
    debug!("Exit event {} has {} related entrances", exit.id, entrances.len());
    Ok(entrances)
}

/// For every exit event, the index of the later exit event that continues it.
///
/// `exits` must be ordered by start time. Each exit event continues at most
/// one earlier exit.
pub fn link_exit_events(exits: &[ExitEvent]) -> Vec<Option<usize>> {
    let mut links = vec![None; exits.len()];
    let mut claimed = vec![false; exits.len()];

    for (i, exit) in exits.iter().enumerate().rev() {
        let next = exits
            .iter()
            .enumerate()
            .skip(i + 1)
            .find(|(k, other)| !claimed[*k] && other.is_related_to(exit))
            .map(|(k, _)| k);

        if let Some(k) = next {
            claimed[k] = true;
            links[i] = Some(k);
        }
    }
    links
}
