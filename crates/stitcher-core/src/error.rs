use crate::event::ObjectId;

/// Errors that can occur while building events from tracked objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("track for object {object_id} has {len} human events, at least 2 are needed")]
    TrackTooShort { object_id: ObjectId, len: usize },

    #[error("event {0} has no human events")]
    EmptyEvent(ObjectId),
}
