//! Session events
//!
//! Everything the controller publishes to the outside world, as values.
//! [`ChannelPublisher`](crate::ChannelPublisher) forwards publications in
//! this form so a UI or transport can consume them from any thread.

use crate::types::{Metadata, PlaybackStateUpdate, QueueItem};

/// Publication emitted by the playback controller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// Playback state changed
    PlaybackState(PlaybackStateUpdate),

    /// A new queue was loaded
    Queue(Vec<QueueItem>),

    /// Title of the new queue
    QueueTitle(String),

    /// Metadata of the item that just started
    Metadata(Metadata),

    /// Session became visible (true) or was torn down (false)
    SessionActive(bool),
}

impl SessionUpdate {
    /// The state update, if this is one
    pub fn as_playback_state(&self) -> Option<&PlaybackStateUpdate> {
        match self {
            SessionUpdate::PlaybackState(update) => Some(update),
            _ => None,
        }
    }
}
