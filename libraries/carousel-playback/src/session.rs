//! Session transport
//!
//! Outbound side of the controller: state, queue and metadata publications.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::events::SessionUpdate;
use crate::types::{Metadata, PlaybackStateUpdate, QueueItem};

/// Receiver of controller publications
///
/// Called from the controller's worker thread. Implementations should
/// return quickly; blocking here delays every queued command.
pub trait SessionPublisher: Send {
    fn set_playback_state(&mut self, update: &PlaybackStateUpdate);

    fn set_queue(&mut self, items: &[QueueItem]);

    fn set_queue_title(&mut self, title: &str);

    fn set_metadata(&mut self, metadata: &Metadata);

    fn set_session_active(&mut self, active: bool);
}

/// Publisher that forwards every publication as a [`SessionUpdate`]
///
/// Publications are dropped silently once the receiving side is gone.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: Sender<SessionUpdate>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiver its updates arrive on
    pub fn new() -> (Self, Receiver<SessionUpdate>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, update: SessionUpdate) {
        if self.tx.send(update).is_err() {
            tracing::trace!("Session update dropped: no receiver");
        }
    }
}

impl SessionPublisher for ChannelPublisher {
    fn set_playback_state(&mut self, update: &PlaybackStateUpdate) {
        self.send(SessionUpdate::PlaybackState(update.clone()));
    }

    fn set_queue(&mut self, items: &[QueueItem]) {
        self.send(SessionUpdate::Queue(items.to_vec()));
    }

    fn set_queue_title(&mut self, title: &str) {
        self.send(SessionUpdate::QueueTitle(title.to_string()));
    }

    fn set_metadata(&mut self, metadata: &Metadata) {
        self.send(SessionUpdate::Metadata(metadata.clone()));
    }

    fn set_session_active(&mut self, active: bool) {
        self.send(SessionUpdate::SessionActive(active));
    }
}
