//! Core types for playback control

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::BitOr;
use std::time::{Duration, Instant};

/// Opaque key/value extras attached to a play-from-id request
pub type Extras = HashMap<String, String>;

/// Descriptive information shown for a queue entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemDescription {
    /// Display title
    pub title: String,

    /// Artist name (optional)
    pub artist: Option<String>,

    /// Artwork reference, e.g. a file path or URI (optional)
    pub artwork: Option<String>,

    /// Expected duration, if the catalog knows it
    pub duration: Option<Duration>,
}

/// Playable queue entry
///
/// Immutable once handed to the controller. Queues are replaced
/// wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Stable item identifier from the catalog
    pub id: String,

    /// Resource locator handed to the engine (path or URI)
    pub locator: String,

    /// Display information
    pub description: ItemDescription,
}

impl QueueItem {
    /// Create a queue item with only a title
    pub fn new(id: impl Into<String>, locator: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locator: locator.into(),
            description: ItemDescription {
                title: title.into(),
                ..ItemDescription::default()
            },
        }
    }

    /// Set the artist
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.description.artist = Some(artist.into());
        self
    }

    /// Set the duration hint
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.description.duration = Some(duration);
        self
    }
}

/// Track metadata published to the session transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork: Option<String>,
    pub duration: Option<Duration>,
}

impl From<&QueueItem> for Metadata {
    fn from(item: &QueueItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.description.title.clone(),
            artist: item.description.artist.clone(),
            album: None,
            artwork: item.description.artwork.clone(),
            duration: item.description.duration,
        }
    }
}

/// Authoritative playback status
///
/// Exactly one status is current at any time; the controller swaps it
/// atomically and publishes the result.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackStatus {
    /// Nothing rendering
    Stopped,

    /// Rendering suspended at `position`
    Paused { position: Duration },

    /// Rendering; `position` was sampled from the engine at `started_at`
    Playing {
        position: Duration,
        started_at: Instant,
    },

    /// Last operation failed
    Error { message: String },
}

impl PlaybackStatus {
    /// Position reported with this status
    pub fn position(&self) -> Duration {
        match self {
            PlaybackStatus::Paused { position } | PlaybackStatus::Playing { position, .. } => {
                *position
            }
            PlaybackStatus::Stopped | PlaybackStatus::Error { .. } => Duration::ZERO,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackStatus::Playing { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PlaybackStatus::Error { .. })
    }

    /// Transport actions a client may issue while in this status
    ///
    /// Queues loop around, so next/previous are always offered.
    pub fn allowed_actions(&self) -> AllowedActions {
        match self {
            PlaybackStatus::Playing { .. } => {
                AllowedActions::PAUSE
                    | AllowedActions::PLAY_FROM_ID
                    | AllowedActions::SKIP_TO_NEXT
                    | AllowedActions::SKIP_TO_PREVIOUS
                    | AllowedActions::SKIP_TO_QUEUE_ITEM
            }
            PlaybackStatus::Paused { .. } | PlaybackStatus::Stopped | PlaybackStatus::Error { .. } => {
                AllowedActions::PLAY
                    | AllowedActions::PLAY_FROM_ID
                    | AllowedActions::SKIP_TO_NEXT
                    | AllowedActions::SKIP_TO_PREVIOUS
            }
        }
    }
}

/// Bitmask of transport actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AllowedActions(u32);

impl AllowedActions {
    pub const NONE: Self = Self(0);
    pub const PLAY: Self = Self(1 << 0);
    pub const PAUSE: Self = Self(1 << 1);
    pub const PLAY_FROM_ID: Self = Self(1 << 2);
    pub const SKIP_TO_NEXT: Self = Self(1 << 3);
    pub const SKIP_TO_PREVIOUS: Self = Self(1 << 4);
    pub const SKIP_TO_QUEUE_ITEM: Self = Self(1 << 5);

    /// Raw bit representation
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every action in `other` is also in `self`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AllowedActions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Controller's belief about audio-focus ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusState {
    /// Focus neither held nor requested
    None,

    /// Request in flight
    Requested,

    /// Host granted focus
    Granted,

    /// Host took focus away
    Lost { transient: bool },
}

/// Payload of a playback state publication
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStateUpdate {
    pub status: PlaybackStatus,

    /// Position at publication time
    pub position: Duration,

    /// Playback speed (1.0 while rendering, 0.0 otherwise)
    pub speed: f32,

    pub actions: AllowedActions,

    /// Index of the current queue item, when a queue is loaded
    pub active_queue_index: Option<usize>,
}

impl PlaybackStateUpdate {
    /// Position in whole milliseconds
    pub fn position_ms(&self) -> u64 {
        self.position.as_millis() as u64
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Title published with every new queue (default: "Playlist")
    pub queue_title: String,

    /// Speed reported while playing (default: 1.0)
    pub playback_speed: f32,

    /// Pause on `LossTransientCanDuck` instead of continuing (default: true)
    pub pause_on_duck: bool,

    /// Resume when focus returns after a transient loss (default: true)
    pub resume_after_transient_loss: bool,

    /// Name of the controller worker thread (default: "carousel-playback")
    pub thread_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            queue_title: "Playlist".to_string(),
            playback_speed: 1.0,
            pause_on_duck: true,
            resume_after_transient_loss: true,
            thread_name: "carousel-playback".to_string(),
        }
    }
}
