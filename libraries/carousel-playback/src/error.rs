//! Error types for playback control

use thiserror::Error;

use crate::engine::EngineErrorKind;

/// Errors reported synchronously by a [`PlaybackEngine`](crate::PlaybackEngine)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Resource locator is unreadable or unsupported
    #[error("Resource error: {0}")]
    Resource(String),

    /// Resource could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Operation is not valid in the engine's current lifecycle state
    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Host refused to grant audio focus
    #[error("Audio focus denied")]
    FocusDenied,

    /// No catalog item carries the requested identifier
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Engine could not open the item's resource
    #[error("Failed to load resource: {0}")]
    ResourceLoad(String),

    /// Engine could not decode the item's resource
    #[error("Failed to decode resource: {0}")]
    Decode(String),

    /// Engine reported a failure while rendering
    #[error("Playback failed: {0}")]
    Runtime(EngineErrorKind),

    /// Queue index out of range
    #[error("Queue index {index} out of range (queue length {len})")]
    InvalidIndex { index: usize, len: usize },

    /// Operation requires a loaded queue
    #[error("No queue loaded")]
    NoQueue,

    /// Engine rejected an operation
    #[error("Engine error: {0}")]
    Engine(EngineError),

    /// Controller has been destroyed
    #[error("Playback controller is closed")]
    ControllerClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EngineError> for PlaybackError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Resource(msg) => PlaybackError::ResourceLoad(msg),
            EngineError::Decode(msg) => PlaybackError::Decode(msg),
            other @ EngineError::InvalidState(_) => PlaybackError::Engine(other),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
