//! Carousel - Playback Control
//!
//! Host-agnostic media playback controller for Carousel.
//!
//! This crate provides:
//! - Playback state machine (Stopped, Paused, Playing, Error)
//! - Circular queue navigation (next/previous wrap around)
//! - Play-from-id against a catalog
//! - Audio focus handling (pause on loss, resume after transient loss)
//! - Session publication (state, queue, metadata)
//!
//! # Architecture
//!
//! The controller owns no audio code. Decoding and rendering, focus
//! arbitration, the catalog and the session transport are collaborators
//! behind traits:
//! - [`PlaybackEngine`]: single-item decode/render primitive
//! - [`FocusArbiter`]: host audio focus service
//! - [`Catalog`]: source of the queue and of item metadata
//! - [`SessionPublisher`]: receives state, queue and metadata updates
//!
//! All state transitions run on one worker thread. Engine and focus
//! callbacks are delivered into the same inbox as client commands, so they
//! can never race a command.
//!
//! # Example: Play from id
//!
//! ```rust,no_run
//! use carousel_playback::{
//!     ChannelPublisher, Collaborators, ControllerConfig, EngineResult, Extras, FocusArbiter,
//!     FocusRequestResult, InMemoryCatalog, PlaybackController, PlaybackEngine, QueueItem,
//!     SessionUpdate,
//! };
//! use std::time::Duration;
//!
//! struct SilentEngine;
//!
//! impl PlaybackEngine for SilentEngine {
//!     fn reset(&mut self) -> EngineResult<()> { Ok(()) }
//!     fn load(&mut self, _locator: &str) -> EngineResult<()> { Ok(()) }
//!     fn prepare(&mut self) -> EngineResult<()> { Ok(()) }
//!     fn start(&mut self) -> EngineResult<()> { Ok(()) }
//!     fn pause(&mut self) -> EngineResult<()> { Ok(()) }
//!     fn stop(&mut self) -> EngineResult<()> { Ok(()) }
//!     fn current_position(&self) -> Duration { Duration::ZERO }
//!     fn is_playing(&self) -> bool { true }
//!     fn release(&mut self) {}
//! }
//!
//! struct AlwaysGrant;
//!
//! impl FocusArbiter for AlwaysGrant {
//!     fn request_focus(&mut self) -> FocusRequestResult { FocusRequestResult::Granted }
//!     fn abandon_focus(&mut self) {}
//! }
//!
//! let catalog = InMemoryCatalog::new(vec![
//!     QueueItem::new("a", "/music/a.mp3", "Song A"),
//!     QueueItem::new("b", "/music/b.mp3", "Song B"),
//! ]);
//! let (session, updates) = ChannelPublisher::new();
//!
//! let handle = PlaybackController::spawn(
//!     ControllerConfig::default(),
//!     Collaborators {
//!         engine: Box::new(SilentEngine),
//!         focus: Box::new(AlwaysGrant),
//!         catalog: Box::new(catalog),
//!         session: Box::new(session),
//!     },
//! )?;
//!
//! handle.play_from_id("b", Extras::new())?;
//! handle.skip_to_next()?; // wraps around to "a"
//! handle.flush()?;
//!
//! for update in updates.try_iter() {
//!     if let SessionUpdate::PlaybackState(state) = update {
//!         println!("{:?} at {}ms", state.status, state.position_ms());
//!     }
//! }
//!
//! handle.destroy();
//! # Ok::<(), carousel_playback::PlaybackError>(())
//! ```
//!
//! # Example: Reporting completion
//!
//! Engines receive an [`EngineNotifier`] before every load and report
//! completion through it from any thread:
//!
//! ```rust
//! use carousel_playback::EngineNotifier;
//!
//! fn on_end_of_stream(notifier: &EngineNotifier) {
//!     if !notifier.completed() {
//!         // Controller already shut down
//!     }
//! }
//! ```

mod catalog;
mod controller;
mod engine;
mod error;
mod events;
mod focus;
mod queue;
mod session;
pub mod types;

// Public exports
pub use catalog::{Catalog, InMemoryCatalog};
pub use controller::{Collaborators, PlaybackController, PlaybackHandle, PlaybackSnapshot};
pub use engine::{EngineErrorKind, EngineNotification, EngineNotifier, PlaybackEngine};
pub use error::{EngineError, EngineResult, PlaybackError, Result};
pub use events::SessionUpdate;
pub use focus::{FocusArbiter, FocusChange, FocusNotifier, FocusRequestResult};
pub use queue::Queue;
pub use session::{ChannelPublisher, SessionPublisher};
pub use types::{
    AllowedActions, ControllerConfig, Extras, FocusState, ItemDescription, Metadata,
    PlaybackStateUpdate, PlaybackStatus, QueueItem,
};
