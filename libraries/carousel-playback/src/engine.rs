//! Playback engine adapter
//!
//! Abstracts the audio decode/render primitive. The controller never talks
//! to a [`PlaybackEngine`] directly; it goes through [`EngineAdapter`], which
//! tracks the engine lifecycle and stamps asynchronous notifications so
//! that callbacks from an item that has since been replaced are discarded.

use crossbeam_channel::Sender;
use std::fmt;
use std::time::Duration;

use crate::controller::Inbox;
use crate::error::{EngineError, EngineResult};

/// Single-item audio decode/render primitive
///
/// Implementations are driven from the controller's worker thread only.
/// `load` and `prepare` may block on I/O.
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackEngine: Send {
    /// Return to the idle state; must be safe from any prior state
    fn reset(&mut self) -> EngineResult<()>;

    /// Open the resource behind `locator`
    ///
    /// Fails with [`EngineError::Resource`] when it is unreadable or unsupported.
    fn load(&mut self, locator: &str) -> EngineResult<()>;

    /// Make the loaded resource ready to render
    ///
    /// Fails with [`EngineError::Decode`] when it cannot be decoded.
    fn prepare(&mut self) -> EngineResult<()>;

    /// Start or resume rendering
    fn start(&mut self) -> EngineResult<()>;

    /// Suspend rendering, keeping the position
    fn pause(&mut self) -> EngineResult<()>;

    /// Stop rendering
    fn stop(&mut self) -> EngineResult<()>;

    /// Current render position of the loaded item
    fn current_position(&self) -> Duration;

    /// Whether audio is being rendered right now
    fn is_playing(&self) -> bool;

    /// Free all engine resources; no other call follows
    fn release(&mut self);

    /// Install the channel for completion and runtime error notifications
    ///
    /// Called before every `load`. Engines must report through the most
    /// recently installed notifier and emit exactly one completion per
    /// fully played item.
    fn set_notifier(&mut self, notifier: EngineNotifier) {
        let _ = notifier;
    }
}

/// Runtime failure reported asynchronously by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Decoding failed mid-stream
    Decode,

    /// Resource became unreadable mid-stream
    Io,

    /// Output device or unclassified failure
    Unknown,
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineErrorKind::Decode => write!(f, "decode failure during playback"),
            EngineErrorKind::Io => write!(f, "resource became unreadable during playback"),
            EngineErrorKind::Unknown => write!(f, "engine failure"),
        }
    }
}

/// Asynchronous engine notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineNotification {
    /// Loaded item played to its end
    Completed,

    /// Rendering failed
    Error(EngineErrorKind),
}

/// Delivers engine notifications into the controller's inbox
///
/// Cheap to clone and safe to use from any thread. Sending never blocks.
#[derive(Debug, Clone)]
pub struct EngineNotifier {
    inbox: Sender<Inbox>,
    generation: u64,
}

impl EngineNotifier {
    pub(crate) fn new(inbox: Sender<Inbox>, generation: u64) -> Self {
        Self { inbox, generation }
    }

    /// Load generation this notifier belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report that the loaded item finished playing
    ///
    /// Returns false once the controller has shut down.
    pub fn completed(&self) -> bool {
        self.send(EngineNotification::Completed)
    }

    /// Report a runtime rendering failure
    pub fn error(&self, kind: EngineErrorKind) -> bool {
        self.send(EngineNotification::Error(kind))
    }

    fn send(&self, notification: EngineNotification) -> bool {
        self.inbox
            .send(Inbox::Engine {
                generation: self.generation,
                notification,
            })
            .is_ok()
    }
}

/// Engine lifecycle as tracked by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EngineLifecycle {
    /// Reset, nothing loaded
    Idle,
    Loaded,
    Prepared,
    Started,
    Paused,
    Stopped,
    /// Played to the end
    Completed,
    /// Last operation failed; only `reset` or `release` make sense
    Failed,
    /// Terminal
    Released,
}

/// Lifecycle-tracking wrapper around a [`PlaybackEngine`]
///
/// Holds exactly one item at a time. Every `reset`, `stop` and `release`
/// opens a new notification generation, so completions still queued for a
/// previous item are recognisable as stale.
pub(crate) struct EngineAdapter {
    engine: Box<dyn PlaybackEngine>,
    inbox: Sender<Inbox>,
    lifecycle: EngineLifecycle,
    generation: u64,
}

impl EngineAdapter {
    pub(crate) fn new(engine: Box<dyn PlaybackEngine>, inbox: Sender<Inbox>) -> Self {
        Self {
            engine,
            inbox,
            lifecycle: EngineLifecycle::Idle,
            generation: 0,
        }
    }

    pub fn lifecycle(&self) -> EngineLifecycle {
        self.lifecycle
    }

    /// Current notification generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether an item is loaded and can be started without reloading
    pub fn is_loaded(&self) -> bool {
        matches!(
            self.lifecycle,
            EngineLifecycle::Prepared
                | EngineLifecycle::Started
                | EngineLifecycle::Paused
                | EngineLifecycle::Completed
        )
    }

    pub fn is_released(&self) -> bool {
        self.lifecycle == EngineLifecycle::Released
    }

    /// Whether audio is being rendered right now
    pub fn is_playing(&self) -> bool {
        self.lifecycle == EngineLifecycle::Started && self.engine.is_playing()
    }

    /// Render position of the loaded item, zero when nothing is loaded
    pub fn current_position(&self) -> Duration {
        if self.is_loaded() {
            self.engine.current_position()
        } else {
            Duration::ZERO
        }
    }

    pub fn reset(&mut self) -> EngineResult<()> {
        self.ensure_live("reset")?;
        self.generation += 1;
        let result = self.engine.reset();
        self.transition(result, EngineLifecycle::Idle)
    }

    pub fn load(&mut self, locator: &str) -> EngineResult<()> {
        self.require(EngineLifecycle::Idle, "load")?;
        self.engine
            .set_notifier(EngineNotifier::new(self.inbox.clone(), self.generation));
        let result = self.engine.load(locator);
        self.transition(result, EngineLifecycle::Loaded)
    }

    pub fn prepare(&mut self) -> EngineResult<()> {
        self.require(EngineLifecycle::Loaded, "prepare")?;
        let result = self.engine.prepare();
        self.transition(result, EngineLifecycle::Prepared)
    }

    pub fn start(&mut self) -> EngineResult<()> {
        match self.lifecycle {
            EngineLifecycle::Started if self.engine.is_playing() => Ok(()),
            EngineLifecycle::Started
            | EngineLifecycle::Prepared
            | EngineLifecycle::Paused
            | EngineLifecycle::Completed => {
                let result = self.engine.start();
                self.transition(result, EngineLifecycle::Started)
            }
            other => Err(Self::invalid("start", other)),
        }
    }

    pub fn pause(&mut self) -> EngineResult<()> {
        match self.lifecycle {
            EngineLifecycle::Paused => Ok(()),
            EngineLifecycle::Started => {
                let result = self.engine.pause();
                self.transition(result, EngineLifecycle::Paused)
            }
            other => Err(Self::invalid("pause", other)),
        }
    }

    /// Stop rendering; a no-op when nothing is loaded
    pub fn stop(&mut self) -> EngineResult<()> {
        match self.lifecycle {
            EngineLifecycle::Started
            | EngineLifecycle::Paused
            | EngineLifecycle::Prepared
            | EngineLifecycle::Completed => {
                self.generation += 1;
                let result = self.engine.stop();
                self.transition(result, EngineLifecycle::Stopped)
            }
            EngineLifecycle::Released => Err(Self::invalid("stop", EngineLifecycle::Released)),
            _ => Ok(()),
        }
    }

    /// Free the engine; returns false if it was already released
    pub fn release(&mut self) -> bool {
        if self.is_released() {
            return false;
        }
        self.generation += 1;
        self.engine.release();
        self.lifecycle = EngineLifecycle::Released;
        tracing::debug!("Engine released");
        true
    }

    /// Record that the current item played to its end
    ///
    /// A completion can land after a pause that raced it; the item still
    /// counts as finished.
    pub(crate) fn mark_completed(&mut self) {
        if matches!(
            self.lifecycle,
            EngineLifecycle::Started | EngineLifecycle::Paused
        ) {
            self.lifecycle = EngineLifecycle::Completed;
        }
    }

    /// Record an asynchronous rendering failure
    pub(crate) fn mark_failed(&mut self) {
        if !self.is_released() {
            self.generation += 1;
            self.lifecycle = EngineLifecycle::Failed;
        }
    }

    fn transition(&mut self, result: EngineResult<()>, next: EngineLifecycle) -> EngineResult<()> {
        match result {
            Ok(()) => {
                tracing::trace!(from = ?self.lifecycle, to = ?next, "Engine transition");
                self.lifecycle = next;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(from = ?self.lifecycle, error = %e, "Engine operation failed");
                self.lifecycle = EngineLifecycle::Failed;
                Err(e)
            }
        }
    }

    fn require(&self, required: EngineLifecycle, operation: &str) -> EngineResult<()> {
        if self.lifecycle == required {
            Ok(())
        } else {
            Err(Self::invalid(operation, self.lifecycle))
        }
    }

    fn ensure_live(&self, operation: &str) -> EngineResult<()> {
        if self.is_released() {
            Err(Self::invalid(operation, EngineLifecycle::Released))
        } else {
            Ok(())
        }
    }

    fn invalid(operation: &str, lifecycle: EngineLifecycle) -> EngineError {
        EngineError::InvalidState(format!("cannot {} while {:?}", operation, lifecycle))
    }
}

impl Drop for EngineAdapter {
    fn drop(&mut self) {
        self.release();
    }
}
