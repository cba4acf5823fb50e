//! Audio focus arbitration client
//!
//! The host arbitrates which producer may render audio. The controller asks
//! for focus before starting playback, gives it up on pause and reacts to
//! focus changes the host pushes through a [`FocusNotifier`].

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::controller::Inbox;
use crate::error::{PlaybackError, Result};
use crate::types::FocusState;

/// Host answer to a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequestResult {
    Granted,
    Denied,
}

/// Focus change pushed by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    /// Focus (re)gained
    Gain,

    /// Focus lost for an unbounded time
    Loss,

    /// Focus lost briefly, e.g. for a notification
    LossTransient,

    /// Focus lost briefly; lowering volume would be acceptable
    LossTransientCanDuck,
}

impl FocusChange {
    pub fn is_loss(self) -> bool {
        !matches!(self, FocusChange::Gain)
    }

    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FocusChange::LossTransient | FocusChange::LossTransientCanDuck
        )
    }
}

/// Host-side focus arbitration service
#[cfg_attr(test, mockall::automock)]
pub trait FocusArbiter: Send {
    /// Ask for exclusive rendering rights
    fn request_focus(&mut self) -> FocusRequestResult;

    /// Give rendering rights back; must tolerate being called without focus
    fn abandon_focus(&mut self);

    /// Install the channel for host-initiated focus changes
    ///
    /// Called once when the controller starts.
    fn set_notifier(&mut self, notifier: FocusNotifier) {
        let _ = notifier;
    }
}

/// Delivers focus changes into the controller's inbox
#[derive(Debug, Clone)]
pub struct FocusNotifier {
    inbox: Sender<Inbox>,
}

impl FocusNotifier {
    pub(crate) fn new(inbox: Sender<Inbox>) -> Self {
        Self { inbox }
    }

    /// Report a focus change; returns false once the controller has shut down
    pub fn notify(&self, change: FocusChange) -> bool {
        self.inbox.send(Inbox::Focus(change)).is_ok()
    }
}

/// How the controller reacts to host focus changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FocusPolicy {
    /// Treat `LossTransientCanDuck` like `LossTransient`
    pub pause_on_duck: bool,

    /// Resume on `Gain` after a transient loss interrupted playback
    pub resume_after_transient_loss: bool,
}

impl Default for FocusPolicy {
    fn default() -> Self {
        Self {
            pause_on_duck: true,
            resume_after_transient_loss: true,
        }
    }
}

/// What the controller should do in response to a focus change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FocusAction {
    /// Pause rendering without abandoning focus
    Suspend,

    /// Resume the rendering a transient loss interrupted
    Resume,

    /// Nothing to do
    Ignore,
}

/// Tracks focus ownership on behalf of the controller
pub(crate) struct FocusClient {
    arbiter: Box<dyn FocusArbiter>,
    policy: FocusPolicy,
    state: FocusState,
    resume_on_gain: bool,
}

impl FocusClient {
    pub(crate) fn new(
        mut arbiter: Box<dyn FocusArbiter>,
        notifier: FocusNotifier,
        policy: FocusPolicy,
    ) -> Self {
        arbiter.set_notifier(notifier);
        Self {
            arbiter,
            policy,
            state: FocusState::None,
            resume_on_gain: false,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Whether the current pause came from a transient loss
    pub fn resume_pending(&self) -> bool {
        self.resume_on_gain
    }

    /// Request focus from the host
    ///
    /// A successful request clears any pending resume: the caller is about
    /// to start playback itself.
    pub fn request(&mut self) -> Result<()> {
        self.state = FocusState::Requested;
        match self.arbiter.request_focus() {
            FocusRequestResult::Granted => {
                self.state = FocusState::Granted;
                self.resume_on_gain = false;
                Ok(())
            }
            FocusRequestResult::Denied => {
                self.state = FocusState::None;
                Err(PlaybackError::FocusDenied)
            }
        }
    }

    /// Give focus back; always reaches the arbiter
    pub fn abandon(&mut self) {
        self.arbiter.abandon_focus();
        self.state = FocusState::None;
        self.resume_on_gain = false;
    }

    /// Update focus bookkeeping and decide how playback should react
    ///
    /// `playing` is whether the engine is rendering when the change arrives.
    pub fn apply(&mut self, change: FocusChange, playing: bool) -> FocusAction {
        match change {
            FocusChange::Gain => {
                self.state = FocusState::Granted;
                let resume = std::mem::take(&mut self.resume_on_gain);
                if resume && self.policy.resume_after_transient_loss {
                    FocusAction::Resume
                } else {
                    FocusAction::Ignore
                }
            }
            FocusChange::Loss => {
                self.state = FocusState::Lost { transient: false };
                self.resume_on_gain = false;
                if playing {
                    FocusAction::Suspend
                } else {
                    FocusAction::Ignore
                }
            }
            FocusChange::LossTransient | FocusChange::LossTransientCanDuck => {
                self.state = FocusState::Lost { transient: true };
                if change == FocusChange::LossTransientCanDuck && !self.policy.pause_on_duck {
                    return FocusAction::Ignore;
                }
                if playing {
                    self.resume_on_gain = true;
                    FocusAction::Suspend
                } else {
                    FocusAction::Ignore
                }
            }
        }
    }
}
