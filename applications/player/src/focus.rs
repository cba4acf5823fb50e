//! Host audio focus for the console player
//!
//! There is no system arbiter on a terminal, so focus is granted unless the
//! player was started with requests denied. Focus changes are injected from
//! the console through the controller's [`FocusNotifier`].

use carousel_playback::{FocusArbiter, FocusNotifier, FocusRequestResult};

#[derive(Debug, Default)]
pub struct HostFocus {
    deny_requests: bool,
    held: bool,
    notifier: Option<FocusNotifier>,
}

impl HostFocus {
    pub fn new(deny_requests: bool) -> Self {
        Self {
            deny_requests,
            ..Self::default()
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Notifier installed by the controller
    pub fn notifier(&self) -> Option<&FocusNotifier> {
        self.notifier.as_ref()
    }
}

impl FocusArbiter for HostFocus {
    fn request_focus(&mut self) -> FocusRequestResult {
        if self.deny_requests {
            tracing::info!("Focus request denied by host");
            return FocusRequestResult::Denied;
        }
        if !self.held {
            tracing::debug!("Focus granted");
        }
        self.held = true;
        FocusRequestResult::Granted
    }

    fn abandon_focus(&mut self) {
        if self.held {
            tracing::debug!("Focus abandoned");
        }
        self.held = false;
    }

    fn set_notifier(&mut self, notifier: FocusNotifier) {
        self.notifier = Some(notifier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grants_by_default() {
        let mut focus = HostFocus::new(false);
        assert_eq!(focus.request_focus(), FocusRequestResult::Granted);
        assert!(focus.is_held());

        focus.abandon_focus();
        assert!(!focus.is_held());

        // Abandoning without focus is harmless
        focus.abandon_focus();
        assert!(!focus.is_held());
    }

    #[test]
    fn test_deny_requests() {
        let mut focus = HostFocus::new(true);
        assert_eq!(focus.request_focus(), FocusRequestResult::Denied);
        assert!(!focus.is_held());
        assert!(focus.notifier().is_none());
    }
}
