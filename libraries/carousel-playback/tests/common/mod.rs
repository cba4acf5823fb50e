//! Shared test fixtures: recording engine and focus fakes plus a harness
//! that spawns a controller over them.

#![allow(dead_code)]

use carousel_playback::{
    ChannelPublisher, Collaborators, ControllerConfig, EngineError, EngineErrorKind,
    EngineNotifier, EngineResult, FocusArbiter, FocusChange, FocusNotifier, FocusRequestResult,
    InMemoryCatalog, PlaybackController, PlaybackEngine, PlaybackHandle, PlaybackSnapshot,
    PlaybackStateUpdate, QueueItem, SessionUpdate,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// ENGINE FAKE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Reset,
    Load(String),
    Prepare,
    Start,
    Pause,
    Stop,
    Release,
}

#[derive(Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    loaded: Option<String>,
    playing: bool,
    position: Duration,
    failing_loads: HashSet<String>,
    failing_prepares: HashSet<String>,
    notifier: Option<EngineNotifier>,
    load_gate: Option<LoadGate>,
}

/// Blocks `load` until the test lets it through
#[derive(Clone)]
struct LoadGate {
    entered: Sender<()>,
    release: Receiver<()>,
}

/// Engine that records every call; clones share state
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `load` fail for this locator
    pub fn fail_load(&self, locator: &str) {
        self.state().failing_loads.insert(locator.to_string());
    }

    /// Make `prepare` fail after loading this locator
    pub fn fail_prepare(&self, locator: &str) {
        self.state().failing_prepares.insert(locator.to_string());
    }

    /// Clear every injected failure
    pub fn heal(&self) {
        let mut state = self.state();
        state.failing_loads.clear();
        state.failing_prepares.clear();
    }

    pub fn set_position(&self, position: Duration) {
        self.state().position = position;
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.state().calls.iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn loaded(&self) -> Option<String> {
        self.state().loaded.clone()
    }

    pub fn is_rendering(&self) -> bool {
        self.state().playing
    }

    /// Notifier installed for the most recent load
    pub fn notifier(&self) -> Option<EngineNotifier> {
        self.state().notifier.clone()
    }

    /// Make every `load` signal `entered`, then wait for a message on `release`
    pub fn gate_loads(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered) = unbounded();
        let (release, release_rx) = unbounded();
        self.state().load_gate = Some(LoadGate {
            entered: entered_tx,
            release: release_rx,
        });
        (entered, release)
    }

    /// Stop rendering at the end of the item without reporting it yet
    ///
    /// Returns the notifier the completion would be sent through.
    pub fn drain_item(&self) -> EngineNotifier {
        let notifier = self.notifier().expect("no item loaded");
        self.state().playing = false;
        notifier
    }

    /// Report that the loaded item played to its end
    pub fn complete(&self) -> bool {
        let notifier = self.notifier().expect("no item loaded");
        self.state().playing = false;
        notifier.completed()
    }

    /// Report a runtime rendering failure
    pub fn fail_runtime(&self, kind: EngineErrorKind) -> bool {
        let notifier = self.notifier().expect("no item loaded");
        self.state().playing = false;
        notifier.error(kind)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, EngineState> {
        self.state.lock().unwrap()
    }
}

impl PlaybackEngine for FakeEngine {
    fn reset(&mut self) -> EngineResult<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Reset);
        state.loaded = None;
        state.playing = false;
        state.position = Duration::ZERO;
        Ok(())
    }

    fn load(&mut self, locator: &str) -> EngineResult<()> {
        let gate = self.state().load_gate.clone();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv();
        }

        let mut state = self.state();
        state.calls.push(EngineCall::Load(locator.to_string()));
        if state.failing_loads.contains(locator) {
            return Err(EngineError::Resource(format!("cannot open {}", locator)));
        }
        state.loaded = Some(locator.to_string());
        Ok(())
    }

    fn prepare(&mut self) -> EngineResult<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Prepare);
        let failing = state
            .loaded
            .as_ref()
            .is_some_and(|locator| state.failing_prepares.contains(locator));
        if failing {
            return Err(EngineError::Decode("unsupported stream".to_string()));
        }
        Ok(())
    }

    fn start(&mut self) -> EngineResult<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Start);
        state.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Pause);
        state.playing = false;
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        let mut state = self.state();
        state.calls.push(EngineCall::Stop);
        state.playing = false;
        Ok(())
    }

    fn current_position(&self) -> Duration {
        self.state().position
    }

    fn is_playing(&self) -> bool {
        self.state().playing
    }

    fn release(&mut self) {
        let mut state = self.state();
        state.calls.push(EngineCall::Release);
        state.playing = false;
        state.loaded = None;
    }

    fn set_notifier(&mut self, notifier: EngineNotifier) {
        self.state().notifier = Some(notifier);
    }
}

// ============================================================================
// FOCUS FAKE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusCall {
    Request,
    Abandon,
}

struct FocusLog {
    calls: Vec<FocusCall>,
    grant: bool,
    notifier: Option<FocusNotifier>,
}

/// Focus arbiter that grants by default and records every call
#[derive(Clone)]
pub struct FakeFocus {
    state: Arc<Mutex<FocusLog>>,
}

impl Default for FakeFocus {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FocusLog {
                calls: Vec::new(),
                grant: true,
                notifier: None,
            })),
        }
    }
}

impl FakeFocus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(&self) {
        self.state.lock().unwrap().grant = false;
    }

    pub fn grant(&self) {
        self.state.lock().unwrap().grant = true;
    }

    pub fn calls(&self) -> Vec<FocusCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: FocusCall) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    /// Push a host focus change to the controller
    pub fn notify(&self, change: FocusChange) -> bool {
        let notifier = self
            .state
            .lock()
            .unwrap()
            .notifier
            .clone()
            .expect("notifier installed at spawn");
        notifier.notify(change)
    }
}

impl FocusArbiter for FakeFocus {
    fn request_focus(&mut self) -> FocusRequestResult {
        let mut state = self.state.lock().unwrap();
        state.calls.push(FocusCall::Request);
        if state.grant {
            FocusRequestResult::Granted
        } else {
            FocusRequestResult::Denied
        }
    }

    fn abandon_focus(&mut self) {
        self.state.lock().unwrap().calls.push(FocusCall::Abandon);
    }

    fn set_notifier(&mut self, notifier: FocusNotifier) {
        self.state.lock().unwrap().notifier = Some(notifier);
    }
}

// ============================================================================
// HARNESS
// ============================================================================

pub fn create_test_items() -> Vec<QueueItem> {
    ["a", "b", "c"]
        .iter()
        .map(|id| {
            QueueItem::new(*id, format!("/music/{}.mp3", id), format!("Track {}", id))
                .with_artist("Test Artist")
                .with_duration(Duration::from_secs(180))
        })
        .collect()
}

pub struct Harness {
    pub handle: PlaybackHandle,
    pub engine: FakeEngine,
    pub focus: FakeFocus,
    pub updates: Receiver<SessionUpdate>,
}

impl Harness {
    pub fn spawn() -> Self {
        Self::spawn_with(
            ControllerConfig::default(),
            InMemoryCatalog::new(create_test_items()),
        )
    }

    pub fn spawn_with(config: ControllerConfig, catalog: InMemoryCatalog) -> Self {
        let engine = FakeEngine::new();
        let focus = FakeFocus::new();
        let (session, updates) = ChannelPublisher::new();

        let handle = PlaybackController::spawn(
            config,
            Collaborators {
                engine: Box::new(engine.clone()),
                focus: Box::new(focus.clone()),
                catalog: Box::new(catalog),
                session: Box::new(session),
            },
        )
        .unwrap();

        Self {
            handle,
            engine,
            focus,
            updates,
        }
    }

    /// Wait until every queued command and notification has been applied
    pub fn settle(&self) {
        self.handle.flush().unwrap();
    }

    /// Settle, then take every publication made so far
    pub fn drain(&self) -> Vec<SessionUpdate> {
        self.settle();
        self.updates.try_iter().collect()
    }

    /// Settle, then take the playback state publications made so far
    pub fn states(&self) -> Vec<PlaybackStateUpdate> {
        self.drain()
            .into_iter()
            .filter_map(|update| match update {
                SessionUpdate::PlaybackState(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    /// Most recent playback state publication
    pub fn last_state(&self) -> PlaybackStateUpdate {
        self.states()
            .pop()
            .expect("at least one playback state publication")
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.handle.snapshot().unwrap()
    }
}
