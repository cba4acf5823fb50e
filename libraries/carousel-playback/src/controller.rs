//! Playback controller - core orchestration
//!
//! A single worker thread owns the queue, the current index, the playback
//! status and the focus bookkeeping. Client commands, engine notifications
//! and focus changes all arrive as messages on one inbox and are applied
//! one at a time, so every published state is the result of a complete
//! transition.
//!
//! Engine `load`/`prepare` run on the worker without any lock shared with
//! the notification senders: a focus loss arriving mid-load simply waits
//! in the inbox and is applied to the state the load produced.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::{
    catalog::Catalog,
    engine::{EngineAdapter, EngineLifecycle, EngineNotification, PlaybackEngine},
    error::{PlaybackError, Result},
    focus::{FocusAction, FocusArbiter, FocusChange, FocusClient, FocusNotifier, FocusPolicy},
    queue::Queue,
    session::SessionPublisher,
    types::{
        ControllerConfig, Extras, FocusState, PlaybackStateUpdate, PlaybackStatus, QueueItem,
    },
};

/// Messages processed by the controller worker
#[derive(Debug)]
pub(crate) enum Inbox {
    Command(Command),
    Engine {
        generation: u64,
        notification: EngineNotification,
    },
    Focus(FocusChange),
    Snapshot(Sender<PlaybackSnapshot>),
    Flush(Sender<()>),
}

/// Client commands
#[derive(Debug)]
pub(crate) enum Command {
    Play,
    Pause,
    PlayFromId { item_id: String, extras: Extras },
    SkipToNext,
    SkipToPrevious,
    SkipToQueueItem {
        index: usize,
        reply: Sender<Result<()>>,
    },
    Destroy {
        reply: Sender<()>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Next,
    Previous,
}

/// External collaborators driven by the controller
pub struct Collaborators {
    pub engine: Box<dyn PlaybackEngine>,
    pub focus: Box<dyn FocusArbiter>,
    pub catalog: Box<dyn Catalog>,
    pub session: Box<dyn SessionPublisher>,
}

/// Consistent copy of the controller state
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub queue: Option<Vec<QueueItem>>,
    pub current_index: Option<usize>,
    pub focus: FocusState,
    pub session_active: bool,
}

/// Playback state machine
///
/// Lives on its own worker thread; interact with it through the
/// [`PlaybackHandle`] returned by [`PlaybackController::spawn`].
pub struct PlaybackController {
    config: ControllerConfig,
    engine: EngineAdapter,
    focus: FocusClient,
    catalog: Box<dyn Catalog>,
    session: Box<dyn SessionPublisher>,

    queue: Option<Queue>,
    status: PlaybackStatus,
    session_active: bool,
    destroyed: bool,
}

impl PlaybackController {
    /// Start a controller on a dedicated worker thread
    pub fn spawn(config: ControllerConfig, collaborators: Collaborators) -> Result<PlaybackHandle> {
        let (inbox_tx, inbox_rx) = unbounded();
        let policy = FocusPolicy {
            pause_on_duck: config.pause_on_duck,
            resume_after_transient_loss: config.resume_after_transient_loss,
        };

        let controller = Self {
            engine: EngineAdapter::new(collaborators.engine, inbox_tx.clone()),
            focus: FocusClient::new(
                collaborators.focus,
                FocusNotifier::new(inbox_tx.clone()),
                policy,
            ),
            catalog: collaborators.catalog,
            session: collaborators.session,
            queue: None,
            status: PlaybackStatus::Stopped,
            session_active: false,
            destroyed: false,
            config: config.clone(),
        };

        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || controller.run(&inbox_rx))?;

        info!(thread = %config.thread_name, "Playback controller started");
        Ok(PlaybackHandle::new(inbox_tx, worker))
    }

    fn run(mut self, inbox: &Receiver<Inbox>) {
        while let Ok(message) = inbox.recv() {
            match message {
                Inbox::Command(command) => self.handle_command(command),
                Inbox::Engine {
                    generation,
                    notification,
                } => self.handle_engine_notification(generation, notification),
                Inbox::Focus(change) => self.handle_focus_change(change),
                Inbox::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
                Inbox::Flush(reply) => {
                    let _ = reply.send(());
                }
            }

            if self.destroyed {
                break;
            }
        }

        self.destroy();
        debug!("Playback controller worker exiting");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Play => self.handle_play(),
            Command::Pause => self.handle_pause(),
            Command::PlayFromId { item_id, extras } => self.handle_play_from_id(item_id, &extras),
            Command::SkipToNext => self.skip(Direction::Next),
            Command::SkipToPrevious => self.skip(Direction::Previous),
            Command::SkipToQueueItem { index, reply } => {
                self.handle_skip_to_queue_item(index, &reply);
            }
            Command::Destroy { reply } => {
                self.destroy();
                let _ = reply.send(());
            }
        }
    }

    // ===== Commands =====

    fn handle_play(&mut self) {
        debug!("Play");
        if let Err(e) = self.focus.request() {
            warn!(error = %e, "Failed to acquire audio focus");
            return;
        }

        if self.engine.is_loaded() {
            self.resume();
            return;
        }

        match self.queue.as_ref().map(Queue::current_index) {
            Some(index) => {
                info!(index, "Nothing loaded, loading current queue item");
                self.play_current();
            }
            None => {
                warn!("Play requested with no queue loaded");
                self.focus.abandon();
            }
        }
    }

    fn handle_pause(&mut self) {
        debug!("Pause");
        self.suspend();
        self.focus.abandon();
    }

    fn handle_play_from_id(&mut self, item_id: String, extras: &Extras) {
        debug!(item_id = %item_id, extras = ?extras, "Play from id");
        if let Err(e) = self.focus.request() {
            warn!(item_id = %item_id, error = %e, "Failed to acquire audio focus");
            return;
        }

        let items = self.catalog.queue();
        let queue = match Queue::position_of(&items, &item_id) {
            Some(index) => Queue::starting_at(items, index),
            None => Err(PlaybackError::ItemNotFound(item_id)),
        };

        match queue {
            Ok(queue) => {
                self.session.set_queue_title(&self.config.queue_title);
                self.session.set_queue(queue.items());
                self.queue = Some(queue);
                self.play_current();
            }
            Err(e) => self.fail(e),
        }
    }

    fn skip(&mut self, direction: Direction) {
        debug!(?direction, "Skip");
        let Some(queue) = self.queue.as_mut() else {
            debug!("No queue loaded, stopping");
            self.stop_playback();
            return;
        };

        let index = match direction {
            Direction::Next => queue.advance(),
            Direction::Previous => queue.retreat(),
        };
        debug!(index, "Queue cursor moved");
        self.play_current();
    }

    fn handle_skip_to_queue_item(&mut self, index: usize, reply: &Sender<Result<()>>) {
        debug!(index, "Skip to queue item");
        let target = match self.queue.as_ref() {
            Some(queue) => queue.get(index).cloned().ok_or(PlaybackError::InvalidIndex {
                index,
                len: queue.len(),
            }),
            None => Err(PlaybackError::NoQueue),
        };

        let item = match target {
            Ok(item) => {
                let _ = reply.send(Ok(()));
                item
            }
            Err(e) => {
                warn!(index, error = %e, "Rejected queue jump");
                let _ = reply.send(Err(e));
                return;
            }
        };

        // The cursor only moves once the target is actually playing.
        match self.load_and_start(&item) {
            Ok(()) => {
                if let Some(queue) = self.queue.as_mut() {
                    queue.set_current(index).ok();
                }
                self.publish_playing();
            }
            Err(e) => self.fail(e),
        }
    }

    // ===== Notifications =====

    fn handle_engine_notification(&mut self, generation: u64, notification: EngineNotification) {
        if generation != self.engine.generation() {
            debug!(
                generation,
                current = self.engine.generation(),
                ?notification,
                "Ignoring stale engine notification"
            );
            return;
        }

        match notification {
            EngineNotification::Completed => {
                let rendering = self.engine.lifecycle() == EngineLifecycle::Started;
                self.engine.mark_completed();
                if rendering {
                    debug!("Item completed");
                    self.skip(Direction::Next);
                } else {
                    // Pause won the race; the next Play advances.
                    debug!("Item completed while paused");
                }
            }
            EngineNotification::Error(kind) => {
                self.engine.mark_failed();
                self.fail(PlaybackError::Runtime(kind));
            }
        }
    }

    fn handle_focus_change(&mut self, change: FocusChange) {
        let action = self.focus.apply(change, self.engine.is_playing());
        debug!(?change, ?action, "Audio focus changed");

        match action {
            FocusAction::Suspend => self.suspend(),
            FocusAction::Resume => {
                if self.engine.is_loaded() {
                    self.resume();
                }
            }
            FocusAction::Ignore => {}
        }
    }

    // ===== Transitions =====

    /// Load sequence for the current queue item; failures become `Error`
    fn play_current(&mut self) {
        let Some(item) = self.queue.as_ref().map(|queue| queue.current().clone()) else {
            self.stop_playback();
            return;
        };

        match self.load_and_start(&item) {
            Ok(()) => self.publish_playing(),
            Err(e) => self.fail(e),
        }
    }

    /// reset -> load -> prepare -> start -> metadata
    fn load_and_start(&mut self, item: &QueueItem) -> Result<()> {
        debug!(item_id = %item.id, locator = %item.locator, "Loading item");
        let metadata = self.catalog.metadata(&item.id);

        self.engine.reset()?;
        self.engine.load(&item.locator)?;
        self.engine.prepare()?;
        self.engine.start()?;

        self.activate_session();
        if let Some(metadata) = metadata {
            self.session.set_metadata(&metadata);
        }
        info!(item_id = %item.id, title = %item.description.title, "Playing");
        Ok(())
    }

    fn resume(&mut self) {
        if self.engine.lifecycle() == EngineLifecycle::Completed {
            self.skip(Direction::Next);
            return;
        }
        if !self.engine.is_playing() {
            if let Err(e) = self.engine.start() {
                self.fail(e.into());
                return;
            }
        }
        self.activate_session();
        self.publish_playing();
    }

    /// Pause rendering and publish `Paused` without touching focus
    fn suspend(&mut self) {
        // Started also covers an engine that drained but whose completion
        // is still queued.
        if self.engine.lifecycle() == EngineLifecycle::Started {
            if let Err(e) = self.engine.pause() {
                warn!(error = %e, "Engine refused to pause");
            }
        }
        let position = if self.engine.is_loaded() {
            self.engine.current_position()
        } else {
            match self.status {
                PlaybackStatus::Paused { position } => position,
                _ => Duration::ZERO,
            }
        };
        self.publish(PlaybackStatus::Paused { position });
    }

    fn stop_playback(&mut self) {
        if let Err(e) = self.engine.stop() {
            warn!(error = %e, "Engine refused to stop");
        }
        self.publish(PlaybackStatus::Stopped);
    }

    fn fail(&mut self, error: PlaybackError) {
        error!(
            error = %error,
            index = ?self.queue.as_ref().map(Queue::current_index),
            "Playback failed"
        );
        self.publish(PlaybackStatus::Error {
            message: error.to_string(),
        });
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        info!("Destroying playback controller");

        self.stop_playback();
        self.focus.abandon();
        self.engine.release();
        if self.session_active {
            self.session.set_session_active(false);
            self.session_active = false;
        }
        self.queue = None;
        self.destroyed = true;
    }

    // ===== Publication =====

    fn activate_session(&mut self) {
        if !self.session_active {
            self.session.set_session_active(true);
            self.session_active = true;
        }
    }

    fn publish_playing(&mut self) {
        let position = self.engine.current_position();
        self.publish(PlaybackStatus::Playing {
            position,
            started_at: Instant::now(),
        });
    }

    fn publish(&mut self, status: PlaybackStatus) {
        let speed = if status.is_playing() {
            self.config.playback_speed
        } else {
            0.0
        };
        let update = PlaybackStateUpdate {
            position: status.position(),
            speed,
            actions: status.allowed_actions(),
            active_queue_index: self.queue.as_ref().map(Queue::current_index),
            status,
        };
        self.session.set_playback_state(&update);
        self.status = update.status;
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status.clone(),
            queue: self.queue.as_ref().map(|queue| queue.items().to_vec()),
            current_index: self.queue.as_ref().map(Queue::current_index),
            focus: self.focus.state(),
            session_active: self.session_active,
        }
    }
}

struct Shared {
    inbox: Sender<Inbox>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return;
        };

        let (reply, done) = bounded(1);
        let sent = self
            .inbox
            .send(Inbox::Command(Command::Destroy { reply }))
            .is_ok();

        // A collaborator tearing the controller down from inside a callback
        // runs on the worker itself; it exits once that callback returns.
        if worker.thread().id() == thread::current().id() {
            return;
        }

        if sent {
            let _ = done.recv();
        }
        if worker.join().is_err() {
            error!("Playback controller worker panicked");
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Cloneable handle to a running [`PlaybackController`]
///
/// Commands are queued and applied in order; most methods return as soon
/// as the command is queued. Dropping the last handle destroys the
/// controller.
#[derive(Clone)]
pub struct PlaybackHandle {
    shared: Arc<Shared>,
}

impl PlaybackHandle {
    fn new(inbox: Sender<Inbox>, worker: JoinHandle<()>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inbox,
                worker: Mutex::new(Some(worker)),
            }),
        }
    }

    /// Start or resume playback
    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    /// Pause playback and give up audio focus
    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    /// Load the catalog queue and play the first item with id `item_id`
    pub fn play_from_id(&self, item_id: impl Into<String>, extras: Extras) -> Result<()> {
        self.send(Command::PlayFromId {
            item_id: item_id.into(),
            extras,
        })
    }

    pub fn skip_to_next(&self) -> Result<()> {
        self.send(Command::SkipToNext)
    }

    pub fn skip_to_previous(&self) -> Result<()> {
        self.send(Command::SkipToPrevious)
    }

    /// Jump to `index` in the current queue
    ///
    /// Blocks until the controller has validated the index and returns
    /// `InvalidIndex` (or `NoQueue`) without touching playback when it is
    /// out of range. Loading the target happens afterwards; load failures
    /// are published as `Error` status. Must not be called from a
    /// collaborator callback.
    pub fn skip_to_queue_item(&self, index: usize) -> Result<()> {
        let (reply, response) = bounded(1);
        self.send(Command::SkipToQueueItem { index, reply })?;
        response.recv().map_err(|_| PlaybackError::ControllerClosed)?
    }

    /// Stop playback, abandon focus and release the engine
    ///
    /// Blocks until the worker has finished. Calling it again is a no-op.
    pub fn destroy(&self) {
        self.shared.shutdown();
    }

    /// Current controller state, taken after all queued messages
    pub fn snapshot(&self) -> Result<PlaybackSnapshot> {
        let (reply, response) = bounded(1);
        self.post(Inbox::Snapshot(reply))?;
        response.recv().map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Wait until every message queued so far has been processed
    pub fn flush(&self) -> Result<()> {
        let (reply, response) = bounded(1);
        self.post(Inbox::Flush(reply))?;
        response.recv().map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Notifier for delivering host focus changes from outside the arbiter
    pub fn focus_notifier(&self) -> FocusNotifier {
        FocusNotifier::new(self.shared.inbox.clone())
    }

    /// Whether `destroy` has run
    pub fn is_closed(&self) -> bool {
        self.shared
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.post(Inbox::Command(command))
    }

    fn post(&self, message: Inbox) -> Result<()> {
        self.shared
            .inbox
            .send(message)
            .map_err(|_| PlaybackError::ControllerClosed)
    }
}
