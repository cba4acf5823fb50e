//! Symphonia-backed playback engine
//!
//! `load` opens the file and `prepare` probes the container and builds the
//! codec, so unreadable and undecodable files fail the same way they would
//! for a real output path. Rendering is driven by a wall-clock timer that
//! reports completion once the stream's duration has elapsed; no samples
//! reach an output device.

use carousel_playback::{EngineError, EngineNotifier, EngineResult, PlaybackEngine};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Length assumed for streams that do not declare a frame count
const UNKNOWN_DURATION: Duration = Duration::from_secs(180);

/// Accumulated render time across pause/resume cycles
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderClock {
    elapsed: Duration,
    resumed_at: Option<Instant>,
}

impl RenderClock {
    pub fn position(&self) -> Duration {
        self.elapsed + self.resumed_at.map_or(Duration::ZERO, |at| at.elapsed())
    }

    pub fn is_running(&self) -> bool {
        self.resumed_at.is_some()
    }

    pub fn resume(&mut self) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if let Some(at) = self.resumed_at.take() {
            self.elapsed += at.elapsed();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One-shot timer thread; dropping it cancels the callback
pub struct RenderTimer {
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl RenderTimer {
    /// Run `on_elapsed` after `after` unless cancelled first
    pub fn spawn(after: Duration, on_elapsed: impl FnOnce() + Send + 'static) -> io::Result<Self> {
        let (cancel, cancelled) = bounded::<()>(1);
        let worker = thread::Builder::new()
            .name("carousel-render-timer".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(after) {
                    on_elapsed();
                }
            })?;

        Ok(Self {
            cancel: Some(cancel),
            worker: Some(worker),
        })
    }
}

impl Drop for RenderTimer {
    fn drop(&mut self) {
        // Disconnecting wakes the timer thread
        drop(self.cancel.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("Render timer thread panicked");
            }
        }
    }
}

/// Engine for files on the local filesystem
#[derive(Default)]
pub struct SymphoniaEngine {
    /// Opened by `load`, consumed by `prepare`
    source: Option<(PathBuf, File)>,

    /// Set once `prepare` succeeded
    duration: Option<Duration>,

    clock: RenderClock,
    timer: Option<RenderTimer>,
    notifier: Option<EngineNotifier>,
}

impl SymphoniaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration of the prepared stream
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn probe(path: &Path, file: File) -> EngineResult<Duration> {
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| EngineError::Decode(format!("{}: {}", path.display(), e)))?;

        let format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| EngineError::Decode(format!("{}: no audio tracks", path.display())))?;

        symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::Decode(format!("{}: {}", path.display(), e)))?;

        let duration = stream_duration(track.codec_params.n_frames, track.codec_params.sample_rate);

        Ok(duration.unwrap_or_else(|| {
            tracing::debug!(path = %path.display(), "Stream length unknown, assuming default");
            UNKNOWN_DURATION
        }))
    }

    fn cancel_timer(&mut self) {
        self.timer = None;
    }
}

impl PlaybackEngine for SymphoniaEngine {
    fn reset(&mut self) -> EngineResult<()> {
        self.cancel_timer();
        self.source = None;
        self.duration = None;
        self.clock.reset();
        Ok(())
    }

    fn load(&mut self, locator: &str) -> EngineResult<()> {
        let path = PathBuf::from(locator);
        if !path.exists() {
            return Err(EngineError::Resource(format!(
                "file not found: {}",
                path.display()
            )));
        }

        let file = File::open(&path)
            .map_err(|e| EngineError::Resource(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "Opened");
        self.source = Some((path, file));
        Ok(())
    }

    fn prepare(&mut self) -> EngineResult<()> {
        let (path, file) = self
            .source
            .take()
            .ok_or_else(|| EngineError::InvalidState("nothing loaded".to_string()))?;

        let duration = Self::probe(&path, file)?;
        tracing::debug!(path = %path.display(), ?duration, "Prepared");
        self.duration = Some(duration);
        Ok(())
    }

    fn start(&mut self) -> EngineResult<()> {
        let duration = self
            .duration
            .ok_or_else(|| EngineError::InvalidState("not prepared".to_string()))?;

        if self.timer.is_some() {
            return Ok(());
        }

        let remaining = duration.saturating_sub(self.clock.position());
        let notifier = self.notifier.clone();
        let timer = RenderTimer::spawn(remaining, move || {
            if let Some(notifier) = notifier {
                notifier.completed();
            }
        })
        .map_err(|e| EngineError::InvalidState(format!("render timer: {}", e)))?;

        self.clock.resume();
        self.timer = Some(timer);
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        self.cancel_timer();
        self.clock.pause();
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.cancel_timer();
        self.clock.reset();
        Ok(())
    }

    fn current_position(&self) -> Duration {
        match self.duration {
            Some(duration) => self.clock.position().min(duration),
            None => Duration::ZERO,
        }
    }

    fn is_playing(&self) -> bool {
        match self.duration {
            Some(duration) => self.timer.is_some() && self.clock.position() < duration,
            None => false,
        }
    }

    fn release(&mut self) {
        self.cancel_timer();
        self.source = None;
        self.duration = None;
        self.clock.reset();
        self.notifier = None;
    }

    fn set_notifier(&mut self, notifier: EngineNotifier) {
        self.notifier = Some(notifier);
    }
}

/// Length of a stream of `n_frames` at `sample_rate`
///
/// A missing rate falls back to 44.1kHz; a zero rate means the length is unknown.
fn stream_duration(n_frames: Option<u64>, sample_rate: Option<u32>) -> Option<Duration> {
    let sample_rate = match sample_rate {
        Some(0) => return None,
        Some(rate) => rate,
        None => 44100,
    };
    n_frames.map(|n_frames| Duration::from_secs_f64(n_frames as f64 / f64::from(sample_rate)))
}
