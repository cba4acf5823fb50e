//! Carousel Player - console media player
//!
//! Wires the `carousel-playback` controller to a scanned music directory,
//! a Symphonia-backed engine and a terminal transport.

pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod focus;
pub mod library;

pub use config::PlayerConfig;
pub use engine::SymphoniaEngine;
pub use error::{PlayerError, Result};
pub use focus::HostFocus;
pub use library::LibraryScanner;
