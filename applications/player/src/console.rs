//! Console transport
//!
//! Reads transport commands from stdin and prints every session update the
//! controller publishes.

use crate::error::{PlayerError, Result};
use carousel_playback::{
    Extras, FocusChange, PlaybackHandle, PlaybackStatus, QueueItem, SessionUpdate,
};
use crossbeam_channel::Receiver;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const HELP: &str = "\
commands:
  play | pause | next | prev
  jump N       play queue item N
  id ITEM      play catalog item ITEM
  list         show the catalog
  status       show controller state
  duck | loss | transient | gain   simulate focus changes
  help         show this text
  quit";

/// Parsed console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Play,
    Pause,
    Next,
    Previous,
    Jump(usize),
    PlayId(String),
    List,
    Status,
    Focus(FocusChange),
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = PlayerError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "play" => ConsoleCommand::Play,
            "pause" => ConsoleCommand::Pause,
            "next" => ConsoleCommand::Next,
            "prev" | "previous" => ConsoleCommand::Previous,
            "jump" => {
                let index = rest.parse().map_err(|_| {
                    PlayerError::InvalidCommand(format!("jump expects an index, got {:?}", rest))
                })?;
                ConsoleCommand::Jump(index)
            }
            "id" => {
                if rest.is_empty() {
                    return Err(PlayerError::InvalidCommand("id expects an item id".to_string()));
                }
                ConsoleCommand::PlayId(rest.to_string())
            }
            "list" | "ls" => ConsoleCommand::List,
            "status" => ConsoleCommand::Status,
            "duck" => ConsoleCommand::Focus(FocusChange::LossTransientCanDuck),
            "loss" => ConsoleCommand::Focus(FocusChange::Loss),
            "transient" => ConsoleCommand::Focus(FocusChange::LossTransient),
            "gain" => ConsoleCommand::Focus(FocusChange::Gain),
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => return Err(PlayerError::InvalidCommand(other.to_string())),
        };

        Ok(command)
    }
}

/// Apply one command; returns false when the console should exit
pub fn execute<W: Write>(
    handle: &PlaybackHandle,
    catalog: &[QueueItem],
    command: &ConsoleCommand,
    out: &mut W,
) -> Result<bool> {
    match command {
        ConsoleCommand::Play => handle.play()?,
        ConsoleCommand::Pause => handle.pause()?,
        ConsoleCommand::Next => handle.skip_to_next()?,
        ConsoleCommand::Previous => handle.skip_to_previous()?,
        ConsoleCommand::Jump(index) => {
            if let Err(e) = handle.skip_to_queue_item(*index) {
                writeln!(out, "error: {}", e)?;
            }
        }
        ConsoleCommand::PlayId(item_id) => handle.play_from_id(item_id.clone(), Extras::new())?,
        ConsoleCommand::List => {
            for (index, item) in catalog.iter().enumerate() {
                writeln!(out, "{:>3}  {}", index, describe(item))?;
            }
        }
        ConsoleCommand::Status => {
            let snapshot = handle.snapshot()?;
            writeln!(out, "status:  {}", format_status(&snapshot.status))?;
            writeln!(out, "focus:   {:?}", snapshot.focus)?;
            match (snapshot.queue, snapshot.current_index) {
                (Some(queue), Some(index)) => {
                    writeln!(out, "queue:   {} items, at {}", queue.len(), index)?;
                }
                _ => writeln!(out, "queue:   none")?,
            }
        }
        ConsoleCommand::Focus(change) => {
            handle.focus_notifier().notify(*change);
        }
        ConsoleCommand::Help => writeln!(out, "{}", HELP)?,
        ConsoleCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Read commands until `quit` or end of input
pub fn run<R: BufRead, W: Write>(
    handle: &PlaybackHandle,
    catalog: &[QueueItem],
    input: R,
    out: &mut W,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{} (try `help`)", e)?;
                continue;
            }
        };

        tracing::debug!(?command, "Console command");
        if !execute(handle, catalog, &command, out)? {
            break;
        }
        out.flush()?;
    }
    Ok(())
}

/// Print session updates on a background thread until the controller exits
pub fn spawn_printer(updates: Receiver<SessionUpdate>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("carousel-console".to_string())
        .spawn(move || {
            for update in updates {
                println!("{}", format_update(&update));
            }
        })
}

pub fn format_update(update: &SessionUpdate) -> String {
    match update {
        SessionUpdate::PlaybackState(state) => match state.active_queue_index {
            Some(index) => format!("[state] {} (item {})", format_status(&state.status), index),
            None => format!("[state] {}", format_status(&state.status)),
        },
        SessionUpdate::Queue(items) => format!("[queue] {} items", items.len()),
        SessionUpdate::QueueTitle(title) => format!("[queue] {}", title),
        SessionUpdate::Metadata(metadata) => match &metadata.artist {
            Some(artist) => format!("[now playing] {} - {}", metadata.title, artist),
            None => format!("[now playing] {}", metadata.title),
        },
        SessionUpdate::SessionActive(true) => "[session] active".to_string(),
        SessionUpdate::SessionActive(false) => "[session] inactive".to_string(),
    }
}

pub fn format_status(status: &PlaybackStatus) -> String {
    match status {
        PlaybackStatus::Stopped => "stopped".to_string(),
        PlaybackStatus::Paused { position } => format!("paused at {}", format_duration(*position)),
        PlaybackStatus::Playing { position, .. } => {
            format!("playing from {}", format_duration(*position))
        }
        PlaybackStatus::Error { message } => format!("error: {}", message),
    }
}

/// Format as m:ss
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn describe(item: &QueueItem) -> String {
    match &item.description.artist {
        Some(artist) => format!("{}  ({} - {})", item.id, item.description.title, artist),
        None => format!("{}  ({})", item.id, item.description.title),
    }
}
