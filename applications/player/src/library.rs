//! Music library scanning
//!
//! Walks a directory tree for audio files and turns them into the
//! playback catalog. Item ids are paths relative to the library root, so
//! they stay stable across runs.

use crate::config::LibrarySettings;
use crate::error::{PlayerError, Result};
use carousel_playback::{InMemoryCatalog, QueueItem};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported audio file extensions
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "aac", "m4a", "opus"];

/// Scanner for audio files in directories
#[derive(Debug, Clone, Default)]
pub struct LibraryScanner {
    /// Whether to follow symbolic links
    follow_links: bool,

    /// Maximum depth to traverse (unlimited when `None`)
    max_depth: Option<usize>,
}

impl LibraryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &LibrarySettings) -> Self {
        let scanner = Self::new().follow_links(settings.follow_links);
        match settings.max_depth {
            Some(depth) => scanner.max_depth(depth),
            None => scanner,
        }
    }

    /// Set whether to follow symbolic links
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Set maximum directory depth to traverse
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Audio files under `root`, sorted by path
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(PlayerError::NotFound(root.display().to_string()));
        }

        if !root.is_dir() {
            return Err(PlayerError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut walker = WalkDir::new(root).follow_links(self.follow_links);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable library entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();

        files.sort();
        Ok(files)
    }

    /// Scan `root` and build the catalog the controller plays from
    pub fn catalog(&self, root: &Path) -> Result<InMemoryCatalog> {
        let items: Vec<QueueItem> = self
            .scan(root)?
            .iter()
            .map(|path| queue_item(root, path))
            .collect();

        tracing::info!(root = %root.display(), items = items.len(), "Library scanned");
        Ok(InMemoryCatalog::new(items))
    }
}

/// Check if a file is a supported audio file
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn queue_item(root: &Path, path: &Path) -> QueueItem {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let id = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let title = path
        .file_stem()
        .map_or_else(|| id.clone(), |stem| stem.to_string_lossy().into_owned());

    let item = QueueItem::new(id, path.display().to_string(), title);

    // Artist from the enclosing folder, unless the file sits at the root
    match relative
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
    {
        Some(artist) => item.with_artist(artist),
        None => item,
    }
}
