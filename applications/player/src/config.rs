/// Player configuration
use crate::error::{PlayerError, Result};
use carousel_playback::ControllerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is given
const DEFAULT_CONFIG_FILE: &str = "carousel.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub focus: FocusSettings,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    #[serde(default = "default_library_root")]
    pub root: PathBuf,

    #[serde(default)]
    pub follow_links: bool,

    #[serde(default)]
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FocusSettings {
    /// Refuse every focus request, as a host busy with a call would
    #[serde(default)]
    pub deny_requests: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            library: LibrarySettings::default(),
            controller: ControllerConfig::default(),
            focus: FocusSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: default_library_root(),
            follow_links: false,
            max_depth: None,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `carousel.toml` in the
    /// working directory is used when present. `CAROUSEL_`-prefixed
    /// variables override the file, with `__` between nested keys
    /// (e.g. `CAROUSEL_LIBRARY__ROOT`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PlayerError::NotFound(path.display().to_string()));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CAROUSEL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let root = &self.library.root;
        if !root.exists() {
            return Err(PlayerError::NotFound(root.display().to_string()));
        }
        if !root.is_dir() {
            return Err(PlayerError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let speed = self.controller.playback_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlayerError::Config(format!(
                "controller.playback_speed must be positive, got {}",
                speed
            )));
        }

        if self.controller.thread_name.trim().is_empty() {
            return Err(PlayerError::Config(
                "controller.thread_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_library_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_filter() -> String {
    "carousel_playback=info,carousel_player=info".to_string()
}
