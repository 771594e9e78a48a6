//! Application settings and configuration management

use crate::audio::output::OutputSpec;
use crate::audio::producer::ProducerOptions;
use crate::audio::session::SessionOptions;
use crate::events::{SoundEvent, SoundLibrary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Directory event assets resolve against
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// ALSA device to use for playback, or "null" to discard output
    #[serde(default = "default_output_device")]
    pub output_device: String,
    /// Frames per device callback
    #[serde(default = "default_period_frames")]
    pub period_frames: usize,
    /// Delay between push attempts while the ring is full
    #[serde(default = "default_push_retry_ms")]
    pub push_retry_ms: u64,
    /// Poll interval while waiting for the ring to drain
    #[serde(default = "default_drain_poll_ms")]
    pub drain_poll_ms: u64,
    /// Longest wait without consumer progress before a session is aborted
    #[serde(default = "default_stall_timeout_ms")]
    pub stall_timeout_ms: u64,
    /// Per-event asset overrides
    #[serde(default)]
    pub sounds: BTreeMap<SoundEvent, PathBuf>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("srbeep")
        .join("sounds")
}

fn default_output_device() -> String {
    "default".to_string()
}

fn default_period_frames() -> usize {
    crate::audio::output::DEFAULT_PERIOD_FRAMES
}

fn default_push_retry_ms() -> u64 {
    30
}

fn default_drain_poll_ms() -> u64 {
    100
}

fn default_stall_timeout_ms() -> u64 {
    10_000
}

/// Error types for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    ParseError(String),
    ValidationError(String),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::ParseError(s) => write!(f, "Parse error: {}", s),
            ConfigError::ValidationError(s) => write!(f, "Validation error: {}", s),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_dir: default_data_dir(),
            output_device: default_output_device(),
            period_frames: default_period_frames(),
            push_retry_ms: default_push_retry_ms(),
            drain_poll_ms: default_drain_poll_ms(),
            stall_timeout_ms: default_stall_timeout_ms(),
            sounds: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("srbeep").join("config.json")
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_device.trim().is_empty() {
            return Err(ConfigError::ValidationError("Output device cannot be empty".to_string()));
        }
        if self.period_frames == 0 {
            return Err(ConfigError::ValidationError("period_frames must be positive".to_string()));
        }
        if self.push_retry_ms == 0 || self.drain_poll_ms == 0 {
            return Err(ConfigError::ValidationError(
                "push_retry_ms and drain_poll_ms must be positive".to_string(),
            ));
        }
        if self.stall_timeout_ms < self.push_retry_ms.max(self.drain_poll_ms) {
            return Err(ConfigError::ValidationError(
                "stall_timeout_ms must not be shorter than the poll intervals".to_string(),
            ));
        }
        Ok(())
    }

    /// Session parameters derived from these settings.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            spec: OutputSpec::with_period_frames(self.period_frames),
            producer: ProducerOptions {
                push_retry: Duration::from_millis(self.push_retry_ms),
                drain_poll: Duration::from_millis(self.drain_poll_ms),
                stall_timeout: Duration::from_millis(self.stall_timeout_ms),
            },
        }
    }

    pub fn sound_library(&self) -> SoundLibrary {
        self.sounds
            .iter()
            .fold(SoundLibrary::new(&self.data_dir), |library, (event, path)| {
                library.with_override(*event, path)
            })
    }
}
