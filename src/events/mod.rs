//! Triggering events and the assets they play.

mod dispatcher;
#[cfg(test)]
mod tests;

pub use dispatcher::{DeviceFactory, EventPlayer};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Host lifecycle events that play a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SoundEvent {
    StreamStart,
    StreamStop,
    RecordStart,
    RecordStop,
    BufferStart,
    BufferStop,
    Pause,
    Unpause,
    BufferSaved,
}

impl SoundEvent {
    pub const ALL: [SoundEvent; 9] = [
        SoundEvent::StreamStart,
        SoundEvent::StreamStop,
        SoundEvent::RecordStart,
        SoundEvent::RecordStop,
        SoundEvent::BufferStart,
        SoundEvent::BufferStop,
        SoundEvent::Pause,
        SoundEvent::Unpause,
        SoundEvent::BufferSaved,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundEvent::StreamStart => "stream-start",
            SoundEvent::StreamStop => "stream-stop",
            SoundEvent::RecordStart => "record-start",
            SoundEvent::RecordStop => "record-stop",
            SoundEvent::BufferStart => "buffer-start",
            SoundEvent::BufferStop => "buffer-stop",
            SoundEvent::Pause => "pause",
            SoundEvent::Unpause => "unpause",
            SoundEvent::BufferSaved => "buffer-saved",
        }
    }

    /// Asset file played for this event, relative to the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SoundEvent::StreamStart => "stream_start_sound.mp3",
            SoundEvent::StreamStop => "stream_stop_sound.mp3",
            SoundEvent::RecordStart => "record_start_sound.mp3",
            SoundEvent::RecordStop => "record_stop_sound.mp3",
            SoundEvent::BufferStart => "buffer_start_sound.mp3",
            SoundEvent::BufferStop => "buffer_stop_sound.mp3",
            SoundEvent::Pause => "pause_start_sound.mp3",
            SoundEvent::Unpause => "pause_stop_sound.mp3",
            SoundEvent::BufferSaved => "buffer_save_sound.mp3",
        }
    }
}

impl fmt::Display for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SoundEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-").to_ascii_lowercase();
        SoundEvent::ALL
            .into_iter()
            .find(|event| event.name() == wanted)
            .ok_or_else(|| format!("unknown event '{}'", s.trim()))
    }
}

/// Resolves events to asset paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundLibrary {
    data_dir: PathBuf,
    overrides: BTreeMap<SoundEvent, PathBuf>,
}

impl SoundLibrary {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            overrides: BTreeMap::new(),
        }
    }

    /// Replaces the asset for `event`. Relative paths resolve against the data directory.
    pub fn with_override(mut self, event: SoundEvent, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(event, path.into());
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn resolve(&self, event: SoundEvent) -> PathBuf {
        match self.overrides.get(&event) {
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join(event.file_name()),
        }
    }
}
