//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::Settings;
use crate::events::{SoundEvent, SoundLibrary};

/// Command-line arguments for srbeep
#[derive(Parser, Debug)]
#[command(author, version, about = "Notification sounds for stream and record events", long_about = None)]
pub struct Args {
    /// Config file path
    #[arg(short, long, global = true, env = "SRBEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the event sounds are loaded from
    #[arg(long, global = true, env = "SRBEEP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// ALSA device to use ("null" discards output)
    #[arg(short = 'd', long, global = true, env = "SRBEEP_DEVICE")]
    pub device: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "SRBEEP_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Play the sounds for the given events and wait for them to finish
    Play {
        #[arg(required = true, value_enum)]
        events: Vec<SoundEvent>,
    },
    /// Read event names from stdin, one per line, until EOF or Ctrl-C
    Listen,
    /// List the known events and the files they play
    Events,
}

impl Args {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Settings::default_path)
    }

    /// Applies flag overrides on top of file settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(device) = &self.device {
            settings.output_device = device.clone();
        }
    }
}

/// Parses one line of `listen` input. Blank lines and `#` comments yield `None`.
pub fn parse_event_line(line: &str) -> Option<Result<SoundEvent, String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line.parse())
}

/// Writes the event table for `srbeep events`.
pub fn display_events<W: Write>(out: &mut W, library: &SoundLibrary) -> io::Result<()> {
    writeln!(out, "{:<14} {:<26} {}", "Event", "File", "Resolved path")?;
    writeln!(out, "{}", "-".repeat(80))?;
    for event in SoundEvent::ALL {
        let path = library.resolve(event);
        let marker = if path.exists() { "" } else { "  (missing)" };
        writeln!(
            out,
            "{:<14} {:<26} {}{}",
            event.name(),
            event.file_name(),
            path.display(),
            marker
        )?;
    }
    Ok(())
}
