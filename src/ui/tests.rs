//! Tests for the command-line interface

use super::*;
use crate::config::Settings;
use crate::events::{SoundEvent, SoundLibrary};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_play_parses_events() -> Result<(), clap::Error> {
    let args = Args::try_parse_from(["srbeep", "play", "stream-start", "buffer-saved"])?;
    assert_eq!(
        args.command,
        Command::Play {
            events: vec![SoundEvent::StreamStart, SoundEvent::BufferSaved]
        }
    );
    assert!(!args.log_json);
    Ok(())
}

#[test]
fn test_play_requires_an_event() {
    assert!(Args::try_parse_from(["srbeep", "play"]).is_err());
    assert!(Args::try_parse_from(["srbeep", "play", "not-an-event"]).is_err());
}

#[test]
fn test_global_flags_override_settings() -> Result<(), clap::Error> {
    let args = Args::try_parse_from([
        "srbeep",
        "listen",
        "--device",
        "null",
        "--data-dir",
        "/tmp/sounds",
        "--config",
        "/tmp/srbeep.json",
    ])?;
    assert_eq!(args.command, Command::Listen);
    assert_eq!(args.config_path(), PathBuf::from("/tmp/srbeep.json"));

    let mut settings = Settings::default();
    args.apply_to(&mut settings);
    assert_eq!(settings.output_device, "null");
    assert_eq!(settings.data_dir, PathBuf::from("/tmp/sounds"));
    Ok(())
}

#[test]
fn test_parse_event_line() {
    assert_eq!(parse_event_line("pause\n"), Some(Ok(SoundEvent::Pause)));
    assert_eq!(parse_event_line("   "), None);
    assert_eq!(parse_event_line("# comment"), None);
    assert!(matches!(parse_event_line("bogus"), Some(Err(_))));
}

#[test]
fn test_display_events_lists_every_event() -> std::io::Result<()> {
    let library = SoundLibrary::new("/nonexistent");
    let mut out = Vec::new();
    display_events(&mut out, &library)?;
    let text = String::from_utf8_lossy(&out);
    for event in SoundEvent::ALL {
        assert!(text.contains(event.file_name()));
    }
    assert!(text.contains("(missing)"));
    Ok(())
}
