//! Integration tests for configuration management
//!
//! Settings on disk feeding the session and event layers.

use srbeep::config::Settings;
use srbeep::events::SoundEvent;
use srbeep::init_app_dirs;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[cfg(test)]
mod config_integration_tests {
    use super::*;

    #[test]
    fn test_config_lifecycle() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");

        let mut settings = Settings::default();
        settings.data_dir = dir.path().join("sounds");
        settings.output_device = "null".to_string();
        settings.push_retry_ms = 10;
        settings.sounds.insert(SoundEvent::StreamStart, PathBuf::from("go.ogg"));

        settings.validate()?;
        settings.save(&config_path)?;

        let loaded = Settings::load(&config_path)?;
        assert_eq!(loaded, settings);

        let options = loaded.session_options();
        assert_eq!(options.producer.push_retry, Duration::from_millis(10));

        let library = loaded.sound_library();
        assert_eq!(library.resolve(SoundEvent::StreamStart), dir.path().join("sounds").join("go.ogg"));
        assert_eq!(
            library.resolve(SoundEvent::RecordStop),
            dir.path().join("sounds").join("record_stop_sound.mp3")
        );

        let mut updated = loaded;
        updated.output_device = "hw:0".to_string();
        updated.save(&config_path)?;
        assert_eq!(Settings::load(&config_path)?.output_device, "hw:0");
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_reported() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "period_frames": 0 }"#)?;

        let loaded = Settings::load(&config_path)?;
        let err = loaded.validate().expect_err("zero period must be rejected");
        assert!(err.to_string().starts_with("Validation error"));
        Ok(())
    }

    #[test]
    fn test_app_dirs_follow_the_given_config_path() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("custom").join("nested").join("srbeep.json");
        let mut settings = Settings::default();
        settings.data_dir = dir.path().join("sounds");

        init_app_dirs(&config_path, &settings)?;

        assert!(dir.path().join("custom").join("nested").is_dir());
        assert!(dir.path().join("sounds").is_dir());
        assert!(!config_path.exists());

        // A bare file name has no directory to create.
        init_app_dirs(std::path::Path::new("srbeep.json"), &settings)?;
        Ok(())
    }
}
