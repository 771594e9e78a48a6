//! srbeep library core functionality

pub mod audio;
pub mod config;
pub mod events;
pub mod logging;
pub mod ui;

use std::path::Path;

/// Initialize the application directories
///
/// `config_path` is the resolved settings file, which may differ from
/// [`config::Settings::default_path`] when `--config` is given.
pub fn init_app_dirs(config_path: &Path, settings: &config::Settings) -> std::io::Result<()> {
    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(config_dir)?;
        }
    }
    std::fs::create_dir_all(&settings.data_dir)?;
    Ok(())
}
