//! Persisted settings

mod settings;

pub use settings::{ConfigError, Settings};
