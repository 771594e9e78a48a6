use std::error::Error;
use std::io;
use std::path::PathBuf;
use symphonia::core::errors::Error as SymphoniaError;

/// Error types for a playback session.
#[derive(Debug)]
pub enum AudioError {
    /// The input could not be opened or probed (missing or corrupt file).
    OpenError(PathBuf, String),
    NoAudioStream,
    DecoderInit(String),
    DecodingError(String),
    ResamplerInit(String),
    ResamplingError(String),
    AlsaError(String),
    DeviceError(String),
    SymphoniaError(SymphoniaError),
    IoError(io::Error),
    InvalidState(String),
    /// The consumer made no progress for longer than the configured stall timeout.
    Stalled(std::time::Duration),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::OpenError(path, e) => write!(f, "Failed to open \"{}\": {}", path.display(), e),
            AudioError::NoAudioStream => write!(f, "No audio stream found in input"),
            AudioError::DecoderInit(e) => write!(f, "Decoder initialization error: {}", e),
            AudioError::DecodingError(e) => write!(f, "Decoding error: {}", e),
            AudioError::ResamplerInit(e) => write!(f, "Resampler initialization error: {}", e),
            AudioError::ResamplingError(e) => write!(f, "Resampling error: {}", e),
            AudioError::AlsaError(e) => write!(f, "ALSA error: {}", e),
            AudioError::DeviceError(e) => write!(f, "Output device error: {}", e),
            AudioError::SymphoniaError(e) => write!(f, "Symphonia error: {}", e),
            AudioError::IoError(e) => write!(f, "I/O error: {}", e),
            AudioError::InvalidState(s) => write!(f, "Invalid state: {}", s),
            AudioError::Stalled(d) => write!(f, "Output stalled for {:?}", d),
        }
    }
}

impl Error for AudioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AudioError::SymphoniaError(e) => Some(e),
            AudioError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

// --- From Implementations for AudioError ---

impl From<alsa::Error> for AudioError {
    fn from(e: alsa::Error) -> Self {
        AudioError::AlsaError(e.to_string())
    }
}

impl From<SymphoniaError> for AudioError {
    fn from(e: SymphoniaError) -> Self {
        AudioError::SymphoniaError(e)
    }
}

impl From<io::Error> for AudioError {
    fn from(e: io::Error) -> Self {
        AudioError::IoError(e)
    }
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::ResamplerInit(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::ResamplingError(e.to_string())
    }
}

