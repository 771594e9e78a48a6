use crate::audio::decoder::{DecodeStep, SymphoniaDecoder};
use crate::audio::error::AudioError;
use crate::audio::output::OutputSpec;
use crate::audio::resampler::PcmConverter;
use std::path::Path;
use tracing::{debug, warn};

const LOG_TARGET: &str = "srbeep::audio::source";

/// One step of output-format PCM pulled from a source.
#[derive(Debug, PartialEq, Eq)]
pub enum PcmBlock<'a> {
    /// Bytes in the output format; may be empty.
    Pcm(&'a [u8]),
    /// A unit of input was dropped (recoverable failure).
    Skipped,
    End,
}

/// Anything that yields PCM already in the device's output format.
///
/// Errors returned from `next_block` are fatal to the session.
pub trait PcmSource {
    fn next_block(&mut self) -> Result<PcmBlock<'_>, AudioError>;
}

/// Decodes and converts an audio file.
pub struct ClipSource {
    decoder: SymphoniaDecoder,
    converter: PcmConverter,
    finished: bool,
}

impl ClipSource {
    pub fn open(path: &Path, target: &OutputSpec) -> Result<Self, AudioError> {
        let decoder = SymphoniaDecoder::open(path)?;
        let converter = PcmConverter::new(decoder.sample_rate(), decoder.channels(), target)?;
        Ok(Self {
            decoder,
            converter,
            finished: false,
        })
    }
}

impl PcmSource for ClipSource {
    fn next_block(&mut self) -> Result<PcmBlock<'_>, AudioError> {
        if self.finished {
            return Ok(PcmBlock::End);
        }
        match self.decoder.next_frame()? {
            DecodeStep::Frame(samples) => Ok(frame_block(self.converter.convert(samples))),
            DecodeStep::EndOfStream => {
                self.finished = true;
                match self.converter.flush() {
                    Ok(bytes) => {
                        debug!(target: LOG_TARGET, "Input exhausted, {} trailing bytes flushed.", bytes.len());
                        Ok(PcmBlock::Pcm(bytes))
                    }
                    Err(e) => {
                        warn!(target: LOG_TARGET, "Dropping resampler tail: {}", e);
                        Ok(PcmBlock::End)
                    }
                }
            }
        }
    }
}

/// A frame the converter rejects is dropped; the session carries on.
pub(super) fn frame_block(converted: Result<&[u8], AudioError>) -> PcmBlock<'_> {
    match converted {
        Ok(bytes) => PcmBlock::Pcm(bytes),
        Err(e) => {
            warn!(target: LOG_TARGET, "Dropping frame: {}", e);
            PcmBlock::Skipped
        }
    }
}
