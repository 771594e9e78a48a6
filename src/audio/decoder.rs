use crate::audio::error::AudioError;
use std::fs::File;
use std::io;
use std::path::Path;
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace, warn};

const LOG_TARGET: &str = "srbeep::audio::decoder";

/// Result of pulling the next frame from the decoder.
pub enum DecodeStep<'a> {
    /// Interleaved samples of one decoded frame, in the source layout.
    Frame(&'a [f32]),
    EndOfStream,
}

/// Owns the container reader and codec for a single audio file.
pub struct SymphoniaDecoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    scratch: Option<SampleBuffer<f32>>,
}

impl SymphoniaDecoder {
    /// Opens the container, selects the best audio stream and builds its decoder.
    pub fn open(path: &Path) -> Result<Self, AudioError> {
        debug!(target: LOG_TARGET, "Opening \"{}\"", path.display());
        let file = File::open(path).map_err(|e| AudioError::OpenError(path.to_path_buf(), e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| AudioError::OpenError(path.to_path_buf(), e.to_string()))?;
        Self::from_format(probed.format)
    }

    /// Builds the decoder over an already opened container.
    pub fn from_format(format_reader: Box<dyn FormatReader>) -> Result<Self, AudioError> {
        let track = format_reader
            .default_track()
            .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .or_else(|| {
                format_reader
                    .tracks()
                    .iter()
                    .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            })
            .ok_or(AudioError::NoAudioStream)?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        debug!(target: LOG_TARGET, "Selected audio track: ID={}, Codec={:?}", track_id, codec_params.codec);

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::DecoderInit(e.to_string()))?;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::DecoderInit("missing sample rate".to_string()))?;
        let channels = codec_params
            .channels
            .map(|c| c.count())
            .filter(|&n| n > 0)
            .ok_or_else(|| AudioError::DecoderInit("missing channel layout".to_string()))?;

        debug!(target: LOG_TARGET, "Decoder ready: rate={}, channels={}", sample_rate, channels);
        Ok(Self {
            format_reader,
            decoder,
            track_id,
            sample_rate,
            channels,
            scratch: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Reads packets until one decodes into a non-empty frame.
    ///
    /// Packets for other tracks are discarded. A packet that yields no samples
    /// simply means the codec needs more input. Any decode error is returned.
    pub fn next_frame(&mut self) -> Result<DecodeStep<'_>, AudioError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!(target: LOG_TARGET, "End of stream reached.");
                    return Ok(DecodeStep::EndOfStream);
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!(target: LOG_TARGET, "Stream discontinuity (ResetRequired), treating as end of stream.");
                    return Ok(DecodeStep::EndOfStream);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                trace!(target: LOG_TARGET, "Skipping packet for track {}", packet.track_id());
                continue;
            }

            let decoded = self
                .decoder
                .decode(&packet)
                .map_err(|e| AudioError::DecodingError(e.to_string()))?;
            if decoded.frames() == 0 {
                trace!(target: LOG_TARGET, "Decoder needs more input.");
                continue;
            }

            let spec: SignalSpec = *decoded.spec();
            if spec.channels.count() != self.channels {
                return Err(AudioError::DecodingError(format!(
                    "channel count changed mid-stream ({} -> {})",
                    self.channels,
                    spec.channels.count()
                )));
            }

            let frames = decoded.capacity() as u64;
            let fits = self
                .scratch
                .as_ref()
                .is_some_and(|buf| buf.capacity() >= decoded.capacity() * self.channels);
            if !fits {
                self.scratch = Some(SampleBuffer::new(frames, spec));
            }
            let scratch = self
                .scratch
                .as_mut()
                .ok_or_else(|| AudioError::InvalidState("sample scratch buffer missing".to_string()))?;
            scratch.copy_interleaved_ref(decoded);
            return Ok(DecodeStep::Frame(scratch.samples()));
        }
    }
}
