//! Converts decoded frames into the fixed output layout: stereo, signed
//! 16-bit native-endian, at the output sample rate.

use crate::audio::error::AudioError;
use crate::audio::output::OutputSpec;
use rubato::{Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction};
use tracing::{debug, trace};

const LOG_TARGET: &str = "srbeep::audio::resampler";

/// Input frames handed to the resampler per call.
const RESAMPLER_CHUNK_FRAMES: usize = 1024;

const OUT_CHANNELS: usize = 2;

struct RateConverter {
    resampler: SincFixedIn<f32>,
    ratio: f64,
    /// Leading output frames still to discard (filter delay).
    delay_remaining: usize,
    frames_in: u64,
    frames_out: u64,
}

/// Channel mapping, rate conversion and sample encoding for one session.
pub struct PcmConverter {
    in_channels: usize,
    rate: Option<RateConverter>,
    /// Left/right planes awaiting the resampler.
    pending: [Vec<f32>; OUT_CHANNELS],
    out: Vec<u8>,
}

impl PcmConverter {
    pub fn new(in_rate: u32, in_channels: usize, target: &OutputSpec) -> Result<Self, AudioError> {
        if in_channels == 0 {
            return Err(AudioError::ResamplerInit("source has no channels".to_string()));
        }
        if target.channels != OUT_CHANNELS {
            return Err(AudioError::ResamplerInit(format!(
                "unsupported output channel count {}",
                target.channels
            )));
        }

        let rate = if in_rate != target.sample_rate {
            let ratio = f64::from(target.sample_rate) / f64::from(in_rate);
            let params = SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris2,
            };
            let resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLER_CHUNK_FRAMES, OUT_CHANNELS)?;
            debug!(target: LOG_TARGET, "Resampling {} Hz -> {} Hz", in_rate, target.sample_rate);
            Some(RateConverter {
                delay_remaining: resampler.output_delay(),
                resampler,
                ratio,
                frames_in: 0,
                frames_out: 0,
            })
        } else {
            debug!(target: LOG_TARGET, "Source already at {} Hz, no rate conversion.", in_rate);
            None
        };

        Ok(Self {
            in_channels,
            rate,
            pending: [Vec::new(), Vec::new()],
            out: Vec::new(),
        })
    }

    /// Converts one decoded frame of interleaved samples.
    ///
    /// The returned bytes are valid until the next call. On error the frame's
    /// samples are dropped and the converter stays usable.
    pub fn convert(&mut self, interleaved: &[f32]) -> Result<&[u8], AudioError> {
        self.out.clear();
        for frame in interleaved.chunks_exact(self.in_channels) {
            let (left, right) = match frame {
                [mono] => (*mono, *mono),
                [left, right, ..] => (*left, *right),
                [] => continue,
            };
            self.pending[0].push(left);
            self.pending[1].push(right);
        }

        let result = match self.rate.as_mut() {
            None => {
                encode_planes(&self.pending, &mut self.out);
                self.pending.iter_mut().for_each(Vec::clear);
                Ok(())
            }
            Some(rate) => rate.process_full_chunks(&mut self.pending, &mut self.out),
        };

        match result {
            Ok(()) => Ok(&self.out),
            Err(e) => {
                self.pending.iter_mut().for_each(Vec::clear);
                self.out.clear();
                Err(e)
            }
        }
    }

    /// Pushes out whatever the resampler is still holding at end of input.
    pub fn flush(&mut self) -> Result<&[u8], AudioError> {
        self.out.clear();
        if let Some(rate) = self.rate.as_mut() {
            rate.flush(&mut self.pending, &mut self.out)?;
        }
        self.pending.iter_mut().for_each(Vec::clear);
        Ok(&self.out)
    }
}

impl RateConverter {
    fn process_full_chunks(&mut self, pending: &mut [Vec<f32>; OUT_CHANNELS], out: &mut Vec<u8>) -> Result<(), AudioError> {
        loop {
            let needed = self.resampler.input_frames_next();
            if pending[0].len() < needed {
                return Ok(());
            }
            let input = [&pending[0][..needed], &pending[1][..needed]];
            let planes = self.resampler.process(&input[..], None)?;
            self.frames_in += needed as u64;
            self.emit(&planes, usize::MAX, out);
            pending.iter_mut().for_each(|plane| {
                plane.drain(..needed);
            });
        }
    }

    fn flush(&mut self, pending: &mut [Vec<f32>; OUT_CHANNELS], out: &mut Vec<u8>) -> Result<(), AudioError> {
        self.frames_in += pending[0].len() as u64;
        let expected = (self.frames_in as f64 * self.ratio).round() as u64;

        if !pending[0].is_empty() {
            let input = [&pending[0][..], &pending[1][..]];
            let planes = self.resampler.process_partial(Some(&input[..]), None)?;
            self.emit(&planes, self.frames_left(expected), out);
        }
        // Zero-fed calls until the filter delay has been pushed through.
        while self.frames_out < expected {
            let before = self.frames_out;
            let planes = self.resampler.process_partial::<&[f32]>(None, None)?;
            self.emit(&planes, self.frames_left(expected), out);
            if self.frames_out == before && self.delay_remaining == 0 {
                break;
            }
        }
        trace!(target: LOG_TARGET, "Resampler flushed: {} frames in, {} frames out", self.frames_in, self.frames_out);
        Ok(())
    }

    fn frames_left(&self, expected: u64) -> usize {
        expected.saturating_sub(self.frames_out) as usize
    }

    fn emit(&mut self, planes: &[Vec<f32>], limit: usize, out: &mut Vec<u8>) {
        let available = planes.first().map_or(0, Vec::len);
        let skip = self.delay_remaining.min(available);
        self.delay_remaining -= skip;
        let end = available.min(skip.saturating_add(limit));
        let kept: Vec<&[f32]> = planes.iter().map(|plane| &plane[skip..end]).collect();
        encode_planes(&kept, out);
        self.frames_out += (end - skip) as u64;
    }
}

/// Interleaves equal-length planes into signed 16-bit native-endian bytes.
fn encode_planes<P: AsRef<[f32]>>(planes: &[P], out: &mut Vec<u8>) {
    let frames = planes.first().map_or(0, |p| p.as_ref().len());
    out.reserve(frames * planes.len() * 2);
    for frame in 0..frames {
        for plane in planes {
            let sample = (plane.as_ref()[frame] * 32767.0).clamp(-32768.0, 32767.0) as i16;
            out.extend_from_slice(&sample.to_ne_bytes());
        }
    }
}
