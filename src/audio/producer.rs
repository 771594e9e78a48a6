//! Producer side of a session: slices converted PCM into chunks, pushes them
//! with backpressure, gates device start on fill level and waits for the
//! consumer to drain everything before returning.

use crate::audio::chunk::AudioChunk;
use crate::audio::error::AudioError;
use crate::audio::output::OutputDevice;
use crate::audio::ring_buffer::SyncRingBuffer;
use crate::audio::source::{PcmBlock, PcmSource};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

const LOG_TARGET: &str = "srbeep::audio::producer";

/// Polling intervals for backpressure and drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerOptions {
    /// Delay between push attempts while the ring is full.
    pub push_retry: Duration,
    /// Delay between emptiness checks while draining.
    pub drain_poll: Duration,
    /// Longest wait without the consumer retiring a chunk.
    pub stall_timeout: Duration,
}

impl Default for ProducerOptions {
    fn default() -> Self {
        Self {
            push_retry: Duration::from_millis(30),
            drain_poll: Duration::from_millis(100),
            stall_timeout: Duration::from_secs(10),
        }
    }
}

/// What one producer run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProduceReport {
    pub chunks_pushed: usize,
    pub bytes_pushed: usize,
    pub blocks_skipped: usize,
    pub device_started: bool,
}

/// Sole writer of one session's ring.
pub struct Producer<'a, D: OutputDevice + ?Sized, const N: usize> {
    ring: &'a SyncRingBuffer<AudioChunk, N>,
    device: &'a mut D,
    options: &'a ProducerOptions,
    report: ProduceReport,
}

impl<'a, D: OutputDevice + ?Sized, const N: usize> Producer<'a, D, N> {
    pub fn new(ring: &'a SyncRingBuffer<AudioChunk, N>, device: &'a mut D, options: &'a ProducerOptions) -> Self {
        Self {
            ring,
            device,
            options,
            report: ProduceReport::default(),
        }
    }

    /// Pulls `source` to exhaustion, then waits until the ring is empty.
    pub fn run<S: PcmSource + ?Sized>(mut self, source: &mut S) -> Result<ProduceReport, AudioError> {
        loop {
            match source.next_block()? {
                PcmBlock::Pcm(bytes) => self.slice_and_push(bytes)?,
                PcmBlock::Skipped => self.report.blocks_skipped += 1,
                PcmBlock::End => break,
            }
        }
        debug!(
            target: LOG_TARGET,
            "Input exhausted after {} chunks ({} bytes), draining.",
            self.report.chunks_pushed, self.report.bytes_pushed
        );
        self.drain_wait()?;
        Ok(self.report)
    }

    fn slice_and_push(&mut self, mut bytes: &[u8]) -> Result<(), AudioError> {
        while !bytes.is_empty() {
            let (chunk, taken) = AudioChunk::from_slice(bytes);
            bytes = &bytes[taken..];
            self.push_with_backpressure(chunk)?;
            self.report.chunks_pushed += 1;
            self.report.bytes_pushed += taken;

            if self.ring.remaining_space() < self.ring.capacity() / 2 {
                self.start_device()?;
            }
        }
        Ok(())
    }

    fn push_with_backpressure(&mut self, chunk: AudioChunk) -> Result<(), AudioError> {
        let mut pending = match self.ring.push(chunk) {
            Ok(()) => return Ok(()),
            Err(chunk) => chunk,
        };

        // The ring is full: the consumer has to be running for this to end.
        self.start_device()?;
        let blocked_at = Instant::now();
        loop {
            if blocked_at.elapsed() >= self.options.stall_timeout {
                return Err(AudioError::Stalled(blocked_at.elapsed()));
            }
            self.device.delay(self.options.push_retry);
            pending = match self.ring.push(pending) {
                Ok(()) => {
                    trace!(target: LOG_TARGET, "Push accepted after {:?} of backpressure.", blocked_at.elapsed());
                    return Ok(());
                }
                Err(chunk) => chunk,
            };
        }
    }

    fn drain_wait(&mut self) -> Result<(), AudioError> {
        let mut last_len = self.ring.len();
        let mut last_progress = Instant::now();
        while !self.ring.is_empty() {
            self.start_device()?;
            self.device.delay(self.options.drain_poll);

            let len = self.ring.len();
            if len < last_len {
                last_len = len;
                last_progress = Instant::now();
            } else if last_progress.elapsed() >= self.options.stall_timeout {
                return Err(AudioError::Stalled(last_progress.elapsed()));
            }
        }
        Ok(())
    }

    fn start_device(&mut self) -> Result<(), AudioError> {
        if !self.report.device_started {
            self.device.start()?;
            self.report.device_started = true;
            info!(target: LOG_TARGET, "Output started with {} chunks buffered.", self.ring.len());
        }
        Ok(())
    }
}
