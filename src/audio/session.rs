use crate::audio::chunk::AudioChunk;
use crate::audio::error::AudioError;
use crate::audio::mixer::fill_from_ring;
use crate::audio::output::{OutputDevice, OutputSpec};
use crate::audio::producer::{ProduceReport, Producer, ProducerOptions};
use crate::audio::ring_buffer::SyncRingBuffer;
use crate::audio::source::{ClipSource, PcmSource};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

const LOG_TARGET: &str = "srbeep::audio::session";

/// Slots in a session's ring.
pub const RING_CAPACITY: usize = 32;

pub type ChunkRing = SyncRingBuffer<AudioChunk, RING_CAPACITY>;

/// The output device is a process-wide resource: configure and close
/// transitions from different sessions never overlap.
static DEVICE_SETUP: Mutex<()> = Mutex::new(());

fn lock_device_setup() -> MutexGuard<'static, ()> {
    DEVICE_SETUP.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub spec: OutputSpec,
    pub producer: ProducerOptions,
}

/// Plays one audio file to completion on `device`.
///
/// Blocks until every decoded byte has been consumed by the device callback
/// or the session fails. The device is closed on every path.
#[instrument(skip(path, device, options), fields(path = %path.display()))]
pub fn play_clip<D>(path: &Path, device: &mut D, options: &SessionOptions) -> Result<ProduceReport, AudioError>
where
    D: OutputDevice + ?Sized,
{
    let mut source = ClipSource::open(path, &options.spec)?;
    play_source(&mut source, device, options)
}

/// Runs a session from an arbitrary PCM source.
pub fn play_source<S, D>(source: &mut S, device: &mut D, options: &SessionOptions) -> Result<ProduceReport, AudioError>
where
    S: PcmSource + ?Sized,
    D: OutputDevice + ?Sized,
{
    let ring = Arc::new(ChunkRing::new());

    {
        let _setup = lock_device_setup();
        let consumer_ring = Arc::clone(&ring);
        let configured = device.configure(
            options.spec,
            Box::new(move |out: &mut [u8]| fill_from_ring(out, &consumer_ring)),
        );
        if let Err(e) = configured {
            device.stop();
            return Err(e);
        }
    }
    debug!(target: LOG_TARGET, "Device configured, producing.");

    let result = Producer::new(&*ring, &mut *device, &options.producer).run(source);

    let _setup = lock_device_setup();
    device.stop();
    debug!(target: LOG_TARGET, "Device closed.");
    result
}
