//! Output device abstraction.
//!
//! A device is configured once per session with a fill callback, then calls
//! that callback from its own thread whenever it needs another period of
//! samples. Both implementations share the same pump thread; they differ only
//! in where the filled period goes.

use crate::audio::error::AudioError;
use alsa::nix::errno::Errno;
use alsa::pcm::{Access, Format, HwParams, State as PcmState, PCM};
use alsa::{Direction, ValueOr};
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace, warn};

const LOG_TARGET: &str = "srbeep::audio::output";

pub const OUTPUT_SAMPLE_RATE: u32 = 44_100;
pub const OUTPUT_CHANNELS: usize = 2;
pub const DEFAULT_PERIOD_FRAMES: usize = 1024;

/// Device name selecting [`NullOutput`] instead of ALSA.
pub const NULL_DEVICE: &str = "null";

/// Sample encodings the devices accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 16-bit, native endianness.
    S16,
}

impl SampleFormat {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::S16 => 2,
        }
    }
}

/// Stream parameters handed to [`OutputDevice::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub channels: usize,
    /// Frames requested per callback.
    pub period_frames: usize,
}

impl OutputSpec {
    pub fn with_period_frames(period_frames: usize) -> Self {
        Self {
            period_frames,
            ..Self::default()
        }
    }

    pub fn frame_bytes(&self) -> usize {
        self.channels * self.format.bytes_per_sample()
    }

    pub fn period_bytes(&self) -> usize {
        self.period_frames * self.frame_bytes()
    }

    pub fn period_duration(&self) -> Duration {
        Duration::from_secs_f64(self.period_frames as f64 / f64::from(self.sample_rate))
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            sample_rate: OUTPUT_SAMPLE_RATE,
            format: SampleFormat::S16,
            channels: OUTPUT_CHANNELS,
            period_frames: DEFAULT_PERIOD_FRAMES,
        }
    }
}

/// Fills the given buffer completely and returns how many of its bytes came
/// from real audio rather than silence.
pub type FillCallback = Box<dyn FnMut(&mut [u8]) -> usize + Send + 'static>;

/// The audio output collaborator.
pub trait OutputDevice: Send {
    /// Opens the device and installs `callback`. Playback stays paused until
    /// [`start`](Self::start).
    fn configure(&mut self, spec: OutputSpec, callback: FillCallback) -> Result<(), AudioError>;

    /// Begins (or keeps) invoking the callback. Idempotent.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stops the callback thread and releases the device. Idempotent.
    fn stop(&mut self);

    fn delay(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Picks the device implementation for a configured device name.
pub fn open_device(name: &str) -> Box<dyn OutputDevice> {
    if name == NULL_DEVICE {
        Box::new(NullOutput::new())
    } else {
        Box::new(AlsaOutput::new(name))
    }
}

// --- Pump thread ---

/// Destination of filled periods, owned by the pump thread.
trait PeriodSink {
    fn write(&mut self, period: &[u8]) -> Result<(), AudioError>;

    /// Called once when the pump exits normally.
    fn finish(&mut self) {}
}

#[derive(Default)]
struct PumpFlags {
    playing: AtomicBool,
    shutdown: AtomicBool,
}

struct Pump {
    flags: Arc<PumpFlags>,
    thread: Option<JoinHandle<()>>,
}

impl Pump {
    /// Spawns the pump and waits until `open` has run on it.
    fn spawn<S, O>(name: &str, spec: OutputSpec, open: O, mut callback: FillCallback) -> Result<Self, AudioError>
    where
        S: PeriodSink,
        O: FnOnce() -> Result<S, AudioError> + Send + 'static,
    {
        let flags = Arc::new(PumpFlags::default());
        let thread_flags = Arc::clone(&flags);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), AudioError>>();

        let thread = thread::Builder::new()
            .name(format!("srbeep-out-{}", name))
            .spawn(move || {
                let mut sink = match open() {
                    Ok(sink) => {
                        let _ = ready_tx.send(Ok(()));
                        sink
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let idle = spec.period_duration();
                let mut period = vec![0u8; spec.period_bytes()];
                while !thread_flags.shutdown.load(Ordering::Acquire) {
                    if !thread_flags.playing.load(Ordering::Acquire) {
                        thread::park_timeout(idle);
                        continue;
                    }
                    callback(&mut period);
                    if let Err(e) = sink.write(&period) {
                        error!(target: LOG_TARGET, "Output write failed, stopping pump: {}", e);
                        return;
                    }
                }
                sink.finish();
                trace!(target: LOG_TARGET, "Pump thread exiting.");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                flags,
                thread: Some(thread),
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::DeviceError("output thread exited during setup".to_string()))
            }
        }
    }

    fn start(&self) {
        if !self.flags.playing.swap(true, Ordering::AcqRel) {
            debug!(target: LOG_TARGET, "Output started.");
            if let Some(thread) = &self.thread {
                thread.thread().unpark();
            }
        }
    }

    fn is_playing(&self) -> bool {
        self.flags.playing.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        self.flags.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            if thread.join().is_err() {
                error!(target: LOG_TARGET, "Output pump thread panicked.");
            }
        }
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.stop();
    }
}

// --- ALSA ---

/// ALSA playback device driven by the pump thread.
pub struct AlsaOutput {
    device_name: String,
    pump: Option<Pump>,
}

impl AlsaOutput {
    pub fn new(device_name: &str) -> Self {
        Self {
            device_name: device_name.to_string(),
            pump: None,
        }
    }
}

impl OutputDevice for AlsaOutput {
    #[instrument(skip(self, callback), fields(device = %self.device_name, rate = spec.sample_rate, channels = spec.channels))]
    fn configure(&mut self, spec: OutputSpec, callback: FillCallback) -> Result<(), AudioError> {
        self.stop();
        let device_name = self.device_name.clone();
        let pump = Pump::spawn(&self.device_name, spec, move || AlsaSink::open(&device_name, spec), callback)?;
        self.pump = Some(pump);
        info!(target: LOG_TARGET, "ALSA device '{}' configured.", self.device_name);
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        let pump = self
            .pump
            .as_ref()
            .ok_or_else(|| AudioError::InvalidState("ALSA device not configured".to_string()))?;
        pump.start();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut pump) = self.pump.take() {
            debug!(target: LOG_TARGET, "Closing ALSA device '{}'.", self.device_name);
            pump.stop();
        }
    }
}

impl Drop for AlsaOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

struct AlsaSink {
    pcm: PCM,
    channels: usize,
    samples: Vec<i16>,
    wrote_frames: bool,
}

impl AlsaSink {
    fn open(device_name: &str, spec: OutputSpec) -> Result<Self, AudioError> {
        let device = CString::new(device_name)
            .map_err(|e| AudioError::DeviceError(format!("Invalid device name: {}", e)))?;
        let pcm = PCM::open(&device, Direction::Playback, false)?;

        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(match spec.format {
                SampleFormat::S16 => Format::s16(),
            })?;
            hwp.set_channels(spec.channels as u32)?;
            hwp.set_rate(spec.sample_rate, ValueOr::Nearest)?;
            check_negotiated_rate(spec.sample_rate, hwp.get_rate()?)?;
            hwp.set_period_size_near(spec.period_frames as alsa::pcm::Frames, ValueOr::Nearest)?;
            pcm.hw_params(&hwp)?;

            let swp = pcm.sw_params_current()?;
            let buffer_size = hwp.get_buffer_size()?;
            let period_size = hwp.get_period_size()?;
            swp.set_start_threshold(buffer_size - period_size)?;
            pcm.sw_params(&swp)?;
            debug!(target: LOG_TARGET, "ALSA parameters applied (buffer={}, period={}).", buffer_size, period_size);
        }

        Ok(Self {
            pcm,
            channels: spec.channels,
            samples: vec![0; spec.period_frames * spec.channels],
            wrote_frames: false,
        })
    }
}

/// The converter only produces the requested rate, so any other rate would
/// play pitch-shifted.
pub(super) fn check_negotiated_rate(requested: u32, actual: u32) -> Result<(), AudioError> {
    if actual == requested {
        Ok(())
    } else {
        Err(AudioError::DeviceError(format!(
            "device does not support {} Hz (nearest offered: {} Hz)",
            requested, actual
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CloseAction {
    Drain,
    /// Written frames are still below the start threshold.
    StartThenDrain,
    Drop,
}

pub(super) fn close_action(state: PcmState, wrote_frames: bool) -> CloseAction {
    match state {
        PcmState::Running => CloseAction::Drain,
        PcmState::Prepared if wrote_frames => CloseAction::StartThenDrain,
        _ => CloseAction::Drop,
    }
}

impl PeriodSink for AlsaSink {
    fn write(&mut self, period: &[u8]) -> Result<(), AudioError> {
        let n = period.len() / 2;
        self.samples.resize(n, 0);
        for (sample, bytes) in self.samples.iter_mut().zip(period.chunks_exact(2)) {
            *sample = i16::from_ne_bytes([bytes[0], bytes[1]]);
        }

        let io = self.pcm.io_i16()?;
        let total_frames = n / self.channels;
        let mut offset = 0;
        while offset < total_frames {
            match io.writei(&self.samples[offset * self.channels..total_frames * self.channels]) {
                Ok(frames_written) => {
                    offset += frames_written;
                    self.wrote_frames |= frames_written > 0;
                }
                Err(e) if e.errno() == Errno::EPIPE => {
                    warn!(target: LOG_TARGET, "ALSA buffer underrun (EPIPE), recovering.");
                    self.pcm.recover(libc::EPIPE, true)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        match close_action(self.pcm.state(), self.wrote_frames) {
            CloseAction::Drop => return,
            CloseAction::StartThenDrain => {
                debug!(target: LOG_TARGET, "Starting PCM to flush frames below the start threshold.");
                if let Err(e) = self.pcm.start() {
                    warn!(target: LOG_TARGET, "Error starting ALSA PCM for drain (ignored): {}", e);
                    return;
                }
            }
            CloseAction::Drain => {}
        }
        if let Err(e) = self.pcm.drain() {
            warn!(target: LOG_TARGET, "Error draining ALSA buffer (ignored): {}", e);
        }
    }
}

// --- Null ---

/// Counters shared between a [`NullOutput`] and its pump thread.
#[derive(Debug, Default)]
pub struct NullOutputStats {
    periods: AtomicU64,
    bytes_mixed: AtomicU64,
}

impl NullOutputStats {
    pub fn periods(&self) -> u64 {
        self.periods.load(Ordering::Acquire)
    }

    /// Bytes of real audio (not silence padding) the callback produced.
    pub fn bytes_mixed(&self) -> u64 {
        self.bytes_mixed.load(Ordering::Acquire)
    }
}

/// Device that runs the callback at a fixed pace and discards the result.
pub struct NullOutput {
    pace: Option<Duration>,
    stats: Arc<NullOutputStats>,
    pump: Option<Pump>,
}

impl NullOutput {
    /// Paced like a real device: one period per period duration.
    pub fn new() -> Self {
        Self {
            pace: None,
            stats: Arc::new(NullOutputStats::default()),
            pump: None,
        }
    }

    /// Invokes the callback once per `pace` regardless of the period length.
    pub fn with_pace(pace: Duration) -> Self {
        let mut output = Self::new();
        output.pace = Some(pace);
        output
    }

    pub fn stats(&self) -> Arc<NullOutputStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_started(&self) -> bool {
        self.pump.as_ref().is_some_and(Pump::is_playing)
    }
}

impl Default for NullOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDevice for NullOutput {
    fn configure(&mut self, spec: OutputSpec, mut callback: FillCallback) -> Result<(), AudioError> {
        self.stop();
        let pace = self.pace.unwrap_or_else(|| spec.period_duration());
        let stats = Arc::clone(&self.stats);
        let counting: FillCallback = Box::new(move |out: &mut [u8]| {
            let mixed = callback(out);
            stats.periods.fetch_add(1, Ordering::AcqRel);
            stats.bytes_mixed.fetch_add(mixed as u64, Ordering::AcqRel);
            mixed
        });
        self.pump = Some(Pump::spawn(NULL_DEVICE, spec, move || Ok(NullSink { pace }), counting)?);
        debug!(target: LOG_TARGET, "Null output configured (pace {:?}).", pace);
        Ok(())
    }

    fn start(&mut self) -> Result<(), AudioError> {
        let pump = self
            .pump
            .as_ref()
            .ok_or_else(|| AudioError::InvalidState("null device not configured".to_string()))?;
        pump.start();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut pump) = self.pump.take() {
            pump.stop();
        }
    }
}

impl Drop for NullOutput {
    fn drop(&mut self) {
        self.stop();
    }
}

struct NullSink {
    pace: Duration,
}

impl PeriodSink for NullSink {
    fn write(&mut self, _period: &[u8]) -> Result<(), AudioError> {
        thread::sleep(self.pace);
        Ok(())
    }
}
