use crate::audio::output::OutputDevice;
use crate::audio::session::{play_clip, SessionOptions};
use crate::events::{SoundEvent, SoundLibrary};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const LOG_TARGET: &str = "srbeep::events";

/// Builds a fresh output device for each session.
pub type DeviceFactory = Arc<dyn Fn() -> Box<dyn OutputDevice> + Send + Sync>;

/// Runs one playback session per trigger on a blocking worker.
///
/// Sessions for different events run concurrently. A new trigger for an event
/// first waits for that event's previous session to finish.
pub struct EventPlayer {
    library: SoundLibrary,
    options: SessionOptions,
    device_factory: DeviceFactory,
    workers: HashMap<SoundEvent, JoinHandle<()>>,
}

impl EventPlayer {
    pub fn new(library: SoundLibrary, options: SessionOptions, device_factory: DeviceFactory) -> Self {
        Self {
            library,
            options,
            device_factory,
            workers: HashMap::new(),
        }
    }

    pub fn library(&self) -> &SoundLibrary {
        &self.library
    }

    /// Number of workers not yet joined, finished or not.
    pub fn pending(&self) -> usize {
        self.workers.len()
    }

    /// Starts playback for `event` and returns once the worker is spawned.
    #[instrument(skip(self))]
    pub async fn trigger(&mut self, event: SoundEvent) {
        if let Some(previous) = self.workers.remove(&event) {
            debug!(target: LOG_TARGET, "Waiting for previous '{}' session.", event);
            join_worker(event, previous).await;
        }

        let path = self.library.resolve(event);
        let options = self.options.clone();
        let factory = Arc::clone(&self.device_factory);

        info!(target: LOG_TARGET, "Playing '{}' from {}", event, path.display());
        let handle = tokio::task::spawn_blocking(move || {
            let mut device = factory();
            match play_clip(&path, device.as_mut(), &options) {
                Ok(report) => info!(
                    target: LOG_TARGET,
                    event = %event,
                    chunks = report.chunks_pushed,
                    bytes = report.bytes_pushed,
                    skipped = report.blocks_skipped,
                    started = report.device_started,
                    "Session finished."
                ),
                Err(e) => error!(target: LOG_TARGET, event = %event, "Session aborted: {}", e),
            }
        });
        self.workers.insert(event, handle);
    }

    /// Waits for every outstanding session.
    pub async fn shutdown(&mut self) {
        let workers: Vec<_> = self.workers.drain().collect();
        debug!(target: LOG_TARGET, "Joining {} session workers.", workers.len());
        for (event, handle) in workers {
            join_worker(event, handle).await;
        }
    }
}

async fn join_worker(event: SoundEvent, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        if e.is_panic() {
            error!(target: LOG_TARGET, event = %event, "Session worker panicked: {:?}", e);
        } else {
            warn!(target: LOG_TARGET, event = %event, "Session worker join error: {}", e);
        }
    }
}
