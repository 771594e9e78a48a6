//! End-to-end sessions: WAV on disk through symphonia, the converter, the ring
//! and the null output device.

use crate::test_utils::write_sine_wav;
use srbeep::audio::{
    play_clip, AudioError, FillCallback, NullOutput, OutputDevice, OutputSpec, ProducerOptions, SessionOptions,
};
use srbeep::events::{DeviceFactory, EventPlayer, SoundEvent, SoundLibrary};
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

fn fast_options() -> SessionOptions {
    SessionOptions {
        producer: ProducerOptions {
            push_retry: Duration::from_millis(2),
            drain_poll: Duration::from_millis(5),
            stall_timeout: Duration::from_secs(5),
        },
        ..SessionOptions::default()
    }
}

fn fast_device() -> NullOutput {
    NullOutput::with_pace(Duration::from_micros(200))
}

#[cfg(test)]
mod session_integration_tests {
    use super::*;

    #[test]
    fn test_native_rate_clip_plays_every_byte() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("stereo.wav");
        write_sine_wav(&path, 44_100, 2, 4410)?;

        let mut device = fast_device();
        let stats = device.stats();
        let report = play_clip(&path, &mut device, &fast_options())?;

        assert_eq!(report.bytes_pushed, 4410 * 4);
        assert!(report.chunks_pushed >= 18);
        assert_eq!(report.blocks_skipped, 0);
        assert!(report.device_started);
        assert_eq!(stats.bytes_mixed(), 4410 * 4);
        assert!(!device.is_started());
        Ok(())
    }

    #[test]
    fn test_mono_clip_is_resampled_to_stereo() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("mono.wav");
        write_sine_wav(&path, 22_050, 1, 22_050 / 2)?;

        let mut device = fast_device();
        let stats = device.stats();
        let report = play_clip(&path, &mut device, &fast_options())?;

        // Half a second at 44.1 kHz stereo, give or take the filter edges.
        let expected = 44_100 / 2 * 4;
        assert_eq!(report.bytes_pushed % 4, 0);
        assert!(report.bytes_pushed > expected * 9 / 10, "{} bytes", report.bytes_pushed);
        assert!(report.bytes_pushed <= expected + 4 * 1024, "{} bytes", report.bytes_pushed);
        assert_eq!(stats.bytes_mixed(), report.bytes_pushed as u64);
        Ok(())
    }

    #[test]
    fn test_empty_clip_never_starts_device() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.wav");
        write_sine_wav(&path, 44_100, 2, 0)?;

        let mut device = fast_device();
        let stats = device.stats();
        let report = play_clip(&path, &mut device, &fast_options())?;

        assert_eq!(report.bytes_pushed, 0);
        assert!(!report.device_started);
        assert_eq!(stats.periods(), 0);
        Ok(())
    }

    #[test]
    fn test_missing_file_fails_before_device_setup() {
        let dir = tempdir().expect("tempdir");
        let mut device = fast_device();
        let stats = device.stats();
        let result = play_clip(&dir.path().join("nope.mp3"), &mut device, &fast_options());

        assert!(matches!(result, Err(AudioError::OpenError(_, _))));
        assert_eq!(stats.periods(), 0);
    }

    #[test]
    fn test_garbage_file_is_rejected() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("noise.mp3");
        std::fs::write(&path, b"definitely not an audio container")?;

        let mut device = fast_device();
        assert!(play_clip(&path, &mut device, &fast_options()).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_dispatcher_plays_events_concurrently() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        for event in [SoundEvent::RecordStart, SoundEvent::BufferSaved] {
            write_sine_wav(dir.path().join(event.file_name()), 44_100, 2, 2205)?;
        }

        let totals: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&totals);
        let factory: DeviceFactory = Arc::new(move || {
            let inner = fast_device();
            let stats = inner.stats();
            let sink = Arc::clone(&sink);
            let on_stop = Box::new(move || sink.lock().expect("totals").push(stats.bytes_mixed()));
            Box::new(ReportingDevice { inner, on_stop }) as Box<dyn OutputDevice>
        });

        let mut player = EventPlayer::new(SoundLibrary::new(dir.path()), fast_options(), factory);
        player.trigger(SoundEvent::RecordStart).await;
        player.trigger(SoundEvent::BufferSaved).await;
        player.shutdown().await;

        assert_eq!(*totals.lock().expect("totals"), vec![2205 * 4, 2205 * 4]);
        Ok(())
    }

    /// Null output that reports its byte total when the session closes it.
    struct ReportingDevice {
        inner: NullOutput,
        on_stop: Box<dyn FnMut() + Send>,
    }

    impl OutputDevice for ReportingDevice {
        fn configure(&mut self, spec: OutputSpec, callback: FillCallback) -> Result<(), AudioError> {
            self.inner.configure(spec, callback)
        }

        fn start(&mut self) -> Result<(), AudioError> {
            self.inner.start()
        }

        fn stop(&mut self) {
            self.inner.stop();
            (self.on_stop)();
        }
    }
}
