//! The chunk ring shared between a producing thread and a real paced device.

use srbeep::audio::mixer::fill_from_ring;
use srbeep::audio::{AudioChunk, ChunkRing, NullOutput, OutputDevice, OutputSpec, CHUNK_BYTES, RING_CAPACITY};
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[cfg(test)]
mod ring_buffer_integration_tests {
    use super::*;

    #[test]
    fn test_paced_device_drains_everything_pushed() -> Result<(), Box<dyn Error>> {
        let ring = Arc::new(ChunkRing::new());
        let consumer_ring = Arc::clone(&ring);
        let mut device = NullOutput::with_pace(Duration::from_micros(100));
        let stats = device.stats();
        device.configure(
            OutputSpec::with_period_frames(300),
            Box::new(move |out: &mut [u8]| fill_from_ring(out, &consumer_ring)),
        )?;
        device.start()?;

        let total = 3 * RING_CAPACITY * CHUNK_BYTES + 512;
        let data: Vec<u8> = (0..total).map(|i| (i % 7) as u8).collect();
        let mut rest = &data[..];
        while !rest.is_empty() {
            let (mut chunk, taken) = AudioChunk::from_slice(rest);
            rest = &rest[taken..];
            while let Err(back) = ring.push(chunk) {
                chunk = back;
                thread::sleep(Duration::from_micros(50));
            }
        }

        let deadline = Instant::now() + Duration::from_secs(10);
        while !ring.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        device.stop();

        assert!(ring.is_empty());
        assert_eq!(stats.bytes_mixed(), total as u64);
        assert!(stats.periods() >= (total / 1200) as u64);
        Ok(())
    }

    #[test]
    fn test_unstarted_device_never_consumes() -> Result<(), Box<dyn Error>> {
        let ring = Arc::new(ChunkRing::new());
        let consumer_ring = Arc::clone(&ring);
        let mut device = NullOutput::with_pace(Duration::from_micros(100));
        let stats = device.stats();
        device.configure(
            OutputSpec::default(),
            Box::new(move |out: &mut [u8]| fill_from_ring(out, &consumer_ring)),
        )?;

        ring.push(AudioChunk::from_slice(&[1; 64]).0)
            .map_err(|_| "ring unexpectedly full")?;
        thread::sleep(Duration::from_millis(20));

        assert!(!device.is_started());
        assert_eq!(ring.len(), 1);
        assert_eq!(stats.periods(), 0);
        device.stop();
        Ok(())
    }
}
