//! Notification playback: decode on a worker thread, mix from a ring buffer on
//! the device thread.

pub mod chunk;
pub mod decoder;
pub mod error;
pub mod mixer;
pub mod output;
pub mod producer;
pub mod resampler;
pub mod ring_buffer;
pub mod session;
pub mod source;

pub use chunk::{AudioChunk, CHUNK_BYTES};
pub use error::AudioError;
pub use output::{open_device, AlsaOutput, FillCallback, NullOutput, OutputDevice, OutputSpec, SampleFormat};
pub use producer::{ProduceReport, Producer, ProducerOptions};
pub use ring_buffer::{FillState, LockedTop, RingBuffer, Storage, SyncRingBuffer};
pub use session::{play_clip, play_source, ChunkRing, SessionOptions, RING_CAPACITY};
pub use source::{ClipSource, PcmBlock, PcmSource};
