//! Consumer side: fills device buffers from the chunk ring.
//!
//! Runs on the output device's real-time thread. Touches only bytes already
//! sitting in the ring: no I/O, no decoding, no allocation.

use crate::audio::chunk::AudioChunk;
use crate::audio::ring_buffer::SyncRingBuffer;
use tracing::trace;

const LOG_TARGET: &str = "srbeep::audio::mixer";

/// Additively mixes native-endian signed 16-bit samples from `src` into `dst`
/// at full volume, clipping to the sample range.
///
/// Mixes `min(dst.len(), src.len())` bytes, which must be whole samples.
pub fn mix_s16(dst: &mut [u8], src: &[u8]) {
    let n = dst.len().min(src.len());
    debug_assert_eq!(n % 2, 0, "mix length splits a sample");
    for (d, s) in dst[..n].chunks_exact_mut(2).zip(src[..n].chunks_exact(2)) {
        let mixed = i16::from_ne_bytes([d[0], d[1]]).saturating_add(i16::from_ne_bytes([s[0], s[1]]));
        d.copy_from_slice(&mixed.to_ne_bytes());
    }
}

/// Fills `out` from the ring, retiring chunks as they are exhausted.
///
/// `out` is zeroed first, so whatever the ring cannot supply stays silent.
/// Returns the number of bytes taken from the ring.
pub fn fill_from_ring<const N: usize>(out: &mut [u8], ring: &SyncRingBuffer<AudioChunk, N>) -> usize {
    out.fill(0);

    let mut stream_offset = 0;
    while stream_offset < out.len() {
        let mut front = ring.locked_top();
        let Some(chunk) = front.get_mut() else {
            break;
        };
        let mix_size = (out.len() - stream_offset).min(chunk.unread().len());
        mix_s16(&mut out[stream_offset..stream_offset + mix_size], &chunk.unread()[..mix_size]);
        chunk.advance(mix_size);
        stream_offset += mix_size;

        if chunk.is_consumed() {
            front.pop();
        } else {
            drop(front);
        }

        if ring.is_empty() {
            break;
        }
    }

    if stream_offset < out.len() {
        trace!(target: LOG_TARGET, "Ring ran dry: {} of {} bytes filled", stream_offset, out.len());
    }
    stream_offset
}
