/// Bytes held by one chunk.
pub const CHUNK_BYTES: usize = 1024;

/// One fixed-size unit of already-resampled PCM, moved by value into a ring
/// buffer slot.
#[derive(Clone)]
pub struct AudioChunk {
    data: [u8; CHUNK_BYTES],
    /// Valid bytes in `data`.
    len: usize,
    /// Bytes already consumed by the reader; never exceeds `len`.
    offset: usize,
}

impl AudioChunk {
    pub const fn capacity() -> usize {
        CHUNK_BYTES
    }

    /// Copies up to [`CHUNK_BYTES`] from the front of `bytes` into a fresh
    /// chunk. Returns the chunk and the number of bytes taken.
    pub fn from_slice(bytes: &[u8]) -> (Self, usize) {
        let len = bytes.len().min(CHUNK_BYTES);
        let mut chunk = Self::default();
        chunk.data[..len].copy_from_slice(&bytes[..len]);
        chunk.len = len;
        (chunk, len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The bytes not yet consumed.
    pub fn unread(&self) -> &[u8] {
        &self.data[self.offset..self.len]
    }

    /// Marks `n` more bytes as consumed, clamped to what is left.
    pub fn advance(&mut self, n: usize) {
        self.offset = (self.offset + n).min(self.len);
    }

    pub fn is_consumed(&self) -> bool {
        self.offset == self.len
    }
}

impl Default for AudioChunk {
    fn default() -> Self {
        Self {
            data: [0; CHUNK_BYTES],
            len: 0,
            offset: 0,
        }
    }
}

impl std::fmt::Debug for AudioChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioChunk")
            .field("len", &self.len)
            .field("offset", &self.offset)
            .finish()
    }
}
