// Chunks are the unit of storage inside a ByteStream. Each push stores its
// bytes as one chunk so that the reader can peek at contiguous memory without
// copying, and popping only advances the start of the front chunk until it is
// fully consumed. The various From impls let ByteStream::push() accept any
// common byte source.

/// An owned run of bytes pushed into a [ByteStream](super::ByteStream).
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    start: usize,
    bytes: Vec<u8>,
}

impl Chunk {
    /// Returns a new chunk containing the given bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { start: 0, bytes }
    }

    /// Returns the unconsumed bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[self.start..]
    }

    /// The number of unconsumed bytes in the chunk.
    pub fn len(&self) -> usize {
        self.bytes.len() - self.start
    }

    /// Whether the chunk contains no unconsumed bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all but the first `len` unconsumed bytes.
    pub(super) fn truncate(&mut self, len: usize) {
        self.bytes.truncate(self.start + len);
    }

    /// Marks the first `len` unconsumed bytes as consumed.
    pub(super) fn consume(&mut self, len: usize) {
        debug_assert!(len <= self.len());
        self.start += len;
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice().eq(other.as_slice())
    }
}

impl Eq for Chunk {}

impl From<Vec<u8>> for Chunk {
    fn from(vector: Vec<u8>) -> Self {
        Self::new(vector)
    }
}

impl From<&[u8]> for Chunk {
    fn from(slice: &[u8]) -> Self {
        slice.to_vec().into()
    }
}

impl<const N: usize> From<&[u8; N]> for Chunk {
    fn from(array: &[u8; N]) -> Self {
        array.as_slice().into()
    }
}

impl<const N: usize> From<[u8; N]> for Chunk {
    fn from(array: [u8; N]) -> Self {
        array.as_slice().into()
    }
}

impl From<&str> for Chunk {
    fn from(string: &str) -> Self {
        string.as_bytes().into()
    }
}

impl From<String> for Chunk {
    fn from(string: String) -> Self {
        string.into_bytes().into()
    }
}
