//! A bounded, in-memory byte stream.
//!
//! This module primarily implements the [`ByteStream`] buffer. Bytes are
//! written at one end through a [`Writer`] and read from the other end through
//! a [`Reader`]. The two handles split the capabilities of the stream: only a
//! writer can push or close, and only a reader can peek or pop. Both can
//! observe the stream's counters and raise its error flag.

use std::{collections::VecDeque, ops::Deref};

mod chunk;
pub use chunk::Chunk;

/// A fixed-capacity FIFO of bytes.
///
/// The stream never holds more than `capacity` bytes. Pushing past the
/// capacity is not an error; the excess is dropped and the caller can see how
/// much was accepted from [`bytes_pushed`](Self::bytes_pushed).
#[derive(Debug, Clone, Default)]
pub struct ByteStream {
    capacity: u64,
    chunks: VecDeque<Chunk>,
    buffered: u64,
    pushed: u64,
    popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    /// Creates an empty stream that holds at most `capacity` bytes.
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// The write-side handle.
    pub fn writer(&mut self) -> Writer<'_> {
        Writer(self)
    }

    /// The read-side handle.
    pub fn reader(&mut self) -> Reader<'_> {
        Reader(self)
    }

    /// The capacity the stream was created with.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// How many more bytes the stream can accept right now.
    pub fn available_capacity(&self) -> u64 {
        self.capacity - self.buffered
    }

    /// Bytes pushed and not yet popped.
    pub fn bytes_buffered(&self) -> u64 {
        self.buffered
    }

    /// Total bytes ever accepted by the stream.
    pub fn bytes_pushed(&self) -> u64 {
        self.pushed
    }

    /// Total bytes ever popped from the stream.
    pub fn bytes_popped(&self) -> u64 {
        self.popped
    }

    /// Whether the writer has closed the stream.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the stream is closed and every byte has been popped.
    pub fn is_finished(&self) -> bool {
        self.closed && self.buffered == 0
    }

    /// Whether either side has marked the stream as unusable.
    pub fn has_error(&self) -> bool {
        self.error
    }

    fn push(&mut self, mut data: Chunk) {
        let len = (data.len() as u64).min(self.available_capacity());
        if len == 0 {
            return;
        }
        data.truncate(len as usize);
        self.buffered += len;
        self.pushed += len;
        self.chunks.push_back(data);
    }

    fn peek(&self) -> &[u8] {
        self.chunks.front().map(Chunk::as_slice).unwrap_or_default()
    }

    fn pop(&mut self, len: u64) {
        let mut remaining = len.min(self.buffered);
        while remaining > 0 {
            let Some(front) = self.chunks.front_mut() else {
                break;
            };
            let front_len = front.len() as u64;
            if remaining < front_len {
                front.consume(remaining as usize);
                self.buffered -= remaining;
                self.popped += remaining;
                return;
            }
            self.chunks.pop_front();
            remaining -= front_len;
            self.buffered -= front_len;
            self.popped += front_len;
        }
    }
}

/// The producing end of a [`ByteStream`].
#[derive(Debug)]
pub struct Writer<'a>(&'a mut ByteStream);

impl<'a> Writer<'a> {
    /// Appends as much of `data` as fits in the available capacity and drops
    /// the rest. Must not be called after [`close`](Self::close).
    pub fn push(&mut self, data: impl Into<Chunk>) {
        self.0.push(data.into());
    }

    /// Signals that no more bytes will be written.
    pub fn close(&mut self) {
        self.0.closed = true;
    }

    /// Marks the stream as unusable.
    pub fn set_error(&mut self) {
        self.0.error = true;
    }
}

impl<'a> Deref for Writer<'a> {
    type Target = ByteStream;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

/// The consuming end of a [`ByteStream`].
#[derive(Debug)]
pub struct Reader<'a>(&'a mut ByteStream);

impl<'a> Reader<'a> {
    /// The bytes at the front of the stream, as one contiguous slice. May be
    /// shorter than [`bytes_buffered`](ByteStream::bytes_buffered); pop what
    /// was read and peek again for more.
    pub fn peek(&self) -> &[u8] {
        self.0.peek()
    }

    /// Discards up to `len` bytes from the front of the stream.
    pub fn pop(&mut self, len: u64) {
        self.0.pop(len);
    }

    /// Marks the stream as unusable.
    pub fn set_error(&mut self) {
        self.0.error = true;
    }

    /// Pops every buffered byte into a single vector.
    pub fn read_to_end(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.buffered as usize);
        while !self.peek().is_empty() {
            let front = self.peek();
            let len = front.len() as u64;
            out.extend_from_slice(front);
            self.pop(len);
        }
        out
    }
}

impl<'a> Deref for Reader<'a> {
    type Target = ByteStream;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_truncates_at_capacity() {
        let mut stream = ByteStream::new(2);
        stream.writer().push("cat");
        assert_eq!(stream.bytes_buffered(), 2);
        assert_eq!(stream.available_capacity(), 0);
        assert_eq!(stream.bytes_pushed(), 2);
        assert_eq!(stream.reader().peek(), b"ca");

        stream.writer().push("t");
        assert_eq!(stream.bytes_pushed(), 2);
    }

    #[test]
    fn pop_spans_chunks() {
        let mut stream = ByteStream::new(15);
        stream.writer().push("hello");
        stream.writer().push(", ");
        stream.writer().push("world");
        assert_eq!(stream.reader().peek(), b"hello");

        stream.reader().pop(6);
        assert_eq!(stream.reader().peek(), b" ");
        assert_eq!(stream.bytes_popped(), 6);
        assert_eq!(stream.bytes_buffered(), 6);

        stream.reader().pop(100);
        assert_eq!(stream.reader().peek(), b"");
        assert_eq!(stream.bytes_popped(), 12);
        assert_eq!(stream.bytes_buffered(), 0);
    }

    #[test]
    fn empty_push_leaves_no_chunk() {
        let mut stream = ByteStream::new(4);
        stream.writer().push("");
        stream.writer().push("ab");
        assert_eq!(stream.reader().peek(), b"ab");
    }

    #[test]
    fn finished_after_close_and_drain() {
        let mut stream = ByteStream::new(8);
        stream.writer().push("ab");
        stream.writer().close();
        assert!(stream.is_closed());
        assert!(!stream.is_finished());

        assert_eq!(stream.reader().read_to_end(), b"ab");
        assert!(stream.is_finished());

        stream.writer().close();
        assert!(stream.is_closed());
    }

    #[test]
    fn error_is_shared() {
        let mut stream = ByteStream::new(8);
        stream.reader().set_error();
        assert!(stream.writer().has_error());
        stream.writer().set_error();
        assert!(stream.has_error());
    }
}
