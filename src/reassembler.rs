//! Rebuilds an ordered byte stream from spans that may arrive out of order,
//! overlap one another, or arrive more than once.
//!
//! ```text
//!            pushed          pushed + available capacity
//!            v               v
//! ---########________________--------> stream index
//!
//! #: written to the output stream
//! _: acceptable, held as pending spans until contiguous
//! -: discarded on arrival
//! ```

use crate::byte_stream::{ByteStream, Reader};
use std::collections::BTreeMap;

/// Writes spans of a byte stream into a [`ByteStream`] in index order.
#[derive(Debug, Clone)]
pub struct Reassembler {
    output: ByteStream,
    /// Spans that cannot be written yet, keyed by the stream index of their
    /// first byte. No two spans overlap or touch.
    pending: BTreeMap<u64, Vec<u8>>,
    /// Sum of the lengths of the pending spans
    bytes_pending: u64,
    /// One past the index of the last byte of the stream, once known
    end: Option<u64>,
}

impl Reassembler {
    /// Creates a reassembler that writes into `output`.
    pub fn new(output: ByteStream) -> Self {
        Self {
            output,
            pending: BTreeMap::new(),
            bytes_pending: 0,
            end: None,
        }
    }

    /// Inserts the bytes of `data`, the first of which has stream index
    /// `first_index`. `is_last` marks `data` as ending the stream.
    ///
    /// Bytes that were already written, that do not fit in the output's
    /// available capacity, or that lie past the end of the stream are
    /// dropped. Nothing is ever rejected outright.
    pub fn insert(&mut self, first_index: u64, data: impl Into<Vec<u8>>, is_last: bool) {
        let mut data = data.into();
        let first_unassembled = self.output.bytes_pushed();
        let mut first_unacceptable = first_unassembled + self.output.available_capacity();
        let data_end = first_index + data.len() as u64;

        if data_end < first_unassembled || first_index >= first_unacceptable {
            return;
        }

        if is_last && self.end.is_none() {
            self.end = Some(data_end);
            self.discard_pending_from(data_end);
        }
        if let Some(end) = self.end {
            first_unacceptable = first_unacceptable.min(end);
        }

        if first_index < first_unacceptable {
            if data_end > first_unacceptable {
                data.truncate((first_unacceptable - first_index) as usize);
            }

            let mut start = first_index;
            if start < first_unassembled {
                data.drain(..(first_unassembled - start) as usize);
                start = first_unassembled;
            }

            if start == first_unassembled {
                self.output.writer().push(data);
                self.flush_pending();
            } else {
                self.store_pending(start, data);
            }
        }

        if self.end == Some(self.output.bytes_pushed()) {
            self.output.writer().close();
        }
    }

    /// Drops every pending byte at or past stream index `end`.
    fn discard_pending_from(&mut self, end: u64) {
        for (_, bytes) in self.pending.split_off(&end) {
            self.bytes_pending -= bytes.len() as u64;
        }
        if let Some((&start, bytes)) = self.pending.iter_mut().next_back() {
            let span_end = start + bytes.len() as u64;
            if span_end > end {
                self.bytes_pending -= span_end - end;
                bytes.truncate((end - start) as usize);
            }
        }
    }

    /// Writes out pending spans that the write frontier has reached.
    fn flush_pending(&mut self) {
        while let Some(entry) = self.pending.first_entry() {
            let frontier = self.output.bytes_pushed();
            let start = *entry.key();
            if start > frontier {
                break;
            }

            let mut bytes = entry.remove();
            self.bytes_pending -= bytes.len() as u64;
            let span_end = start + bytes.len() as u64;
            if span_end > frontier {
                bytes.drain(..(frontier - start) as usize);
                self.output.writer().push(bytes);
            }
        }
    }

    /// Adds a span to the pending set, coalescing it with any span it
    /// overlaps or touches.
    fn store_pending(&mut self, start: u64, data: Vec<u8>) {
        if data.is_empty() {
            return;
        }

        let mut start = start;
        let mut bytes = data;

        // Only the nearest span at or before `start` can reach it
        let left = self
            .pending
            .range(..=start)
            .next_back()
            .map(|(&left_start, left_bytes)| (left_start, left_start + left_bytes.len() as u64));
        if let Some((left_start, left_end)) = left {
            if left_end >= start + bytes.len() as u64 {
                // Already held in full
                return;
            }
            if left_end >= start {
                if let Some(mut merged) = self.pending.remove(&left_start) {
                    self.bytes_pending -= merged.len() as u64;
                    merged.extend_from_slice(&bytes[(left_end - start) as usize..]);
                    start = left_start;
                    bytes = merged;
                }
            }
        }

        // Absorb every span the new one reaches
        loop {
            let end = start + bytes.len() as u64;
            let right = self
                .pending
                .range(start..)
                .next()
                .map(|(&right_start, right_bytes)| {
                    (right_start, right_start + right_bytes.len() as u64)
                });
            let Some((right_start, right_end)) = right else {
                break;
            };
            if right_start > end {
                break;
            }
            let Some(right_bytes) = self.pending.remove(&right_start) else {
                break;
            };
            self.bytes_pending -= right_bytes.len() as u64;
            if right_end > end {
                bytes.extend_from_slice(&right_bytes[(end - right_start) as usize..]);
            }
        }

        self.bytes_pending += bytes.len() as u64;
        self.pending.insert(start, bytes);
    }

    /// How many bytes are held in the reassembler itself, waiting for the
    /// bytes before them.
    pub fn bytes_pending(&self) -> u64 {
        self.bytes_pending
    }

    /// The read-side handle of the output stream.
    pub fn reader(&mut self) -> Reader<'_> {
        self.output.reader()
    }

    /// The output stream, for inspection.
    pub fn output(&self) -> &ByteStream {
        &self.output
    }
}
