//! Translation between the 64-bit absolute stream index space and the 32-bit
//! sequence numbers carried on the wire.
//!
//! ```text
//!  absolute   0    1    2   ...   2^32-1   2^32   2^32+1  ...
//!  seqno     ISN ISN+1 ISN+2 ... ISN-1     ISN    ISN+1   ...
//! ```
//!
//! Going right is a plain wrapping addition. Going left is ambiguous, so an
//! absolute `checkpoint` known to be close to the answer picks the candidate.

use std::{fmt::Display, ops::Add};

const CYCLE: u64 = 1 << 32;
const HALF_CYCLE: u64 = 1 << 31;

/// A 32-bit sequence number as carried in a segment header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wrap32(u32);

impl Wrap32 {
    /// Creates a sequence number from its raw wire value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw wire value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Converts an absolute index into the sequence number that represents it
    /// relative to `zero_point`.
    pub fn wrap(absolute: u64, zero_point: Wrap32) -> Self {
        zero_point + absolute as u32
    }

    /// Converts this sequence number back into the absolute index closest to
    /// `checkpoint`. When the two nearest candidates are equally far from the
    /// checkpoint, the higher one wins.
    pub fn unwrap(self, zero_point: Wrap32, checkpoint: u64) -> u64 {
        let offset = self.0.wrapping_sub(zero_point.0) as u64;
        // Same cycle as the checkpoint
        let candidate = (checkpoint & !(CYCLE - 1)) | offset;

        if candidate > checkpoint {
            if candidate - checkpoint > HALF_CYCLE && candidate >= CYCLE {
                candidate - CYCLE
            } else {
                candidate
            }
        } else if checkpoint - candidate >= HALF_CYCLE {
            candidate.checked_add(CYCLE).unwrap_or(candidate)
        } else {
            candidate
        }
    }
}

impl Add<u32> for Wrap32 {
    type Output = Wrap32;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.wrapping_add(rhs))
    }
}

impl From<u32> for Wrap32 {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<Wrap32> for u32 {
    fn from(seqno: Wrap32) -> Self {
        seqno.0
    }
}

impl Display for Wrap32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
