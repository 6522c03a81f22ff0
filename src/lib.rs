//! A reliable, in-order byte-stream transport engine in the style of TCP.
//!
//! The engine turns an application byte stream into segments, carries them
//! across a network that may drop, duplicate, or reorder them, and rebuilds
//! the same byte stream on the other side. It does no I/O and keeps no clock
//! of its own: segments, bytes, and elapsed time all arrive as arguments, and
//! outgoing segments leave through a callback supplied at the call site.
//!
//! # Organization
//! - [`Wrap32`] converts between 64-bit stream indices and 32-bit wire
//!   sequence numbers
//! - [`ByteStream`] is the bounded buffer, written through a [`Writer`] and
//!   drained through a [`Reader`]
//! - [`Reassembler`] rebuilds a stream from out-of-order, overlapping spans
//! - [`Receiver`] turns inbound segments into stream bytes and reports an
//!   acknowledgment and window
//! - [`Sender`] turns stream bytes into segments and retransmits them until
//!   they are acknowledged
//! - [`TcpPeer`] pairs a sender and a receiver into one endpoint
//!
//! # Data flow
//!
//! ```text
//!  application --> Writer --> Sender --SenderMessage--> Receiver --> Reader --> application
//!                               ^                          |
//!                               +-----ReceiverMessage------+
//! ```

mod logging;
pub use logging::init_events;

pub mod config;
pub use config::{ConfigError, TcpConfig};

pub mod wrap32;
pub use wrap32::Wrap32;

pub mod byte_stream;
pub use byte_stream::{ByteStream, Reader, Writer};

pub mod reassembler;
pub use reassembler::Reassembler;

pub mod message;
pub use message::{ReceiverMessage, SenderMessage, TcpSegment};

pub mod receiver;
pub use receiver::Receiver;

pub mod sender;
pub use sender::Sender;

pub mod peer;
pub use peer::TcpPeer;
