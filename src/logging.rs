//! Logging holds wrapper functions for logging events.
//! Each function corresponds to a type of logging (segments sent, segments
//! received). These functions are meant to be called from inside the engine.

use crate::message::TcpSegment;
use tracing::{event, subscriber::SetGlobalDefaultError, Level};
use tracing_subscriber::FmtSubscriber;

/// Installs a JSON event subscriber as the global default. Should only be
/// called once by the host program, before any connection is driven.
pub fn init_events() -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .json()
        .finish();
    // set the global default so all events go to the same subscriber
    tracing::subscriber::set_global_default(subscriber)
}

/// Segment event handler.
/// Used to log every segment a peer emits or accepts. Captures the following
/// data: direction, seqno, ackno, window, control bits, payload length
pub(crate) fn segment_event(direction: &'static str, segment: &TcpSegment) {
    let sender = &segment.sender;
    let receiver = &segment.receiver;
    event!(
        target: "SEGMENT",
        Level::TRACE,
        direction,
        seqno = sender.seqno.raw(),
        ackno = receiver.ackno.map(|ackno| ackno.raw()),
        window = receiver.window_size,
        syn = sender.syn,
        fin = sender.fin,
        rst = sender.rst || receiver.rst,
        len = sender.payload.len(),
    );
}
