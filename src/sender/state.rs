/// The progress of a [`Sender`](super::Sender) through its stream.
///
/// ```text
/// +------+  push   +----------+  SYN acked  +-------------+  FIN sent  +----------+
/// | IDLE |-------->| SYN-SENT |------------>| ESTABLISHED |----------->| FIN-SENT |
/// +------+         +----------+             +-------------+            +----------+
///                        |                                                  ^
///                        +------------- stream already finished ------------+
/// ```
///
/// Transitions only move to the right. Once FIN has been sent, the only
/// remaining activity is retransmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Nothing has been sent yet.
    Idle,
    /// SYN has been sent but not acknowledged.
    SynSent,
    /// SYN has been acknowledged and stream bytes are flowing.
    Established,
    /// A segment carrying FIN has been sent. No new data will follow.
    FinSent,
}
