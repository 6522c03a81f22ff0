/// The retransmission timer of a [`Sender`](super::Sender).
///
/// The timer keeps no clock of its own. The owner advances it with
/// [`tick`](Self::tick), and it only accumulates time while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetransmissionTimer {
    /// Current timeout, in milliseconds
    rto_ms: u64,
    /// Time accumulated since the timer was last reset, in milliseconds
    elapsed_ms: u64,
    active: bool,
}

impl RetransmissionTimer {
    /// Creates an inactive timer with the given timeout.
    pub fn new(rto_ms: u64) -> Self {
        Self {
            rto_ms,
            elapsed_ms: 0,
            active: false,
        }
    }

    /// Starts accumulating time, if not already.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Doubles the timeout.
    pub fn back_off(&mut self) {
        self.rto_ms = self.rto_ms.saturating_mul(2);
    }

    /// Restarts the count of elapsed time.
    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
    }

    /// Accumulates `ms` milliseconds if the timer is active.
    pub fn tick(&mut self, ms: u64) {
        if self.active {
            self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
        }
    }

    /// Whether the timeout has run out.
    pub fn is_expired(&self) -> bool {
        self.active && self.elapsed_ms > self.rto_ms
    }

    /// The current timeout, in milliseconds.
    pub fn rto_ms(&self) -> u64 {
        self.rto_ms
    }
}
