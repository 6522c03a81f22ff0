//! Connection parameters shared by the sender and receiver halves.

use crate::Wrap32;
use thiserror::Error as ThisError;

/// The largest payload carried by a single segment, in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 1000;
/// Retransmission timeout used before any backoff, in milliseconds.
pub const TIMEOUT_DFLT: u64 = 1000;
/// Byte buffer capacity used for each direction of a connection.
pub const DEFAULT_CAPACITY: u64 = 64000;
/// Consecutive retransmissions tolerated before a connection is aborted.
pub const MAX_RETX_ATTEMPTS: u64 = 8;

/// Configuration for one TCP endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpConfig {
    /// The retransmission timeout before backoff, in milliseconds
    pub initial_rto_ms: u64,
    /// The largest payload a single outgoing segment may carry
    pub max_payload_size: usize,
    /// Capacity of the outbound byte stream
    pub send_capacity: u64,
    /// Capacity of the inbound byte stream, which also bounds the advertised
    /// window
    pub recv_capacity: u64,
    /// How many consecutive retransmissions are tolerated before aborting
    pub max_retx_attempts: u64,
    /// A fixed initial sequence number. A random one is chosen when absent.
    pub isn: Option<Wrap32>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            initial_rto_ms: TIMEOUT_DFLT,
            max_payload_size: MAX_PAYLOAD_SIZE,
            send_capacity: DEFAULT_CAPACITY,
            recv_capacity: DEFAULT_CAPACITY,
            max_retx_attempts: MAX_RETX_ATTEMPTS,
            isn: None,
        }
    }
}

impl TcpConfig {
    /// Checks that every parameter allows a connection to make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_rto_ms == 0 {
            Err(ConfigError::ZeroTimeout)?
        }
        if self.max_payload_size == 0 {
            Err(ConfigError::ZeroPayloadSize)?
        }
        if self.send_capacity == 0 || self.recv_capacity == 0 {
            Err(ConfigError::ZeroCapacity)?
        }
        if self.max_retx_attempts == 0 {
            Err(ConfigError::ZeroRetransmissions)?
        }
        Ok(())
    }

    /// The configured initial sequence number, or a random one.
    pub fn isn_or_random(&self) -> Wrap32 {
        self.isn.unwrap_or_else(|| Wrap32::new(rand::random()))
    }
}

/// An error caused by an unusable [`TcpConfig`]
#[derive(Debug, ThisError, PartialEq, Eq, Clone, Copy)]
pub enum ConfigError {
    #[error("The initial retransmission timeout must be nonzero")]
    ZeroTimeout,
    #[error("The maximum payload size must be nonzero")]
    ZeroPayloadSize,
    #[error("Byte stream capacities must be nonzero")]
    ZeroCapacity,
    #[error("At least one retransmission attempt must be allowed")]
    ZeroRetransmissions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(TcpConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_degenerate_values() {
        let config = TcpConfig {
            initial_rto_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));

        let config = TcpConfig {
            max_payload_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPayloadSize));

        let config = TcpConfig {
            recv_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));

        let config = TcpConfig {
            max_retx_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetransmissions));
    }

    #[test]
    fn fixed_isn_is_used() {
        let config = TcpConfig {
            isn: Some(Wrap32::new(1234)),
            ..Default::default()
        };
        assert_eq!(config.isn_or_random(), Wrap32::new(1234));
    }
}
