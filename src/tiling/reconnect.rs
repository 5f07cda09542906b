//! Reconnect policy and connection state for the tiling socket.
//!
//! Pure state machine: no IO, no clock. The agent reports transitions and
//! receives the delay to sleep before the next connect.

use std::time::Duration;

/// Exponential backoff with a retry ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Failures tolerated before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting `delay` before retry number `attempt`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Retry ceiling reached; only re-enabling starts over.
    GivenUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry { delay: Duration },
    GiveUp,
}

#[derive(Debug, Clone)]
pub struct ReconnectTracker {
    policy: ReconnectPolicy,
    attempt: u32,
    state: ConnectionState,
}

impl ReconnectTracker {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// Socket opened: the failure count starts over.
    pub fn opened(&mut self) {
        self.attempt = 0;
        self.state = ConnectionState::Connected;
    }

    /// Record a connect failure, error, or close.
    pub fn failed(&mut self) -> ReconnectDecision {
        if self.attempt >= self.policy.max_attempts {
            self.state = ConnectionState::GivenUp;
            return ReconnectDecision::GiveUp;
        }
        let delay = self.policy.delay_for(self.attempt);
        self.attempt += 1;
        self.state = ConnectionState::Reconnecting {
            attempt: self.attempt,
            delay,
        };
        ReconnectDecision::Retry { delay }
    }

    /// Feature turned off. Forgets all failure history.
    pub fn disable(&mut self) {
        self.attempt = 0;
        self.state = ConnectionState::Disconnected;
    }
}
