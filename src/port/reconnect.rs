//! Reconnect backoff (§4.1): 1s initial, doubling to a 30s ceiling, with
//! a liveness probe attempted each cycle. 2s of consecutive successful
//! reads returns the port to `open`.

use std::time::Duration;

pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
pub const LIVENESS_WINDOW: Duration = Duration::from_secs(2);

/// Tracks the current wait between reconnect attempts for one port.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectBackoff {
    current: Duration,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            current: INITIAL_BACKOFF,
        }
    }
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wait to use for the next attempt, then advance the state for
    /// the one after that (doubling, clamped to [`MAX_BACKOFF`]).
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_BACKOFF);
        delay
    }

    /// Back to the initial 1s wait, called once the port has proven
    /// live for [`LIVENESS_WINDOW`].
    pub fn reset(&mut self) {
        self.current = INITIAL_BACKOFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_up_to_ceiling() {
        let mut backoff = ReconnectBackoff::new();
        let delays: Vec<Duration> = (0..8).map(|_| backoff.next_delay()).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
                Duration::from_secs(30),
                Duration::from_secs(30),
                Duration::from_secs(30),
            ]
        );
    }

    #[test]
    fn reset_returns_to_initial() {
        let mut backoff = ReconnectBackoff::new();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), INITIAL_BACKOFF);
    }
}
