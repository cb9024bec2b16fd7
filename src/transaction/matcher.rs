//! Response matcher (§4.4): keys an in-flight transaction on `(peer,
//! action, correlating-id)` as declared by its outbound message's
//! expected-response descriptor, with a per-message timeout and retry
//! budget.

use std::collections::HashMap;
use std::time::Duration;

/// Identifies which inbound frame would complete a given outbound
/// transaction. `correlating_id` is protocol-specific (e.g. an entity
/// id embedded in the payload) and is declared by the Board's message
/// encoder alongside the frame it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub peer: u8,
    pub action: u8,
    pub correlating_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: [Duration; 3],
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1500),
            max_retries: 3,
            backoff: [
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_millis(1000),
            ],
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait before the `attempt`-th retry (1-based). Clamps
    /// to the last entry if somehow asked for more than provisioned.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let idx = attempt.saturating_sub(1) as usize;
        self.backoff[idx.min(self.backoff.len() - 1)]
    }
}

/// A pending response slot. The transaction engine inserts one when it
/// transmits a message with an expected-response descriptor, and removes
/// it either on a matching inbound frame or on timeout/retry exhaustion.
pub struct PendingMatch<T> {
    pub key: ResponseKey,
    pub attempts: u32,
    pub payload: T,
}

/// Registry of in-flight response keys for one port. `T` is whatever
/// the transaction engine needs to resume (typically a completion
/// channel or a transaction id).
#[derive(Default)]
pub struct ResponseMatcher<T> {
    pending: HashMap<ResponseKey, PendingMatch<T>>,
}

impl<T> ResponseMatcher<T> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: ResponseKey, payload: T) {
        self.pending.insert(
            key,
            PendingMatch {
                key,
                attempts: 1,
                payload,
            },
        );
    }

    /// An inbound frame arrived; attempt to complete a pending
    /// transaction. Returns the matched payload on success, leaving
    /// unmatched frames for the caller to route to Board Dispatch as
    /// spontaneous status.
    pub fn complete(&mut self, key: ResponseKey) -> Option<T> {
        self.pending.remove(&key).map(|m| m.payload)
    }

    pub fn is_pending(&self, key: &ResponseKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Bump the retry counter for a timed-out key, returning the new
    /// attempt count, or `None` if the key isn't pending.
    pub fn record_retry(&mut self, key: &ResponseKey) -> Option<u32> {
        let entry = self.pending.get_mut(key)?;
        entry.attempts += 1;
        Some(entry.attempts)
    }

    pub fn abandon(&mut self, key: &ResponseKey) -> Option<T> {
        self.pending.remove(key).map(|m| m.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_complete_round_trips() {
        let mut matcher = ResponseMatcher::new();
        let key = ResponseKey {
            peer: 0x10,
            action: 0x86,
            correlating_id: 6,
        };
        matcher.register(key, "setCircuitState(6,true)");
        assert!(matcher.is_pending(&key));
        assert_eq!(matcher.complete(key), Some("setCircuitState(6,true)"));
        assert!(!matcher.is_pending(&key));
    }

    #[test]
    fn backoff_schedule_matches_spec_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(250));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(1000));
    }
}
