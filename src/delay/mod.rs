//! Delay Manager (§4.7): a keyed registry of active timers plus a small
//! table of declarative interlock rules. Operations that hit an active
//! timer either fail fast (`immediate`) or await the remainder — the
//! async equivalent of "enqueued into a pending slot and applied when
//! the delay clears".

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::DelayError;
use crate::model::{EntityKind, Id};

/// Startup staggering keeps high-current loads from switching on within
/// this window of one another (§4.7).
pub const STARTUP_STAGGER: Duration = Duration::from_secs(2);
pub const PUMP_CHANGE_COOLDOWN: Duration = Duration::from_secs(30);
pub const HEATER_CHANGE_COOLDOWN: Duration = Duration::from_secs(120);
pub const CIRCUIT_CHANGE_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    StartupStagger,
    ChangeCooldown,
    HeaterCooldown,
}

impl Purpose {
    pub fn name(self) -> &'static str {
        match self {
            Self::StartupStagger => "startup-stagger",
            Self::ChangeCooldown => "change-cooldown",
            Self::HeaterCooldown => "heater-cooldown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DelayKey {
    pub kind: EntityKind,
    pub id: Id,
    pub purpose: Purpose,
}

/// A named interlock rule: when `active` is asserted true, `excluded`
/// may not be started (§4.7 example: `spa-heat` excludes `pool-heat`).
#[derive(Debug, Clone, Copy)]
pub struct InterlockRule {
    pub active: &'static str,
    pub excludes: &'static str,
}

pub struct DelayManager {
    timers: Mutex<HashMap<DelayKey, Instant>>,
    interlocks: Mutex<HashMap<&'static str, bool>>,
    rules: Vec<InterlockRule>,
}

impl DelayManager {
    pub fn new(rules: Vec<InterlockRule>) -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            interlocks: Mutex::new(HashMap::new()),
            rules,
        }
    }

    /// Start (or restart) a timer under `key`, expiring `duration` from now.
    pub fn start_timer(&self, key: DelayKey, duration: Duration) {
        self.timers
            .lock()
            .unwrap()
            .insert(key, Instant::now() + duration);
    }

    pub fn remaining(&self, key: DelayKey) -> Duration {
        self.timers
            .lock()
            .unwrap()
            .get(&key)
            .map_or(Duration::ZERO, |until| {
                until.saturating_duration_since(Instant::now())
            })
    }

    /// Assert or clear a named interlock flag (e.g. "spa-heat" becomes
    /// active the moment spa heating starts).
    pub fn set_interlock(&self, name: &'static str, active: bool) {
        self.interlocks.lock().unwrap().insert(name, active);
    }

    /// Check whether `name` is currently excluded by an active rule.
    /// Returns the conflicting key in the error, matching §8 scenario 4.
    pub fn check_interlock(&self, name: &'static str) -> Result<(), DelayError> {
        let interlocks = self.interlocks.lock().unwrap();
        for rule in &self.rules {
            if rule.excludes == name && interlocks.get(rule.active).copied().unwrap_or(false) {
                return Err(DelayError::InterlockActive {
                    conflicting_key: rule.active.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Synchronous fail-fast check equivalent to `gate(key, true)` but
    /// usable outside an async context (§4.7: Standalone's dispatch has
    /// no queue to await against).
    pub fn check_cooldown(&self, key: DelayKey) -> Result<(), DelayError> {
        let remaining = self.remaining(key);
        if remaining.is_zero() {
            return Ok(());
        }
        Err(DelayError::CooldownActive {
            kind: key.kind,
            id: key.id,
            purpose: key.purpose.name(),
            remaining_ms: remaining.as_millis() as u64,
        })
    }

    /// Gate an operation behind `key`'s active timer. With no active
    /// timer (or one that already expired), returns immediately. With an
    /// active timer: `immediate` fails fast with `CooldownActive`;
    /// otherwise the call awaits the remainder before returning `Ok`.
    pub async fn gate(&self, key: DelayKey, immediate: bool) -> Result<(), DelayError> {
        if immediate {
            return self.check_cooldown(key);
        }
        let remaining = self.remaining(key);
        if remaining.is_zero() {
            return Ok(());
        }
        tokio::time::sleep(remaining).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> DelayKey {
        DelayKey {
            kind: EntityKind::Pump,
            id: 1,
            purpose: Purpose::ChangeCooldown,
        }
    }

    #[tokio::test]
    async fn immediate_call_fails_fast_while_cooldown_active() {
        let manager = DelayManager::new(Vec::new());
        manager.start_timer(key(), Duration::from_millis(200));
        let err = manager.gate(key(), true).await.unwrap_err();
        assert!(matches!(err, DelayError::CooldownActive { .. }));
    }

    #[tokio::test]
    async fn non_immediate_call_waits_out_the_remainder() {
        let manager = DelayManager::new(Vec::new());
        manager.start_timer(key(), Duration::from_millis(50));
        let started = std::time::Instant::now();
        manager.gate(key(), false).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn active_interlock_blocks_excluded_operation() {
        let manager = DelayManager::new(vec![InterlockRule {
            active: "spa-heat",
            excludes: "pool-heat",
        }]);
        manager.set_interlock("spa-heat", true);
        let err = manager.check_interlock("pool-heat").unwrap_err();
        assert!(matches!(err, DelayError::InterlockActive { conflicting_key } if conflicting_key == "spa-heat"));
    }

    #[tokio::test]
    async fn interlock_clears_once_deasserted() {
        let manager = DelayManager::new(vec![InterlockRule {
            active: "spa-heat",
            excludes: "pool-heat",
        }]);
        manager.set_interlock("spa-heat", true);
        manager.set_interlock("spa-heat", false);
        assert!(manager.check_interlock("pool-heat").is_ok());
    }
}
