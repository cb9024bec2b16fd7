//! Circuit entity (§3): relays, lights, and other on/off switched loads.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CircuitFunction {
    Generic,
    Pool,
    Spa,
    Light,
    SpillWay,
    MasterCleaner,
    Chemical,
    Aux,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub id: Id,
    pub name: String,
    pub function: CircuitFunction,
    pub show_in_features: bool,
    /// Freeze-protect: the board may force this circuit on regardless of
    /// user intent when ambient temperature drops below its threshold.
    pub freeze_protect: bool,
    /// Egg-timer default run duration in minutes; 0 means "runs until
    /// explicitly turned off".
    pub egg_timer_minutes: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitState {
    pub id: Id,
    pub is_on: bool,
    /// Minutes-since-midnight the egg timer will turn this circuit off,
    /// present only while a timed run is active.
    pub end_time: Option<u16>,
    pub lighting_theme: Option<u8>,
}
