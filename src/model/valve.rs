//! Valve entity (§3): intake/return valves, mostly on IntelliCenter-class
//! controllers with extensive valve configuration.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValveConfig {
    pub id: Id,
    pub circuit: Id,
    pub name: String,
    pub is_intake: bool,
    pub is_return: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValveState {
    pub id: Id,
    pub is_on: bool,
    /// Percent open (0-100) for variants that report intermediate valve
    /// positions; `100` for simple on/off valves.
    pub position: u8,
}
