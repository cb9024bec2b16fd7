//! Heater entity (§3): gas, solar, heat-pump, and ultra-temp heat sources.

use serde::{Deserialize, Serialize};

use super::body::HeatSources;
use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaterType {
    Gas,
    Solar,
    HeatPump,
    UltraTemp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaterConfig {
    pub id: Id,
    pub name: String,
    pub heater_type: HeaterType,
    /// Bodies this heater can serve.
    pub body_mask: HeatSources,
    /// Lower priority value == preferred first when multiple heaters can
    /// serve the same body (e.g. solar before gas).
    pub priority: u8,
    /// Minimum seconds between this heater's successive activations
    /// (also enforced by the Delay Manager's `heater-cooldown` purpose).
    pub cooldown_secs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaterState {
    pub id: Id,
    pub is_on: bool,
    /// Minutes-since-midnight, present only while running.
    pub start_time: Option<u16>,
    pub end_time: Option<u16>,
}
