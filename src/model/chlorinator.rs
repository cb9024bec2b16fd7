//! Chlorinator entity (§3): salt-water generator.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChlorinatorType {
    Intellichlor,
    Aquarite,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChlorinatorConfig {
    pub id: Id,
    pub name: String,
    pub body: Id,
    /// Output percent (0-100) while the bound body is the pool.
    pub pool_setpoint: u8,
    /// Output percent (0-100) while the bound body is the spa.
    pub spa_setpoint: u8,
    pub super_chlor_hours: u8,
    pub chlorinator_type: ChlorinatorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChlorinatorStatus {
    Ok,
    LowSalt,
    VeryLowSalt,
    HighSalt,
    ColdShutdown,
    Fault,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChlorinatorState {
    pub id: Id,
    pub current_output: u8,
    pub target_output: u8,
    pub salt_level_ppm: u16,
    pub salt_required: bool,
    pub super_chlor: bool,
    pub status: ChlorinatorStatus,
}

impl ChlorinatorConfig {
    /// Setpoints are percentages; the variant-specific valid range check
    /// (usually 0-100) happens in the intent validation layer, not here —
    /// this type only knows the field exists and what it means.
    pub fn setpoint_for_body(&self, body_is_spa: bool) -> u8 {
        if body_is_spa {
            self.spa_setpoint
        } else {
            self.pool_setpoint
        }
    }
}
