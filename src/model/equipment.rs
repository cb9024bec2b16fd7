//! Equipment entity (§3): the controller singleton — model, firmware,
//! and overall operating status. Unlike every other entity kind there is
//! exactly one of these; it is still stored through a `Collection<T>` at
//! a fixed id of `1` so the rest of the Change Engine machinery (events,
//! dirtying) doesn't need a special case.

use serde::{Deserialize, Serialize};

use crate::controller_type::ControllerType;

use super::Id;

/// The fixed id the equipment singleton is stored under.
pub const SINGLETON_ID: Id = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentConfig {
    pub id: Id,
    pub model: String,
    pub controller_type: ControllerType,
    pub firmware: String,
    pub software_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentStatusName {
    Ok,
    Lost,
    Degraded,
    Initializing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquipmentStatus {
    pub val: u8,
    pub name: EquipmentStatusName,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentState {
    pub id: Id,
    pub status: EquipmentStatus,
    pub mode: String,
    /// Unix epoch seconds.
    pub boot_time: i64,
}
