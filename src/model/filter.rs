//! Filter entity (§3): pressure-monitored filter vessel.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    Sand,
    Cartridge,
    De,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PressureUnits {
    Psi,
    Kpa,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub id: Id,
    pub body: Id,
    pub filter_type: FilterType,
    /// Pressure reading recorded immediately after cleaning; used to
    /// derive `cleanPercentage` in state.
    pub ref_pressure: u8,
    pub pressure_units: PressureUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub id: Id,
    pub pressure: u8,
    /// 100 at `ref_pressure`, falling as pressure climbs above it.
    pub clean_percentage: u8,
}
