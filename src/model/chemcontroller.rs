//! ChemController entity (§3): IntelliChem or a "homegrown" pH/ORP/dosing
//! controller.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChemControllerType {
    Intellichem,
    Homegrown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoseLimits {
    pub ph_max_ml_per_day: u32,
    pub orp_max_ml_per_day: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankVolumes {
    pub ph_tank_ml: u32,
    pub orp_tank_ml: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemControllerConfig {
    pub id: Id,
    pub controller_type: ChemControllerType,
    pub body: Id,
    /// Tenths of a pH unit (e.g. 72 == pH 7.2).
    pub ph_setpoint: u16,
    /// milliVolts.
    pub orp_setpoint: u16,
    pub dose_limits: DoseLimits,
    pub tank_volumes: TankVolumes,
    /// Target Langelier Saturation Index, tenths (e.g. -2 == LSI -0.2).
    pub lsi_target: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChemAlarm {
    PhTankEmpty,
    OrpTankEmpty,
    PhDoseLimitReached,
    OrpDoseLimitReached,
    ProbeFault,
    FlowFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChemReading {
    /// Tenths of a pH unit, or milliVolts for ORP.
    pub level: i32,
    /// Tank level percent remaining, 0-100.
    pub tank_level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DosingStatus {
    /// Minutes-since-midnight dosing started, if currently dosing.
    pub since: Option<u16>,
    pub volume_ml: u32,
    pub remaining_ml: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemControllerState {
    pub id: Id,
    pub ph: ChemReading,
    pub orp: ChemReading,
    pub dosing: DosingStatus,
    pub alarms: Vec<ChemAlarm>,
    pub warnings: Vec<ChemAlarm>,
}

impl ChemControllerConfig {
    /// §3 invariant: "dose volumes never exceed the remaining tank level."
    pub fn dose_within_tank(&self, requested_ml: u32, remaining_ml: u32) -> bool {
        requested_ml <= remaining_ml
    }
}
