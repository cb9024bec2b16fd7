//! Per-variant byte-value maps (§4.3): bidirectional numeric↔record
//! tables built once at startup and never mutated afterward. The
//! protocol byte is the wire truth; the typed enum is the in-memory
//! truth; `ByteValueMap` only supplies the textual name/desc pair for
//! API serialization, so nothing internal ever compares by name.

use crate::model::body::{HeatMode, HeatSources};
use crate::model::chlorinator::ChlorinatorStatus;
use crate::model::circuit::CircuitFunction;
use crate::model::pump::{PumpStatus, PumpType};
use crate::valuemap::ByteValueMap;

/// Textual names for [`CircuitFunction`] wire codes, for API output only.
pub fn circuit_function_names() -> ByteValueMap {
    ByteValueMap::new(&[
        (0, "generic", "Generic"),
        (1, "pool", "Pool"),
        (2, "spa", "Spa"),
        (3, "light", "Light"),
        (4, "spillway", "Spillway"),
        (5, "mastercleaner", "Master Cleaner"),
        (6, "chemical", "Chemical"),
        (7, "aux", "Auxiliary"),
    ])
}

pub fn circuit_function_to_val(function: CircuitFunction) -> u8 {
    match function {
        CircuitFunction::Generic => 0,
        CircuitFunction::Pool => 1,
        CircuitFunction::Spa => 2,
        CircuitFunction::Light => 3,
        CircuitFunction::SpillWay => 4,
        CircuitFunction::MasterCleaner => 5,
        CircuitFunction::Chemical => 6,
        CircuitFunction::Aux => 7,
    }
}

pub fn circuit_function_from_val(val: u8) -> Option<CircuitFunction> {
    Some(match val {
        0 => CircuitFunction::Generic,
        1 => CircuitFunction::Pool,
        2 => CircuitFunction::Spa,
        3 => CircuitFunction::Light,
        4 => CircuitFunction::SpillWay,
        5 => CircuitFunction::MasterCleaner,
        6 => CircuitFunction::Chemical,
        7 => CircuitFunction::Aux,
        _ => return None,
    })
}

/// Textual names for [`HeatMode`] wire codes.
pub fn heat_mode_names() -> ByteValueMap {
    ByteValueMap::new(&[
        (0, "off", "Off"),
        (1, "heater", "Heater"),
        (2, "solar", "Solar Only"),
        (3, "solarpref", "Solar Preferred"),
        (4, "heatpump", "Heat Pump"),
        (5, "ultratemp", "UltraTemp"),
    ])
}

pub fn heat_mode_to_val(mode: HeatMode) -> u8 {
    match mode {
        HeatMode::Off => 0,
        HeatMode::Heater => 1,
        HeatMode::Solar => 2,
        HeatMode::SolarPreferred => 3,
        HeatMode::HeatPump => 4,
        HeatMode::UltraTemp => 5,
    }
}

pub fn heat_mode_from_val(val: u8) -> Option<HeatMode> {
    Some(match val {
        0 => HeatMode::Off,
        1 => HeatMode::Heater,
        2 => HeatMode::Solar,
        3 => HeatMode::SolarPreferred,
        4 => HeatMode::HeatPump,
        5 => HeatMode::UltraTemp,
        _ => return None,
    })
}

/// Textual names for the [`HeatSources`] bitmask (§4.3: "heat sources").
/// Unlike the other tables here this one is bit-indexed, not value-indexed;
/// `ByteValueMap` still works since each bit is a distinct byte value.
pub fn heat_sources_names() -> ByteValueMap {
    ByteValueMap::new(&[
        (HeatSources::GAS.bits(), "gas", "Gas"),
        (HeatSources::SOLAR.bits(), "solar", "Solar"),
        (HeatSources::HEAT_PUMP.bits(), "heatpump", "Heat Pump"),
        (HeatSources::ULTRATEMP.bits(), "ultratemp", "UltraTemp"),
    ])
}

/// Textual names for [`PumpType`] wire codes.
pub fn pump_type_names() -> ByteValueMap {
    ByteValueMap::new(&[
        (0, "relay", "Relay"),
        (1, "single", "Single Speed"),
        (2, "dual", "Dual Speed"),
        (3, "vs", "Variable Speed"),
        (4, "vsf", "Variable Speed/Flow"),
        (5, "vf", "Variable Flow"),
    ])
}

pub fn pump_type_to_val(pump_type: PumpType) -> u8 {
    match pump_type {
        PumpType::Relay => 0,
        PumpType::Single => 1,
        PumpType::Dual => 2,
        PumpType::Vs => 3,
        PumpType::Vsf => 4,
        PumpType::Vf => 5,
    }
}

pub fn pump_type_from_val(val: u8) -> Option<PumpType> {
    Some(match val {
        0 => PumpType::Relay,
        1 => PumpType::Single,
        2 => PumpType::Dual,
        3 => PumpType::Vs,
        4 => PumpType::Vsf,
        5 => PumpType::Vf,
        _ => return None,
    })
}

pub fn pump_status_to_val(status: PumpStatus) -> u8 {
    match status {
        PumpStatus::Off => 0,
        PumpStatus::Running => 1,
        PumpStatus::Priming => 2,
        PumpStatus::Fault => 3,
    }
}

pub fn pump_status_from_val(val: u8) -> Option<PumpStatus> {
    Some(match val {
        0 => PumpStatus::Off,
        1 => PumpStatus::Running,
        2 => PumpStatus::Priming,
        3 => PumpStatus::Fault,
        _ => return None,
    })
}

/// Textual names for the chlorinator status-bit codes (§4.3).
pub fn chlorinator_status_names() -> ByteValueMap {
    ByteValueMap::new(&[
        (0, "ok", "Ok"),
        (1, "lowsalt", "Low Salt"),
        (2, "verylowsalt", "Very Low Salt"),
        (3, "highsalt", "High Salt"),
        (4, "coldshutdown", "Cold Shutdown"),
        (5, "fault", "Fault"),
    ])
}

pub fn chlorinator_status_to_val(status: ChlorinatorStatus) -> u8 {
    match status {
        ChlorinatorStatus::Ok => 0,
        ChlorinatorStatus::LowSalt => 1,
        ChlorinatorStatus::VeryLowSalt => 2,
        ChlorinatorStatus::HighSalt => 3,
        ChlorinatorStatus::ColdShutdown => 4,
        ChlorinatorStatus::Fault => 5,
    }
}

pub fn chlorinator_status_from_val(val: u8) -> Option<ChlorinatorStatus> {
    Some(match val {
        0 => ChlorinatorStatus::Ok,
        1 => ChlorinatorStatus::LowSalt,
        2 => ChlorinatorStatus::VeryLowSalt,
        3 => ChlorinatorStatus::HighSalt,
        4 => ChlorinatorStatus::ColdShutdown,
        5 => ChlorinatorStatus::Fault,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_function_round_trips_through_val() {
        for function in [
            CircuitFunction::Generic,
            CircuitFunction::Pool,
            CircuitFunction::Spa,
            CircuitFunction::Light,
            CircuitFunction::SpillWay,
            CircuitFunction::MasterCleaner,
            CircuitFunction::Chemical,
            CircuitFunction::Aux,
        ] {
            let val = circuit_function_to_val(function);
            assert_eq!(circuit_function_from_val(val), Some(function));
        }
    }

    #[test]
    fn names_table_matches_val_space() {
        let names = circuit_function_names();
        assert_eq!(names.get(1).unwrap().name, "pool");
    }
}
