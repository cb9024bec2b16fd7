//! Shared message framing (§4.5): action-code constants and the
//! encode/decode helpers common to both Pentair-16 and Pentair-2 wire
//! variants. Variant-specific capability gating happens one layer up in
//! `board::pentair`; this module only knows how to turn an intent's
//! parameters into payload bytes and back.

use crate::codec::{Frame, FrameVariant};
use crate::model::body::HeatMode;
use crate::model::chlorinator::ChlorinatorStatus;
use crate::model::equipment::{EquipmentStatus, EquipmentStatusName};
use crate::model::pump::PumpStatus;
use crate::model::Id;
use crate::transaction::ResponseKey;

use super::{value_maps, ChemKind};

pub const ACTION_CIRCUIT_STATE: u8 = 0x86;
pub const ACTION_CIRCUIT_GROUP_STATE: u8 = 0x87;
pub const ACTION_LIGHT_THEME: u8 = 0x84;
pub const ACTION_HEAT_MODE: u8 = 0x88;
pub const ACTION_HEAT_SETPOINT: u8 = 0x89;
pub const ACTION_COOL_SETPOINT: u8 = 0x8A;
pub const ACTION_PUMP_SPEED: u8 = 0x91;
pub const ACTION_CHLORINATOR: u8 = 0x95;
pub const ACTION_CHEM_SETPOINT: u8 = 0x97;
pub const ACTION_CLOCK: u8 = 0x85;
pub const ACTION_REQUEST_CONFIG: u8 = 0x82;
pub const ACTION_REQUEST_STATUS: u8 = 0x83;
pub const ACTION_PUMP_STATUS: u8 = 0x92;
pub const ACTION_CHLORINATOR_STATUS: u8 = 0x96;
pub const ACTION_CHEM_READING: u8 = 0x98;
pub const ACTION_SCHEDULE_TRIGGER: u8 = 0x99;
pub const ACTION_VALVE_POSITION: u8 = 0x9A;
pub const ACTION_FILTER_PRESSURE: u8 = 0x9B;
pub const ACTION_COVER_STATE: u8 = 0x9C;
pub const ACTION_EQUIPMENT_STATUS: u8 = 0x9D;

/// Build the outbound `setCircuitState` frame (§8 scenario 1: payload
/// is `[circuitId, onFlag]`).
pub fn circuit_state_frame(variant: FrameVariant, dest: u8, src: u8, circuit: Id, on: bool) -> Frame {
    Frame::new(
        variant,
        dest,
        src,
        ACTION_CIRCUIT_STATE,
        vec![circuit as u8, u8::from(on)],
    )
}

pub fn response_key(dest: u8, action: u8, correlating_id: Id) -> ResponseKey {
    ResponseKey {
        peer: dest,
        action,
        correlating_id,
    }
}

/// Decode an inbound circuit-state status/ack frame. Returns `None` if
/// `frame` isn't one (the caller tries every decoder in turn).
pub fn decode_circuit_state(frame: &Frame) -> Option<(Id, bool)> {
    if frame.action != ACTION_CIRCUIT_STATE || frame.payload.len() < 2 {
        return None;
    }
    Some((frame.payload[0] as Id, frame.payload[1] != 0))
}

pub fn heat_mode_frame(variant: FrameVariant, dest: u8, src: u8, body: Id, mode: HeatMode) -> Frame {
    Frame::new(
        variant,
        dest,
        src,
        ACTION_HEAT_MODE,
        vec![body as u8, value_maps::heat_mode_to_val(mode)],
    )
}

pub fn decode_heat_mode(frame: &Frame) -> Option<(Id, HeatMode)> {
    if frame.action != ACTION_HEAT_MODE || frame.payload.len() < 2 {
        return None;
    }
    value_maps::heat_mode_from_val(frame.payload[1]).map(|mode| (frame.payload[0] as Id, mode))
}

/// Setpoints travel in tenths of a degree, big-endian, matching
/// [`crate::model::body::BodyState::temp`]'s native unit.
pub fn heat_setpoint_frame(variant: FrameVariant, dest: u8, src: u8, body: Id, tenths: i16) -> Frame {
    let bytes = tenths.to_be_bytes();
    Frame::new(
        variant,
        dest,
        src,
        ACTION_HEAT_SETPOINT,
        vec![body as u8, bytes[0], bytes[1]],
    )
}

pub fn cool_setpoint_frame(variant: FrameVariant, dest: u8, src: u8, body: Id, tenths: i16) -> Frame {
    let bytes = tenths.to_be_bytes();
    Frame::new(
        variant,
        dest,
        src,
        ACTION_COOL_SETPOINT,
        vec![body as u8, bytes[0], bytes[1]],
    )
}

pub fn decode_setpoint(frame: &Frame, action: u8) -> Option<(Id, i16)> {
    if frame.action != action || frame.payload.len() < 3 {
        return None;
    }
    let tenths = i16::from_be_bytes([frame.payload[1], frame.payload[2]]);
    Some((frame.payload[0] as Id, tenths))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpTarget {
    Rpm(u16),
    Flow(u16),
    Speed(u8),
}

pub fn pump_speed_frame(variant: FrameVariant, dest: u8, src: u8, pump: Id, target: PumpTarget) -> Frame {
    let mut payload = vec![pump as u8];
    match target {
        PumpTarget::Rpm(rpm) => {
            payload.push(0);
            payload.extend_from_slice(&rpm.to_be_bytes());
        }
        PumpTarget::Flow(gpm) => {
            payload.push(1);
            payload.extend_from_slice(&gpm.to_be_bytes());
        }
        PumpTarget::Speed(pct) => {
            payload.push(2);
            payload.push(pct);
            payload.push(0);
        }
    }
    Frame::new(variant, dest, src, ACTION_PUMP_SPEED, payload)
}

pub fn clock_frame(variant: FrameVariant, dest: u8, src: u8, datetime: chrono::NaiveDateTime) -> Frame {
    use chrono::{Datelike, Timelike};
    let payload = vec![
        datetime.hour() as u8,
        datetime.minute() as u8,
        datetime.second() as u8,
        datetime.weekday().num_days_from_sunday() as u8,
        datetime.day() as u8,
        datetime.month() as u8,
        (datetime.year() - 2000).clamp(0, 255) as u8,
    ];
    Frame::new(variant, dest, src, ACTION_CLOCK, payload)
}

pub fn request_frame(variant: FrameVariant, dest: u8, src: u8, action: u8, scope_byte: u8) -> Frame {
    Frame::new(variant, dest, src, action, vec![scope_byte])
}

/// Payload `[groupId, onFlag]` (§4.5: circuit-group on/off is a one-bit
/// status, same shape as a plain circuit).
pub fn circuit_group_state_frame(variant: FrameVariant, dest: u8, src: u8, group: Id, on: bool) -> Frame {
    Frame::new(
        variant,
        dest,
        src,
        ACTION_CIRCUIT_GROUP_STATE,
        vec![group as u8, u8::from(on)],
    )
}

pub fn decode_circuit_group_state(frame: &Frame) -> Option<(Id, bool)> {
    if frame.action != ACTION_CIRCUIT_GROUP_STATE || frame.payload.len() < 2 {
        return None;
    }
    Some((frame.payload[0] as Id, frame.payload[1] != 0))
}

/// Payload `[groupId, theme]`.
pub fn light_theme_frame(variant: FrameVariant, dest: u8, src: u8, group: Id, theme: u8) -> Frame {
    Frame::new(variant, dest, src, ACTION_LIGHT_THEME, vec![group as u8, theme])
}

pub fn decode_light_theme(frame: &Frame) -> Option<(Id, u8)> {
    if frame.action != ACTION_LIGHT_THEME || frame.payload.len() < 2 {
        return None;
    }
    Some((frame.payload[0] as Id, frame.payload[1]))
}

/// Payload `[id, poolSetpoint, spaSetpoint, superChlorFlag, superChlorHours]`.
pub fn chlorinator_frame(
    variant: FrameVariant,
    dest: u8,
    src: u8,
    id: Id,
    pool_setpoint: u8,
    spa_setpoint: u8,
    super_chlor: bool,
    super_chlor_hours: u8,
) -> Frame {
    Frame::new(
        variant,
        dest,
        src,
        ACTION_CHLORINATOR,
        vec![id as u8, pool_setpoint, spa_setpoint, u8::from(super_chlor), super_chlor_hours],
    )
}

/// Inbound pump status report: `[pumpId, statusByte, rpmHi, rpmLo, wattsHi, wattsLo]`.
pub fn decode_pump_status(frame: &Frame) -> Option<(Id, PumpStatus, u16, u16)> {
    if frame.action != ACTION_PUMP_STATUS || frame.payload.len() < 6 {
        return None;
    }
    let status = value_maps::pump_status_from_val(frame.payload[1])?;
    let rpm = u16::from_be_bytes([frame.payload[2], frame.payload[3]]);
    let watts = u16::from_be_bytes([frame.payload[4], frame.payload[5]]);
    Some((frame.payload[0] as Id, status, rpm, watts))
}

/// Inbound chlorinator status report: `[id, currentOutput, saltHi, saltLo, statusByte]`.
pub fn decode_chlorinator_status(frame: &Frame) -> Option<(Id, u8, u16, ChlorinatorStatus)> {
    if frame.action != ACTION_CHLORINATOR_STATUS || frame.payload.len() < 5 {
        return None;
    }
    let current_output = frame.payload[1];
    let salt_ppm = u16::from_be_bytes([frame.payload[2], frame.payload[3]]);
    let status = value_maps::chlorinator_status_from_val(frame.payload[4])?;
    Some((frame.payload[0] as Id, current_output, salt_ppm, status))
}

/// Inbound chem-controller reading: `[id, chemByte(0=ph,1=orp), levelHi, levelLo, tankLevel]`.
pub fn decode_chem_reading(frame: &Frame) -> Option<(Id, ChemKind, i16, u8)> {
    if frame.action != ACTION_CHEM_READING || frame.payload.len() < 5 {
        return None;
    }
    let chem = if frame.payload[1] == 0 { ChemKind::Ph } else { ChemKind::Orp };
    let level = i16::from_be_bytes([frame.payload[2], frame.payload[3]]);
    Some((frame.payload[0] as Id, chem, level, frame.payload[4]))
}

/// Inbound schedule trigger: `[scheduleId, activeFlag]`.
pub fn decode_schedule_trigger(frame: &Frame) -> Option<(Id, bool)> {
    if frame.action != ACTION_SCHEDULE_TRIGGER || frame.payload.len() < 2 {
        return None;
    }
    Some((frame.payload[0] as Id, frame.payload[1] != 0))
}

/// Inbound valve position: `[valveId, onFlag, position]`.
pub fn decode_valve_position(frame: &Frame) -> Option<(Id, bool, u8)> {
    if frame.action != ACTION_VALVE_POSITION || frame.payload.len() < 3 {
        return None;
    }
    Some((frame.payload[0] as Id, frame.payload[1] != 0, frame.payload[2]))
}

/// Inbound filter pressure: `[filterId, pressure, cleanPercentage]`.
pub fn decode_filter_pressure(frame: &Frame) -> Option<(Id, u8, u8)> {
    if frame.action != ACTION_FILTER_PRESSURE || frame.payload.len() < 3 {
        return None;
    }
    Some((frame.payload[0] as Id, frame.payload[1], frame.payload[2]))
}

/// Inbound cover state: `[coverId, isClosedFlag]`.
pub fn decode_cover_state(frame: &Frame) -> Option<(Id, bool)> {
    if frame.action != ACTION_COVER_STATE || frame.payload.len() < 2 {
        return None;
    }
    Some((frame.payload[0] as Id, frame.payload[1] != 0))
}

/// Inbound equipment status: `[equipmentId, statusVal, percent]`. The
/// equipment collection has exactly one entry (`SINGLETON_ID`), so the id
/// byte is read but not otherwise used.
pub fn decode_equipment_status(frame: &Frame) -> Option<EquipmentStatus> {
    if frame.action != ACTION_EQUIPMENT_STATUS || frame.payload.len() < 3 {
        return None;
    }
    let name = match frame.payload[1] {
        0 => EquipmentStatusName::Ok,
        1 => EquipmentStatusName::Lost,
        2 => EquipmentStatusName::Degraded,
        3 => EquipmentStatusName::Initializing,
        _ => return None,
    };
    Some(EquipmentStatus {
        val: frame.payload[1],
        name,
        percent: frame.payload[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_state_round_trips() {
        let frame = circuit_state_frame(FrameVariant::Pentair16, 0x10, 0x00, 6, true);
        assert_eq!(decode_circuit_state(&frame), Some((6, true)));
    }

    #[test]
    fn setpoint_round_trips_negative_and_positive() {
        let frame = heat_setpoint_frame(FrameVariant::Pentair2, 0x10, 0x00, 1, 822);
        assert_eq!(decode_setpoint(&frame, ACTION_HEAT_SETPOINT), Some((1, 822)));
    }
}
