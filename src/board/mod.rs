//! Board Dispatch (§4.5): the intent list, the per-variant capability
//! matrix, and the two concrete realizations — `pentair::PentairBoard`
//! (wire-driven) and `standalone::StandaloneBoard` (host-driven, no
//! wire). `Board` is a tagged variant over these two rather than a
//! `dyn Trait`, per the Design Notes' "prefer a tagged variant ... over
//! deep inheritance."

pub mod messages;
pub mod pentair;
pub mod standalone;
pub mod value_maps;

pub use crate::controller_type::ControllerType;

use crate::change::events::Event;
use crate::codec::DecodeEvent;
use crate::delay::DelayManager;
use crate::error::{PoolError, Result};
use crate::model::body::{BodyType, HeatMode};
use crate::model::chlorinator::ChlorinatorStatus;
use crate::model::equipment::EquipmentStatus;
use crate::model::pump::PumpStatus;
use crate::model::{EntityKind, EquipmentModel, Id};
use crate::transaction::{Priority, TransactionEngine};

use messages::PumpTarget;

/// Heat setpoints are validated in tenths of a degree before a frame is
/// built (§8: "clamps-and-rejects: values outside the variant's permitted
/// range return `InvalidEquipmentData`, never a clamped wire frame").
/// 40.0-104.0 degrees covers every variant's documented range. Shared by
/// both board realizations so Standalone enforces the same bounds a wire
/// variant would.
pub(crate) const MIN_SETPOINT_TENTHS: i16 = 400;
pub(crate) const MAX_SETPOINT_TENTHS: i16 = 1040;

pub(crate) const MIN_CHEM_PH_HUNDREDTHS: u16 = 680;
pub(crate) const MAX_CHEM_PH_HUNDREDTHS: u16 = 800;
pub(crate) const MIN_CHEM_ORP_MV: u16 = 400;
pub(crate) const MAX_CHEM_ORP_MV: u16 = 800;

pub(crate) fn validate_setpoint_range(body_id: Id, tenths: i16) -> Result<()> {
    if !(MIN_SETPOINT_TENTHS..=MAX_SETPOINT_TENTHS).contains(&tenths) {
        return Err(PoolError::InvalidEquipmentData {
            kind: EntityKind::Body,
            id: body_id,
            field: "setPoint",
            reason: format!("{tenths} tenths outside [{MIN_SETPOINT_TENTHS}, {MAX_SETPOINT_TENTHS}]"),
        });
    }
    Ok(())
}

pub(crate) fn validate_pump_target_range(target: PumpTarget) -> Result<()> {
    let ok = match target {
        PumpTarget::Rpm(rpm) => (450..=3450).contains(&rpm),
        PumpTarget::Flow(gpm) => gpm <= 150,
        PumpTarget::Speed(pct) => pct <= 100,
    };
    if !ok {
        return Err(PoolError::InvalidEquipmentData {
            kind: EntityKind::Pump,
            id: 0,
            field: "speed",
            reason: format!("{target:?} outside the permitted range"),
        });
    }
    Ok(())
}

pub(crate) fn validate_chem_setpoint_range(chem: ChemKind, value: u16) -> Result<()> {
    let (min, max, field) = match chem {
        ChemKind::Ph => (MIN_CHEM_PH_HUNDREDTHS, MAX_CHEM_PH_HUNDREDTHS, "phSetpoint"),
        ChemKind::Orp => (MIN_CHEM_ORP_MV, MAX_CHEM_ORP_MV, "orpSetpoint"),
    };
    if !(min..=max).contains(&value) {
        return Err(PoolError::InvalidEquipmentData {
            kind: EntityKind::ChemController,
            id: 0,
            field,
            reason: format!("{value} outside [{min}, {max}]"),
        });
    }
    Ok(())
}

pub(crate) fn validate_percent_range(id: Id, field: &'static str, value: u8) -> Result<()> {
    if value > 100 {
        return Err(PoolError::InvalidEquipmentData {
            kind: EntityKind::Chlorinator,
            id,
            field,
            reason: format!("{value} exceeds 100%"),
        });
    }
    Ok(())
}

/// The named interlock flag a body's heat mode asserts/excludes (§4.7).
/// Auxiliary bodies never participate in the shared-heater interlock.
pub(crate) fn interlock_name_for_body(body_type: BodyType) -> Option<&'static str> {
    match body_type {
        BodyType::Spa => Some("spa-heat"),
        BodyType::Pool => Some("pool-heat"),
        BodyType::Auxiliary => None,
    }
}

/// How fully a controller variant supports a given feature area. Plain
/// `bool` is enough for some capabilities (§4.5 table); others have
/// graduated support and use this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportLevel {
    None,
    Limited,
    Partial,
    Full,
    HostDriven,
}

/// Illustrative (not exhaustive, §4.5) per-variant capability matrix.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub dual_body: bool,
    pub light_themes: SupportLevel,
    pub intellichem_binding: bool,
    pub native_schedules: SupportLevel,
    pub valve_configuration: SupportLevel,
    pub circuit_groups: SupportLevel,
    pub chlorinator: bool,
}

pub fn capabilities_for(controller_type: ControllerType) -> Capabilities {
    use ControllerType::*;
    use SupportLevel::*;
    match controller_type {
        IntelliCenter => Capabilities {
            dual_body: true,
            light_themes: Full,
            intellichem_binding: true,
            native_schedules: Full,
            valve_configuration: Full,
            circuit_groups: Full,
            chlorinator: true,
        },
        IntelliTouch | EasyTouch => Capabilities {
            dual_body: true,
            light_themes: if controller_type == IntelliTouch { Full } else { Partial },
            intellichem_binding: true,
            native_schedules: Full,
            valve_configuration: Limited,
            circuit_groups: if controller_type == IntelliTouch { Full } else { Partial },
            chlorinator: true,
        },
        SunTouch => Capabilities {
            dual_body: true,
            light_themes: Partial,
            intellichem_binding: false,
            native_schedules: Full,
            valve_configuration: None,
            circuit_groups: Partial,
            chlorinator: false,
        },
        IntelliCom => Capabilities {
            dual_body: true,
            light_themes: None,
            intellichem_binding: false,
            native_schedules: Limited,
            valve_configuration: None,
            circuit_groups: None,
            chlorinator: false,
        },
        AquaLink => Capabilities {
            dual_body: false,
            light_themes: Partial,
            intellichem_binding: false,
            native_schedules: Full,
            valve_configuration: Limited,
            circuit_groups: Limited,
            chlorinator: false,
        },
        Standalone => Capabilities {
            dual_body: false,
            light_themes: HostDriven,
            intellichem_binding: true,
            native_schedules: HostDriven,
            valve_configuration: HostDriven,
            circuit_groups: HostDriven,
            chlorinator: true,
        },
    }
}

/// Which circuit state to drive toward (§4.5: `on|off|toggle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitDesired {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChemKind {
    Ph,
    Orp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Kind(EntityKind),
}

/// The full intent list exposed upward to REST/socket layers and to
/// Schedule Execution (§4.5).
#[derive(Debug, Clone)]
pub enum Intent {
    SetCircuitState { id: Id, desired: CircuitDesired },
    SetCircuitGroupState { id: Id, on: bool },
    SetLightTheme { group_id: Id, theme: u8 },
    SetBodyHeatMode { body_id: Id, mode: HeatMode },
    SetHeatSetpoint { body_id: Id, tenths: i16 },
    SetCoolSetpoint { body_id: Id, tenths: i16 },
    SetPumpSpeed { id: Id, target: PumpTarget },
    SetChlorinator {
        id: Id,
        pool_setpoint: u8,
        spa_setpoint: u8,
        super_chlor: bool,
        super_chlor_hours: u8,
    },
    SetChemSetpoint { id: Id, chem: ChemKind, value: u16 },
    SetClock { datetime: chrono::NaiveDateTime },
    RequestConfiguration { scope: Scope },
    RequestStatus { scope: Scope },
}

impl Intent {
    /// Name used in `InvalidOperation` payloads and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetCircuitState { .. } => "setCircuitState",
            Self::SetCircuitGroupState { .. } => "setCircuitGroupState",
            Self::SetLightTheme { .. } => "setLightTheme",
            Self::SetBodyHeatMode { .. } => "setBodyHeatMode",
            Self::SetHeatSetpoint { .. } => "setHeatSetpoint",
            Self::SetCoolSetpoint { .. } => "setCoolSetpoint",
            Self::SetPumpSpeed { .. } => "setPumpSpeed",
            Self::SetChlorinator { .. } => "setChlorinator",
            Self::SetChemSetpoint { .. } => "setChemSetpoint",
            Self::SetClock { .. } => "setClock",
            Self::RequestConfiguration { .. } => "requestConfiguration",
            Self::RequestStatus { .. } => "requestStatus",
        }
    }
}

/// A patch a decoder wants applied to the equipment/state model. Kept
/// deliberately small — one entity kind, one id, one new fact — so the
/// Change Engine can diff and fan out without knowing protocol details.
#[derive(Debug, Clone)]
pub enum DecodedUpdate {
    CircuitIsOn { id: Id, is_on: bool },
    CircuitGroupIsOn { id: Id, is_on: bool },
    LightGroupTheme { id: Id, theme: u8 },
    BodyHeatMode { id: Id, mode: HeatMode },
    BodySetpoint { id: Id, tenths: i16, is_heat: bool },
    PumpStatus { id: Id, status: PumpStatus, rpm: u16, watts: u16 },
    ChlorinatorStatus { id: Id, current_output: u8, salt_ppm: u16, status: ChlorinatorStatus },
    ChemReading { id: Id, chem: ChemKind, level: i16, tank_level: u8 },
    ScheduleIsOn { id: Id, is_on: bool },
    ValvePosition { id: Id, is_on: bool, position: u8 },
    FilterPressure { id: Id, pressure: u8, clean_percentage: u8 },
    CoverIsClosed { id: Id, is_closed: bool },
    EquipmentStatus { status: EquipmentStatus },
}

/// A variant realization binding `controllerType -> {value maps,
/// message codecs, capabilities, intent handlers}` (§4.5).
pub enum Board {
    Pentair(pentair::PentairBoard),
    Standalone(standalone::StandaloneBoard),
}

impl Board {
    pub fn new(controller_type: ControllerType, dest: u8, src: u8) -> Self {
        match controller_type {
            ControllerType::Standalone => Board::Standalone(standalone::StandaloneBoard::new()),
            other => Board::Pentair(pentair::PentairBoard::new(other, dest, src)),
        }
    }

    pub fn controller_type(&self) -> ControllerType {
        match self {
            Board::Pentair(b) => b.controller_type,
            Board::Standalone(_) => ControllerType::Standalone,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        capabilities_for(self.controller_type())
    }

    /// Validate and, if the variant supports it, queue `intent` through
    /// `engine` at the given priority. Validation happens before any
    /// frame is queued (§4.5: "Intent handlers must validate range and
    /// enum membership before queuing a frame"). `delay` gates and arms
    /// the interlock/cooldown checks heat-mode and heater intents need
    /// (§4.7, §8 scenario 4).
    pub async fn dispatch(
        &self,
        intent: Intent,
        model: &EquipmentModel,
        engine: &TransactionEngine,
        delay: &DelayManager,
        priority: Priority,
    ) -> Result<()> {
        match self {
            Board::Pentair(b) => b.dispatch(intent, model, engine, delay, priority).await,
            Board::Standalone(b) => b.dispatch(intent, model, delay),
        }
    }

    /// Route a decoded inbound frame (or spontaneous status) to the
    /// matching decoder, producing idempotent model patches. Never
    /// blocks; callers hand the result to the Change Engine.
    pub fn decode(&self, event: &DecodeEvent) -> Vec<DecodedUpdate> {
        let DecodeEvent::Frame(frame) = event else {
            return Vec::new();
        };
        match self {
            Board::Pentair(b) => b.decode(frame),
            Board::Standalone(_) => Vec::new(),
        }
    }
}

/// Construct the `InvalidOperation` error for an intent the current
/// variant doesn't support.
pub fn unsupported(controller_type: ControllerType, intent: &Intent) -> PoolError {
    PoolError::InvalidOperation {
        controller_type,
        intent: intent.name(),
    }
}

/// Build the `circuit` event for a decoded or applied circuit-state
/// change, reused by both dispatch (optimistic post-image) and decode
/// (wire-confirmed post-image).
pub fn circuit_event(id: Id, is_on: bool) -> Event {
    Event::circuit(id, is_on)
}
