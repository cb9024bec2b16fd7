//! Wire-driven board realization (§4.5) for every Pentair-style
//! controller variant except `Standalone`. One `PentairBoard` is bound
//! to a `(dest, src)` address pair on a specific port at construction;
//! all intents funnel through the shared frame builders in
//! `super::messages`, gated by range/capability checks before anything
//! is queued.

use crate::delay::{DelayKey, DelayManager, Purpose};
use crate::error::{PoolError, Result};
use crate::model::body::HeatMode;
use crate::model::{EntityKind, EquipmentModel};
use crate::transaction::{Priority, Transaction, TransactionEngine, TransactionOutcome};

use super::messages::{self, PumpTarget};
use super::{unsupported, ChemKind, CircuitDesired, ControllerType, DecodedUpdate, Intent, SupportLevel};
use crate::codec::Frame;

pub struct PentairBoard {
    pub controller_type: ControllerType,
    dest: u8,
    src: u8,
}

impl PentairBoard {
    pub fn new(controller_type: ControllerType, dest: u8, src: u8) -> Self {
        assert!(
            controller_type != ControllerType::Standalone,
            "PentairBoard does not speak for the standalone variant"
        );
        Self {
            controller_type,
            dest,
            src,
        }
    }

    fn variant(&self) -> crate::codec::FrameVariant {
        self.controller_type
            .frame_variant()
            .expect("non-standalone controller types always have a wire variant")
    }

    fn capabilities(&self) -> super::Capabilities {
        super::capabilities_for(self.controller_type)
    }

    pub async fn dispatch(
        &self,
        intent: Intent,
        model: &EquipmentModel,
        engine: &TransactionEngine,
        delay: &DelayManager,
        priority: Priority,
    ) -> Result<()> {
        match intent {
            Intent::SetCircuitState { id, desired } => {
                let current = model
                    .state
                    .circuits
                    .get(id)
                    .ok_or(PoolError::EquipmentNotFound {
                        kind: EntityKind::Circuit,
                        id,
                    })?
                    .is_on;
                let on = match desired {
                    CircuitDesired::On => true,
                    CircuitDesired::Off => false,
                    CircuitDesired::Toggle => !current,
                };
                let frame = messages::circuit_state_frame(self.variant(), self.dest, self.src, id, on);
                let key = messages::response_key(self.dest, messages::ACTION_CIRCUIT_STATE, id);
                self.run(engine, frame, Some(key), priority, format!("setCircuitState({id})"))
                    .await
            }

            Intent::SetCircuitGroupState { id, on } => {
                if self.capabilities().circuit_groups == SupportLevel::None {
                    return Err(unsupported(self.controller_type, &Intent::SetCircuitGroupState { id, on }));
                }
                let frame = messages::circuit_group_state_frame(self.variant(), self.dest, self.src, id, on);
                let key = messages::response_key(self.dest, messages::ACTION_CIRCUIT_GROUP_STATE, id);
                self.run(engine, frame, Some(key), priority, format!("setCircuitGroupState({id})"))
                    .await
            }

            Intent::SetLightTheme { group_id, theme } => {
                if self.capabilities().light_themes == SupportLevel::None {
                    return Err(unsupported(self.controller_type, &Intent::SetLightTheme { group_id, theme }));
                }
                let frame = messages::light_theme_frame(self.variant(), self.dest, self.src, group_id, theme);
                let key = messages::response_key(self.dest, messages::ACTION_LIGHT_THEME, group_id);
                self.run(engine, frame, Some(key), priority, format!("setLightTheme({group_id})"))
                    .await
            }

            Intent::SetBodyHeatMode { body_id, mode } => {
                let body = model
                    .config
                    .bodies
                    .get(body_id)
                    .ok_or(PoolError::EquipmentNotFound {
                        kind: EntityKind::Body,
                        id: body_id,
                    })?;
                if !body.permits(mode) {
                    return Err(PoolError::InvalidEquipmentData {
                        kind: EntityKind::Body,
                        id: body_id,
                        field: "heatMode",
                        reason: format!("{mode:?} not permitted by this body's heatSources"),
                    });
                }
                let interlock_name = super::interlock_name_for_body(body.body_type);
                if let Some(name) = interlock_name {
                    delay.check_interlock(name)?;
                }
                let cooldown_key = DelayKey {
                    kind: EntityKind::Body,
                    id: body_id,
                    purpose: Purpose::HeaterCooldown,
                };
                delay.gate(cooldown_key, true).await?;

                let frame = messages::heat_mode_frame(self.variant(), self.dest, self.src, body_id, mode);
                let key = messages::response_key(self.dest, messages::ACTION_HEAT_MODE, body_id);
                let result = self
                    .run(engine, frame, Some(key), priority, format!("setBodyHeatMode({body_id})"))
                    .await;
                if result.is_ok() {
                    delay.start_timer(cooldown_key, crate::delay::HEATER_CHANGE_COOLDOWN);
                    if let Some(name) = interlock_name {
                        delay.set_interlock(name, mode != HeatMode::Off);
                    }
                }
                result
            }

            Intent::SetHeatSetpoint { body_id, tenths } => {
                self.validate_setpoint(body_id, tenths)?;
                let frame = messages::heat_setpoint_frame(self.variant(), self.dest, self.src, body_id, tenths);
                let key = messages::response_key(self.dest, messages::ACTION_HEAT_SETPOINT, body_id);
                self.run(engine, frame, Some(key), priority, format!("setHeatSetpoint({body_id})"))
                    .await
            }

            Intent::SetCoolSetpoint { body_id, tenths } => {
                self.validate_setpoint(body_id, tenths)?;
                let frame = messages::cool_setpoint_frame(self.variant(), self.dest, self.src, body_id, tenths);
                let key = messages::response_key(self.dest, messages::ACTION_COOL_SETPOINT, body_id);
                self.run(engine, frame, Some(key), priority, format!("setCoolSetpoint({body_id})"))
                    .await
            }

            Intent::SetPumpSpeed { id, target } => {
                self.validate_pump_target(target)?;
                let frame = messages::pump_speed_frame(self.variant(), self.dest, self.src, id, target);
                let key = messages::response_key(self.dest, messages::ACTION_PUMP_SPEED, id);
                self.run(engine, frame, Some(key), priority, format!("setPumpSpeed({id})"))
                    .await
            }

            Intent::SetChlorinator {
                id,
                pool_setpoint,
                spa_setpoint,
                super_chlor,
                super_chlor_hours,
            } => {
                if !self.capabilities().chlorinator {
                    return Err(unsupported(
                        self.controller_type,
                        &Intent::SetChlorinator {
                            id,
                            pool_setpoint,
                            spa_setpoint,
                            super_chlor,
                            super_chlor_hours,
                        },
                    ));
                }
                super::validate_percent_range(id, "poolSetpoint", pool_setpoint)?;
                super::validate_percent_range(id, "spaSetpoint", spa_setpoint)?;
                let frame = messages::chlorinator_frame(
                    self.variant(),
                    self.dest,
                    self.src,
                    id,
                    pool_setpoint,
                    spa_setpoint,
                    super_chlor,
                    super_chlor_hours,
                );
                let key = messages::response_key(self.dest, messages::ACTION_CHLORINATOR, id);
                self.run(engine, frame, Some(key), priority, format!("setChlorinator({id})"))
                    .await
            }

            Intent::SetChemSetpoint { id, chem, value } => {
                if !self.capabilities().intellichem_binding {
                    return Err(unsupported(self.controller_type, &Intent::SetChemSetpoint { id, chem, value }));
                }
                self.validate_chem_setpoint(chem, value)?;
                let action = messages::ACTION_CHEM_SETPOINT;
                let payload = vec![id as u8, u8::from(chem == ChemKind::Orp), (value >> 8) as u8, value as u8];
                let frame = Frame::new(self.variant(), self.dest, self.src, action, payload);
                let key = messages::response_key(self.dest, action, id);
                self.run(engine, frame, Some(key), priority, format!("setChemSetpoint({id})"))
                    .await
            }

            Intent::SetClock { datetime } => {
                let frame = messages::clock_frame(self.variant(), self.dest, self.src, datetime);
                self.run(engine, frame, None, priority, "setClock".into()).await
            }

            Intent::RequestConfiguration { scope } => {
                let frame = messages::request_frame(
                    self.variant(),
                    self.dest,
                    self.src,
                    messages::ACTION_REQUEST_CONFIG,
                    scope_byte(scope),
                );
                self.run(engine, frame, None, priority, "requestConfiguration".into()).await
            }

            Intent::RequestStatus { scope } => {
                let frame = messages::request_frame(
                    self.variant(),
                    self.dest,
                    self.src,
                    messages::ACTION_REQUEST_STATUS,
                    scope_byte(scope),
                );
                self.run(engine, frame, None, priority, "requestStatus".into()).await
            }
        }
    }

    /// Try every decoder in the action-code surface in turn. One frame
    /// carries exactly one action code, so at most one of these matches.
    pub fn decode(&self, frame: &Frame) -> Vec<DecodedUpdate> {
        if let Some((id, is_on)) = messages::decode_circuit_state(frame) {
            return vec![DecodedUpdate::CircuitIsOn { id, is_on }];
        }
        if let Some((id, is_on)) = messages::decode_circuit_group_state(frame) {
            return vec![DecodedUpdate::CircuitGroupIsOn { id, is_on }];
        }
        if let Some((id, theme)) = messages::decode_light_theme(frame) {
            return vec![DecodedUpdate::LightGroupTheme { id, theme }];
        }
        if let Some((id, mode)) = messages::decode_heat_mode(frame) {
            return vec![DecodedUpdate::BodyHeatMode { id, mode }];
        }
        if let Some((id, tenths)) = messages::decode_setpoint(frame, messages::ACTION_HEAT_SETPOINT) {
            return vec![DecodedUpdate::BodySetpoint {
                id,
                tenths,
                is_heat: true,
            }];
        }
        if let Some((id, tenths)) = messages::decode_setpoint(frame, messages::ACTION_COOL_SETPOINT) {
            return vec![DecodedUpdate::BodySetpoint {
                id,
                tenths,
                is_heat: false,
            }];
        }
        if let Some((id, status, rpm, watts)) = messages::decode_pump_status(frame) {
            return vec![DecodedUpdate::PumpStatus { id, status, rpm, watts }];
        }
        if let Some((id, current_output, salt_ppm, status)) = messages::decode_chlorinator_status(frame) {
            return vec![DecodedUpdate::ChlorinatorStatus {
                id,
                current_output,
                salt_ppm,
                status,
            }];
        }
        if let Some((id, chem, level, tank_level)) = messages::decode_chem_reading(frame) {
            return vec![DecodedUpdate::ChemReading {
                id,
                chem,
                level,
                tank_level,
            }];
        }
        if let Some((id, is_on)) = messages::decode_schedule_trigger(frame) {
            return vec![DecodedUpdate::ScheduleIsOn { id, is_on }];
        }
        if let Some((id, is_on, position)) = messages::decode_valve_position(frame) {
            return vec![DecodedUpdate::ValvePosition { id, is_on, position }];
        }
        if let Some((id, pressure, clean_percentage)) = messages::decode_filter_pressure(frame) {
            return vec![DecodedUpdate::FilterPressure {
                id,
                pressure,
                clean_percentage,
            }];
        }
        if let Some((id, is_closed)) = messages::decode_cover_state(frame) {
            return vec![DecodedUpdate::CoverIsClosed { id, is_closed }];
        }
        if let Some(status) = messages::decode_equipment_status(frame) {
            return vec![DecodedUpdate::EquipmentStatus { status }];
        }
        Vec::new()
    }

    async fn run(
        &self,
        engine: &TransactionEngine,
        frame: Frame,
        expected: Option<crate::transaction::ResponseKey>,
        priority: Priority,
        descriptor: String,
    ) -> Result<()> {
        let (rx, _cancel) = engine
            .enqueue(Transaction {
                frame,
                expected,
                descriptor,
                priority,
            })
            .await;
        match rx.await {
            Ok(TransactionOutcome::Succeeded(_)) => Ok(()),
            Ok(TransactionOutcome::Failed(e)) => Err(e),
            Ok(TransactionOutcome::Cancelled) => Err(PoolError::Cancelled),
            Err(_) => Err(PoolError::Internal("transaction engine dropped outcome channel".into())),
        }
    }

    fn validate_setpoint(&self, body_id: crate::model::Id, tenths: i16) -> Result<()> {
        super::validate_setpoint_range(body_id, tenths)
    }

    fn validate_pump_target(&self, target: PumpTarget) -> Result<()> {
        super::validate_pump_target_range(target)
    }

    fn validate_chem_setpoint(&self, chem: ChemKind, value: u16) -> Result<()> {
        super::validate_chem_setpoint_range(chem, value)
    }
}

fn scope_byte(scope: super::Scope) -> u8 {
    match scope {
        super::Scope::All => 0xFF,
        super::Scope::Kind(kind) => kind as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::circuit::CircuitState;
    use crate::model::graph::{PoolConfig, PoolState};

    fn model_with_circuit(id: crate::model::Id, is_on: bool) -> EquipmentModel {
        let mut state = PoolState::default();
        state.circuits.upsert(
            id,
            CircuitState {
                id,
                is_on,
                end_time: None,
                lighting_theme: None,
            },
        );
        let mut config = PoolConfig::default();
        config.circuits.upsert(
            id,
            crate::model::circuit::CircuitConfig {
                id,
                name: "Pool".into(),
                function: crate::model::circuit::CircuitFunction::Pool,
                show_in_features: true,
                freeze_protect: false,
                egg_timer_minutes: 0,
            },
        );
        EquipmentModel::new(config, state)
    }

    #[test]
    fn rejects_setpoint_out_of_range() {
        let board = PentairBoard::new(ControllerType::IntelliTouch, 0x10, 0x00);
        assert!(board.validate_setpoint(1, 1200).is_err());
        assert!(board.validate_setpoint(1, 800).is_ok());
    }

    #[test]
    fn circuit_not_found_surfaces_equipment_not_found() {
        let model = model_with_circuit(6, true);
        assert!(model.state.circuits.get(99).is_none());
    }

    #[test]
    fn sun_touch_has_no_chlorinator_capability() {
        let board = PentairBoard::new(ControllerType::SunTouch, 0x10, 0x00);
        assert!(!board.capabilities().chlorinator);
    }
}
