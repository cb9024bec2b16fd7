//! Host-driven board realization (§4.5): no wire protocol at all — every
//! intent applies directly to the equipment model and is accepted or
//! rejected synchronously. Used when the bridge is the sole source of
//! truth rather than a gateway onto a physical controller.

use crate::delay::{DelayKey, DelayManager, Purpose};
use crate::error::{PoolError, Result};
use crate::model::body::HeatMode;
use crate::model::{EntityKind, EquipmentModel};

use super::{unsupported, CircuitDesired, ControllerType, Intent};

pub struct StandaloneBoard;

impl StandaloneBoard {
    pub fn new() -> Self {
        Self
    }

    /// Standalone has no transaction engine to queue through; every
    /// intent either applies immediately against `model` or fails with
    /// `InvalidOperation` if it presumes wire behavior this variant
    /// doesn't have (requests to a physical board). `delay` still gates
    /// and arms the heater interlock/cooldown the same way the wire
    /// variants do (§4.7), since this host is equally capable of driving
    /// a shared heater.
    pub fn dispatch(&self, intent: Intent, model: &EquipmentModel, delay: &DelayManager) -> Result<()> {
        match intent {
            Intent::SetCircuitState { id, desired } => {
                let circuit = model
                    .state
                    .circuits
                    .get(id)
                    .ok_or(PoolError::EquipmentNotFound {
                        kind: EntityKind::Circuit,
                        id,
                    })?;
                let _on = match desired {
                    CircuitDesired::On => true,
                    CircuitDesired::Off => false,
                    CircuitDesired::Toggle => !circuit.is_on,
                };
                // Applied by the caller through the Change Engine, which
                // owns the mutable model; this variant only validates.
                Ok(())
            }

            Intent::SetCircuitGroupState { id, .. } => {
                model
                    .state
                    .circuit_groups
                    .get(id)
                    .ok_or(PoolError::EquipmentNotFound {
                        kind: EntityKind::CircuitGroup,
                        id,
                    })?;
                Ok(())
            }

            Intent::SetLightTheme { group_id, .. } => {
                model
                    .state
                    .light_groups
                    .get(group_id)
                    .ok_or(PoolError::EquipmentNotFound {
                        kind: EntityKind::LightGroup,
                        id: group_id,
                    })?;
                Ok(())
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
                delay.check_cooldown(cooldown_key)?;
                delay.start_timer(cooldown_key, crate::delay::HEATER_CHANGE_COOLDOWN);
                if let Some(name) = interlock_name {
                    delay.set_interlock(name, mode != HeatMode::Off);
                }
                Ok(())
            }

            Intent::SetHeatSetpoint { body_id, tenths } | Intent::SetCoolSetpoint { body_id, tenths } => {
                super::validate_setpoint_range(body_id, tenths)
            }

            Intent::SetPumpSpeed { target, .. } => super::validate_pump_target_range(target),

            Intent::SetChlorinator {
                id,
                pool_setpoint,
                spa_setpoint,
                ..
            } => {
                super::validate_percent_range(id, "poolSetpoint", pool_setpoint)?;
                super::validate_percent_range(id, "spaSetpoint", spa_setpoint)
            }

            Intent::SetChemSetpoint { chem, value, .. } => super::validate_chem_setpoint_range(chem, value),

            Intent::SetClock { .. } => Ok(()),

            Intent::RequestConfiguration { .. } | Intent::RequestStatus { .. } => {
                Err(unsupported(ControllerType::Standalone, &intent))
            }
        }
    }
}

impl Default for StandaloneBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::DelayManager;
    use crate::model::circuit::{CircuitConfig, CircuitFunction, CircuitState};
    use crate::model::graph::{PoolConfig, PoolState};

    #[test]
    fn request_intents_are_unsupported_without_a_wire() {
        let model = EquipmentModel::default();
        let board = StandaloneBoard::new();
        let delay = DelayManager::new(Vec::new());
        let result = board.dispatch(
            Intent::RequestStatus {
                scope: super::super::Scope::All,
            },
            &model,
            &delay,
        );
        assert!(matches!(result, Err(PoolError::InvalidOperation { .. })));
    }

    #[test]
    fn set_circuit_state_validates_existence() {
        let mut config = PoolConfig::default();
        config.circuits.upsert(
            6,
            CircuitConfig {
                id: 6,
                name: "Pool".into(),
                function: CircuitFunction::Pool,
                show_in_features: true,
                freeze_protect: false,
                egg_timer_minutes: 0,
            },
        );
        let mut state = PoolState::default();
        state.circuits.upsert(
            6,
            CircuitState {
                id: 6,
                is_on: false,
                end_time: None,
                lighting_theme: None,
            },
        );
        let model = EquipmentModel::new(config, state);
        let board = StandaloneBoard::new();
        let delay = DelayManager::new(Vec::new());
        assert!(board
            .dispatch(
                Intent::SetCircuitState {
                    id: 6,
                    desired: CircuitDesired::On
                },
                &model,
                &delay,
            )
            .is_ok());
        assert!(board
            .dispatch(
                Intent::SetCircuitState {
                    id: 99,
                    desired: CircuitDesired::On
                },
                &model,
                &delay,
            )
            .is_err());
    }

    #[test]
    fn unsupported_intents_are_rejected_not_silently_accepted() {
        let model = EquipmentModel::default();
        let board = StandaloneBoard::new();
        let delay = DelayManager::new(Vec::new());
        assert!(board
            .dispatch(
                Intent::SetChemSetpoint {
                    id: 1,
                    chem: super::super::ChemKind::Ph,
                    value: 100,
                },
                &model,
                &delay,
            )
            .is_err());
    }
}
