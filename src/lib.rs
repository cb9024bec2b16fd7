//! Pool automation bridge core library.
//!
//! Exposes every layer (Port, Frame Codec, Transaction Engine, Board
//! Dispatch, Equipment Model, Change Engine, Delay Manager, Schedule
//! Execution) for the daemon binary and for integration tests.

#![deny(unused_must_use)]

pub mod board;
pub mod change;
pub mod codec;
pub mod config;
pub mod context;
pub mod controller_type;
pub mod delay;
pub mod model;
pub mod port;
pub mod scheduler;
pub mod sun;
pub mod transaction;
pub mod valuemap;

pub mod error;

use std::sync::Arc;

use board::{Board, CircuitDesired, Intent};
use change::ChangeEngine;
use delay::DelayManager;
use error::Result;
use model::EquipmentModel;
use transaction::{Priority, TransactionEngine};

/// The one seam this core exposes upward (§0.1): a caller hands over an
/// `Intent` and gets back either a dispatched-and-committed change or the
/// error that kept it from happening. Everything above this layer (the
/// daemon's wire server, a CLI, a test) goes through here rather than
/// juggling `Board`/`ChangeEngine`/`DelayManager` directly.
pub struct PoolBridge {
    board: Arc<Board>,
    txn: Arc<TransactionEngine>,
    change: Arc<ChangeEngine>,
    delay: Arc<DelayManager>,
}

impl PoolBridge {
    pub fn new(
        board: Arc<Board>,
        txn: Arc<TransactionEngine>,
        change: Arc<ChangeEngine>,
        delay: Arc<DelayManager>,
    ) -> Self {
        Self {
            board,
            txn,
            change,
            delay,
        }
    }

    /// What this controller variant can do (§4.5); callers use this to
    /// skip offering UI for intents that would just come back `Err`.
    pub fn capabilities(&self) -> board::Capabilities {
        self.board.capabilities()
    }

    /// Validate and queue `intent` through Board Dispatch, then commit
    /// the optimistic result through the Change Engine on success. The
    /// snapshot taken for dispatch is the same one `commit` resolves
    /// `CircuitDesired::Toggle` against, so the committed state always
    /// matches what the wire frame was built from.
    pub async fn dispatch(&self, intent: Intent, priority: Priority) -> Result<()> {
        let config = self.change.config_snapshot().await;
        let state = self.change.state_snapshot().await;
        let model = EquipmentModel::new(config, state);

        self.board
            .dispatch(intent.clone(), &model, &self.txn, &self.delay, priority)
            .await?;

        self.commit(intent, &model).await;
        Ok(())
    }

    /// Apply the optimistic post-image of a successfully dispatched
    /// intent. `RequestConfiguration`/`RequestStatus`/`SetClock` have no
    /// local state to update; their effect arrives later as a decoded
    /// update from the wire.
    async fn commit(&self, intent: Intent, model: &EquipmentModel) {
        match intent {
            Intent::SetCircuitState { id, desired } => {
                let on = match desired {
                    CircuitDesired::On => true,
                    CircuitDesired::Off => false,
                    CircuitDesired::Toggle => model
                        .state
                        .circuits
                        .get(id)
                        .map(|c| !c.is_on)
                        .unwrap_or(false),
                };
                self.change.set_circuit_is_on(id, on).await;
            }
            Intent::SetCircuitGroupState { id, on } => {
                self.change.set_circuit_group_is_on(id, on).await;
            }
            Intent::SetLightTheme { group_id, theme } => {
                self.change.set_light_group_theme(group_id, theme).await;
            }
            Intent::SetBodyHeatMode { body_id, mode } => {
                self.change.set_body_heat_mode(body_id, mode).await;
            }
            Intent::SetHeatSetpoint { body_id, tenths } | Intent::SetCoolSetpoint { body_id, tenths } => {
                self.change.set_body_set_point(body_id, tenths).await;
            }
            Intent::SetPumpSpeed { id, target } => {
                self.change.set_pump_target(id, target).await;
            }
            Intent::SetChlorinator {
                id,
                pool_setpoint,
                spa_setpoint,
                super_chlor,
                super_chlor_hours,
            } => {
                self.change
                    .set_chlorinator_setpoints(id, pool_setpoint, spa_setpoint, super_chlor_hours)
                    .await;
                self.change.set_chlorinator_super_chlor(id, super_chlor).await;
            }
            Intent::SetChemSetpoint { id, chem, value } => {
                self.change.set_chem_setpoint(id, chem, value).await;
            }
            Intent::SetClock { .. }
            | Intent::RequestConfiguration { .. }
            | Intent::RequestStatus { .. } => {}
        }
    }
}
