//! Change Engine (§4.6): the single-writer commit lane in front of the
//! equipment/state graph. Every mutation goes through `commit`, which
//! applies a typed patch method, and — only when the patch isn't a
//! no-op — fans out an event and marks the owning root dirty for the
//! debounced writer. This is the "typed patch methods that internally
//! journal a diff" approach from the Design Notes, not a transparent
//! object-membrane.

pub mod events;
pub mod persistence;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::model::collection::{Collection, Patch};
use crate::model::graph::{PoolConfig, PoolState};
use crate::model::{EquipmentModel, Id};

use events::{Event, EventBus};
use persistence::DebouncedWriter;

pub struct ChangeEngine {
    model: Mutex<EquipmentModel>,
    bus: EventBus,
    config_path: PathBuf,
    state_path: PathBuf,
    config_writer: DebouncedWriter<PoolConfig>,
    state_writer: DebouncedWriter<PoolState>,
}

impl ChangeEngine {
    pub fn new(model: EquipmentModel, config_path: PathBuf, state_path: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            model: Mutex::new(model),
            bus: EventBus::new(),
            config_writer: DebouncedWriter::spawn(config_path.clone()),
            state_writer: DebouncedWriter::spawn(state_path.clone()),
            config_path,
            state_path,
        })
    }

    /// Bypass the debounce window and write both roots immediately
    /// (§5 shutdown: the final flush cannot wait out `MAX_FLUSH_DELAY`).
    pub async fn flush_now(&self) {
        let model = self.model.lock().await;
        if let Err(e) = persistence::write_atomic(&self.config_path, &model.config).await {
            log::error!("{}: final flush failed: {e}", self.config_path.display());
        }
        if let Err(e) = persistence::write_atomic(&self.state_path, &model.state).await {
            log::error!("{}: final flush failed: {e}", self.state_path.display());
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// Publish `configuration-reloaded` (§6 hot-reload): the overlay
    /// file changed, but comms/location settings only take effect on
    /// the next process start, so there's no model mutation to commit.
    pub fn publish_configuration_reloaded(&self) {
        self.bus.publish(Event::configuration_reloaded());
    }

    pub async fn config_snapshot(&self) -> PoolConfig {
        self.model.lock().await.config.clone()
    }

    pub async fn state_snapshot(&self) -> PoolState {
        self.model.lock().await.state.clone()
    }

    /// Apply `mutate` to the state entity `id` in the collection `select`
    /// returns, then — if the result differs from before — publish
    /// `to_event(after)` and mark *pool-state* dirty. Returns the patch,
    /// or `None` if no entity with `id` exists.
    pub async fn commit_state<T>(
        &self,
        select: impl FnOnce(&mut PoolState) -> &mut Collection<T>,
        id: Id,
        mutate: impl FnOnce(&mut T),
        to_event: impl FnOnce(&T) -> Event,
    ) -> Option<Patch<T>>
    where
        T: Clone + PartialEq,
    {
        let mut model = self.model.lock().await;
        let patch = select(&mut model.state).mutate(id, mutate)?;
        if !patch.is_noop() {
            if let Some(after) = &patch.after {
                self.bus.publish(to_event(after));
            }
            self.state_writer.mark_dirty(model.state.clone());
        }
        Some(patch)
    }

    /// Apply `mutate` to the config entity `id`, publish on real change,
    /// mark *pool-config* dirty, and re-run orphan pruning against the
    /// updated config (a config delete can orphan state, §3).
    pub async fn commit_config<T>(
        &self,
        select: impl FnOnce(&mut PoolConfig) -> &mut Collection<T>,
        id: Id,
        mutate: impl FnOnce(&mut T),
        to_event: impl FnOnce(&T) -> Event,
    ) -> Option<Patch<T>>
    where
        T: Clone + PartialEq,
    {
        let mut model = self.model.lock().await;
        let patch = select(&mut model.config).mutate(id, mutate)?;
        if !patch.is_noop() {
            if let Some(after) = &patch.after {
                self.bus.publish(to_event(after));
            }
            model.prune_orphan_state();
            self.config_writer.mark_dirty(model.config.clone());
            self.state_writer.mark_dirty(model.state.clone());
        }
        Some(patch)
    }

    /// Set a circuit's `isOn` flag, used by both optimistic intent
    /// application and wire-confirmed decode updates.
    pub async fn set_circuit_is_on(&self, id: Id, is_on: bool) -> Option<Patch<crate::model::circuit::CircuitState>> {
        self.commit_state(
            |state| &mut state.circuits,
            id,
            |circuit| circuit.is_on = is_on,
            |after| Event::circuit(after.id, after.is_on),
        )
        .await
    }

    pub async fn set_body_heat_mode(
        &self,
        id: Id,
        mode: crate::model::body::HeatMode,
    ) -> Option<Patch<crate::model::body::BodyState>> {
        self.commit_state(
            |state| &mut state.bodies,
            id,
            |body| body.heat_mode = mode,
            |after| Event::field(crate::model::EntityKind::Body, after.id, "heatMode", serde_json::json!(after.heat_mode)),
        )
        .await
    }

    pub async fn set_body_set_point(&self, id: Id, tenths: i16) -> Option<Patch<crate::model::body::BodyState>> {
        self.commit_state(
            |state| &mut state.bodies,
            id,
            |body| body.set_point = tenths,
            |after| Event::field(crate::model::EntityKind::Body, after.id, "setPoint", serde_json::json!(after.set_point)),
        )
        .await
    }

    pub async fn set_circuit_group_is_on(&self, id: Id, is_on: bool) -> Option<Patch<crate::model::group::GroupState>> {
        self.commit_state(
            |state| &mut state.circuit_groups,
            id,
            move |group| group.is_on = is_on,
            |after| Event::field(crate::model::EntityKind::CircuitGroup, after.id, "isOn", serde_json::json!(after.is_on)),
        )
        .await
    }

    pub async fn set_light_group_theme(&self, id: Id, theme: u8) -> Option<Patch<crate::model::group::GroupState>> {
        self.commit_state(
            |state| &mut state.light_groups,
            id,
            move |group| group.lighting_theme = Some(theme),
            |after| {
                Event::field(
                    crate::model::EntityKind::LightGroup,
                    after.id,
                    "lightingTheme",
                    serde_json::json!(after.lighting_theme),
                )
            },
        )
        .await
    }

    /// Apply a pump-speed intent optimistically. `PumpTarget::Speed` has
    /// no direct state field on relay/single/dual pumps, so that arm is a
    /// no-op the patch machinery already treats as "nothing to publish".
    pub async fn set_pump_target(
        &self,
        id: Id,
        target: crate::board::messages::PumpTarget,
    ) -> Option<Patch<crate::model::pump::PumpState>> {
        use crate::board::messages::PumpTarget;
        self.commit_state(
            |state| &mut state.pumps,
            id,
            move |pump| match target {
                PumpTarget::Rpm(rpm) => pump.rpm = rpm,
                PumpTarget::Flow(gpm) => pump.flow_gpm = Some(gpm),
                PumpTarget::Speed(_) => {}
            },
            |after| Event::field(crate::model::EntityKind::Pump, after.id, "rpm", serde_json::json!(after.rpm)),
        )
        .await
    }

    pub async fn set_pump_status(
        &self,
        id: Id,
        status: crate::model::pump::PumpStatus,
        rpm: u16,
        watts: u16,
    ) -> Option<Patch<crate::model::pump::PumpState>> {
        self.commit_state(
            |state| &mut state.pumps,
            id,
            move |pump| {
                pump.status = status;
                pump.rpm = rpm;
                pump.watts = watts;
            },
            |after| {
                Event::new(
                    crate::model::EntityKind::Pump.topic(),
                    after.id,
                    vec!["status", "rpm", "watts"],
                    serde_json::json!({ "id": after.id, "status": after.status, "rpm": after.rpm, "watts": after.watts }),
                )
            },
        )
        .await
    }

    /// Commit a `setChlorinator` intent's configuration half (the output
    /// setpoints); the super-chlorinate flag is state, not config, and
    /// goes through [`Self::set_chlorinator_super_chlor`] instead.
    pub async fn set_chlorinator_setpoints(
        &self,
        id: Id,
        pool_setpoint: u8,
        spa_setpoint: u8,
        super_chlor_hours: u8,
    ) -> Option<Patch<crate::model::chlorinator::ChlorinatorConfig>> {
        self.commit_config(
            |config| &mut config.chlorinators,
            id,
            move |chlor| {
                chlor.pool_setpoint = pool_setpoint;
                chlor.spa_setpoint = spa_setpoint;
                chlor.super_chlor_hours = super_chlor_hours;
            },
            |after| {
                Event::new(
                    crate::model::EntityKind::Chlorinator.topic(),
                    after.id,
                    vec!["poolSetpoint", "spaSetpoint", "superChlorHours"],
                    serde_json::json!({
                        "id": after.id,
                        "poolSetpoint": after.pool_setpoint,
                        "spaSetpoint": after.spa_setpoint,
                        "superChlorHours": after.super_chlor_hours,
                    }),
                )
            },
        )
        .await
    }

    pub async fn set_chlorinator_super_chlor(&self, id: Id, super_chlor: bool) -> Option<Patch<crate::model::chlorinator::ChlorinatorState>> {
        self.commit_state(
            |state| &mut state.chlorinators,
            id,
            move |chlor| chlor.super_chlor = super_chlor,
            |after| Event::field(crate::model::EntityKind::Chlorinator, after.id, "superChlor", serde_json::json!(after.super_chlor)),
        )
        .await
    }

    pub async fn set_chlorinator_status(
        &self,
        id: Id,
        current_output: u8,
        salt_ppm: u16,
        status: crate::model::chlorinator::ChlorinatorStatus,
    ) -> Option<Patch<crate::model::chlorinator::ChlorinatorState>> {
        self.commit_state(
            |state| &mut state.chlorinators,
            id,
            move |chlor| {
                chlor.current_output = current_output;
                chlor.salt_level_ppm = salt_ppm;
                chlor.status = status;
            },
            |after| {
                Event::new(
                    crate::model::EntityKind::Chlorinator.topic(),
                    after.id,
                    vec!["currentOutput", "saltLevelPpm", "status"],
                    serde_json::json!({
                        "id": after.id,
                        "currentOutput": after.current_output,
                        "saltLevelPpm": after.salt_level_ppm,
                        "status": after.status,
                    }),
                )
            },
        )
        .await
    }

    pub async fn set_chem_setpoint(
        &self,
        id: Id,
        chem: crate::board::ChemKind,
        value: u16,
    ) -> Option<Patch<crate::model::chemcontroller::ChemControllerConfig>> {
        use crate::board::ChemKind;
        self.commit_config(
            |config| &mut config.chem_controllers,
            id,
            move |chem_ctrl| match chem {
                ChemKind::Ph => chem_ctrl.ph_setpoint = value,
                ChemKind::Orp => chem_ctrl.orp_setpoint = value,
            },
            move |after| {
                let (field, value) = match chem {
                    ChemKind::Ph => ("phSetpoint", after.ph_setpoint),
                    ChemKind::Orp => ("orpSetpoint", after.orp_setpoint),
                };
                Event::field(crate::model::EntityKind::ChemController, after.id, field, serde_json::json!(value))
            },
        )
        .await
    }

    pub async fn set_chem_reading(
        &self,
        id: Id,
        chem: crate::board::ChemKind,
        level: i16,
        tank_level: u8,
    ) -> Option<Patch<crate::model::chemcontroller::ChemControllerState>> {
        use crate::board::ChemKind;
        self.commit_state(
            |state| &mut state.chem_controllers,
            id,
            move |chem_state| match chem {
                ChemKind::Ph => {
                    chem_state.ph.level = level as i32;
                    chem_state.ph.tank_level = tank_level;
                }
                ChemKind::Orp => {
                    chem_state.orp.level = level as i32;
                    chem_state.orp.tank_level = tank_level;
                }
            },
            move |after| {
                let (field, reading) = match chem {
                    ChemKind::Ph => ("ph", &after.ph),
                    ChemKind::Orp => ("orp", &after.orp),
                };
                Event::field(crate::model::EntityKind::ChemController, after.id, field, serde_json::json!(reading))
            },
        )
        .await
    }

    pub async fn set_schedule_is_on(&self, id: Id, is_on: bool) -> Option<Patch<crate::model::schedule::ScheduleState>> {
        self.commit_state(
            |state| &mut state.schedules,
            id,
            move |schedule| schedule.is_on = is_on,
            |after| Event::field(crate::model::EntityKind::Schedule, after.id, "isOn", serde_json::json!(after.is_on)),
        )
        .await
    }

    pub async fn set_valve_position(&self, id: Id, is_on: bool, position: u8) -> Option<Patch<crate::model::valve::ValveState>> {
        self.commit_state(
            |state| &mut state.valves,
            id,
            move |valve| {
                valve.is_on = is_on;
                valve.position = position;
            },
            |after| {
                Event::new(
                    crate::model::EntityKind::Valve.topic(),
                    after.id,
                    vec!["isOn", "position"],
                    serde_json::json!({ "id": after.id, "isOn": after.is_on, "position": after.position }),
                )
            },
        )
        .await
    }

    pub async fn set_filter_pressure(&self, id: Id, pressure: u8, clean_percentage: u8) -> Option<Patch<crate::model::filter::FilterState>> {
        self.commit_state(
            |state| &mut state.filters,
            id,
            move |filter| {
                filter.pressure = pressure;
                filter.clean_percentage = clean_percentage;
            },
            |after| {
                Event::new(
                    crate::model::EntityKind::Filter.topic(),
                    after.id,
                    vec!["pressure", "cleanPercentage"],
                    serde_json::json!({ "id": after.id, "pressure": after.pressure, "cleanPercentage": after.clean_percentage }),
                )
            },
        )
        .await
    }

    pub async fn set_cover_is_closed(&self, id: Id, is_closed: bool) -> Option<Patch<crate::model::cover::CoverState>> {
        self.commit_state(
            |state| &mut state.covers,
            id,
            move |cover| cover.is_closed = is_closed,
            |after| Event::field(crate::model::EntityKind::Cover, after.id, "isClosed", serde_json::json!(after.is_closed)),
        )
        .await
    }

    /// The equipment collection has exactly one entry
    /// ([`crate::model::equipment::SINGLETON_ID`]); decoders pass the
    /// decoded status straight through without an id parameter.
    pub async fn set_equipment_status(&self, status: crate::model::equipment::EquipmentStatus) -> Option<Patch<crate::model::equipment::EquipmentState>> {
        self.commit_state(
            |state| &mut state.equipment,
            crate::model::equipment::SINGLETON_ID,
            move |equip| equip.status = status,
            |after| Event::field(crate::model::EntityKind::Equipment, after.id, "status", serde_json::json!(after.status)),
        )
        .await
    }

    /// Route a Board-decoded wire update to the matching commit method.
    pub async fn apply_decoded_update(&self, update: crate::board::DecodedUpdate) {
        use crate::board::DecodedUpdate;
        match update {
            DecodedUpdate::CircuitIsOn { id, is_on } => {
                self.set_circuit_is_on(id, is_on).await;
            }
            DecodedUpdate::CircuitGroupIsOn { id, is_on } => {
                self.set_circuit_group_is_on(id, is_on).await;
            }
            DecodedUpdate::LightGroupTheme { id, theme } => {
                self.set_light_group_theme(id, theme).await;
            }
            DecodedUpdate::BodyHeatMode { id, mode } => {
                self.set_body_heat_mode(id, mode).await;
            }
            DecodedUpdate::BodySetpoint { id, tenths, is_heat: _ } => {
                self.set_body_set_point(id, tenths).await;
            }
            DecodedUpdate::PumpStatus { id, status, rpm, watts } => {
                self.set_pump_status(id, status, rpm, watts).await;
            }
            DecodedUpdate::ChlorinatorStatus {
                id,
                current_output,
                salt_ppm,
                status,
            } => {
                self.set_chlorinator_status(id, current_output, salt_ppm, status).await;
            }
            DecodedUpdate::ChemReading { id, chem, level, tank_level } => {
                self.set_chem_reading(id, chem, level, tank_level).await;
            }
            DecodedUpdate::ScheduleIsOn { id, is_on } => {
                self.set_schedule_is_on(id, is_on).await;
            }
            DecodedUpdate::ValvePosition { id, is_on, position } => {
                self.set_valve_position(id, is_on, position).await;
            }
            DecodedUpdate::FilterPressure {
                id,
                pressure,
                clean_percentage,
            } => {
                self.set_filter_pressure(id, pressure, clean_percentage).await;
            }
            DecodedUpdate::CoverIsClosed { id, is_closed } => {
                self.set_cover_is_closed(id, is_closed).await;
            }
            DecodedUpdate::EquipmentStatus { status } => {
                self.set_equipment_status(status).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::body::{BodyState, HeatMode, HeatStatus};
    use crate::model::circuit::CircuitState;

    fn model_with_one_circuit() -> EquipmentModel {
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
        let mut config = PoolConfig::default();
        config.circuits.upsert(
            6,
            crate::model::circuit::CircuitConfig {
                id: 6,
                name: "Pool".into(),
                function: crate::model::circuit::CircuitFunction::Pool,
                show_in_features: true,
                freeze_protect: false,
                egg_timer_minutes: 0,
            },
        );
        EquipmentModel::new(config, state)
    }

    #[tokio::test]
    async fn commit_publishes_event_and_marks_dirty_on_real_change() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ChangeEngine::new(
            model_with_one_circuit(),
            dir.path().join("pool-config.json"),
            dir.path().join("pool-state.json"),
        );
        let (mut rx, _overflow) = engine.events().subscribe();

        let patch = engine.set_circuit_is_on(6, true).await.unwrap();
        assert!(!patch.is_noop());
        let event = rx.try_recv().expect("event published on real change");
        assert_eq!(event.topic, "circuit");
    }

    #[tokio::test]
    async fn repeated_identical_commit_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ChangeEngine::new(
            model_with_one_circuit(),
            dir.path().join("pool-config.json"),
            dir.path().join("pool-state.json"),
        );
        engine.set_circuit_is_on(6, true).await;
        let (mut rx, _overflow) = engine.events().subscribe();
        let patch = engine.set_circuit_is_on(6, true).await.unwrap();
        assert!(patch.is_noop());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn set_body_heat_mode_noop_suppresses_event() {
        let mut state = PoolState::default();
        state.bodies.upsert(
            1,
            BodyState {
                id: 1,
                temp: 780,
                set_point: 820,
                heat_mode: HeatMode::Heater,
                heat_status: HeatStatus::Off,
                is_on: true,
                solar_temp: None,
            },
        );
        let dir = tempfile::tempdir().unwrap();
        let engine = ChangeEngine::new(
            EquipmentModel::new(PoolConfig::default(), state),
            dir.path().join("pool-config.json"),
            dir.path().join("pool-state.json"),
        );
        let (mut rx, _overflow) = engine.events().subscribe();
        let patch = engine.set_body_heat_mode(1, HeatMode::Heater).await.unwrap();
        assert!(patch.is_noop());
        assert!(rx.try_recv().is_err());
    }

    fn model_with_pump_and_chlorinator() -> EquipmentModel {
        use crate::model::chlorinator::{ChlorinatorState, ChlorinatorStatus};
        use crate::model::pump::{PumpState, PumpStatus};

        let mut state = PoolState::default();
        state.pumps.upsert(
            2,
            PumpState {
                id: 2,
                rpm: 0,
                watts: 0,
                flow_gpm: None,
                status: PumpStatus::Off,
                drive_state: 0,
            },
        );
        state.chlorinators.upsert(
            3,
            ChlorinatorState {
                id: 3,
                current_output: 0,
                target_output: 0,
                salt_level_ppm: 0,
                salt_required: false,
                super_chlor: false,
                status: ChlorinatorStatus::Ok,
            },
        );
        EquipmentModel::new(PoolConfig::default(), state)
    }

    #[tokio::test]
    async fn apply_decoded_pump_status_updates_rpm_and_watts() {
        use crate::board::DecodedUpdate;
        use crate::model::pump::PumpStatus;

        let dir = tempfile::tempdir().unwrap();
        let engine = ChangeEngine::new(
            model_with_pump_and_chlorinator(),
            dir.path().join("pool-config.json"),
            dir.path().join("pool-state.json"),
        );
        engine
            .apply_decoded_update(DecodedUpdate::PumpStatus {
                id: 2,
                status: PumpStatus::Running,
                rpm: 2600,
                watts: 950,
            })
            .await;
        let state = engine.state_snapshot().await;
        let pump = state.pumps.get(2).unwrap();
        assert_eq!(pump.rpm, 2600);
        assert_eq!(pump.status, PumpStatus::Running);
    }

    #[tokio::test]
    async fn chlorinator_super_chlor_is_state_not_config() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ChangeEngine::new(
            model_with_pump_and_chlorinator(),
            dir.path().join("pool-config.json"),
            dir.path().join("pool-state.json"),
        );
        let patch = engine.set_chlorinator_super_chlor(3, true).await.unwrap();
        assert!(!patch.is_noop());
        assert!(engine.state_snapshot().await.chlorinators.get(3).unwrap().super_chlor);
    }
}
