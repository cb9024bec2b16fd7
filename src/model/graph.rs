//! The top-level configuration graph and state graph (§3, §6's
//! `pool-config` / `pool-state` file shapes) and the load-time orphan
//! pruning invariant from §3 ("Every state item's id references an
//! existing config item of the same kind; orphan state is pruned on
//! load").

use serde::{Deserialize, Serialize};

use super::body::{BodyConfig, BodyState};
use super::chemcontroller::{ChemControllerConfig, ChemControllerState};
use super::chlorinator::{ChlorinatorConfig, ChlorinatorState};
use super::circuit::{CircuitConfig, CircuitState};
use super::collection::Collection;
use super::cover::{CoverConfig, CoverState};
use super::equipment::{EquipmentConfig, EquipmentState};
use super::feature::{FeatureConfig, FeatureState};
use super::filter::{FilterConfig, FilterState};
use super::group::{GroupConfig, GroupState};
use super::heater::{HeaterConfig, HeaterState};
use super::pump::{PumpConfig, PumpState};
use super::schedule::{ScheduleConfig, ScheduleState};
use super::valve::{ValveConfig, ValveState};
use super::Id;

/// `pool-config` (§6): slowly-changing configuration for every entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    pub equipment: Collection<EquipmentConfig>,
    pub bodies: Collection<BodyConfig>,
    pub circuits: Collection<CircuitConfig>,
    pub features: Collection<FeatureConfig>,
    pub pumps: Collection<PumpConfig>,
    pub heaters: Collection<HeaterConfig>,
    pub chlorinators: Collection<ChlorinatorConfig>,
    pub chem_controllers: Collection<ChemControllerConfig>,
    pub schedules: Collection<ScheduleConfig>,
    pub valves: Collection<ValveConfig>,
    pub filters: Collection<FilterConfig>,
    pub circuit_groups: Collection<GroupConfig>,
    pub light_groups: Collection<GroupConfig>,
    pub covers: Collection<CoverConfig>,
    pub remotes: Collection<serde_json::Value>,
    #[serde(default)]
    pub options: serde_json::Value,
}

/// `pool-state` (§6): the parallel, rapidly-changing live-state shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolState {
    pub equipment: Collection<EquipmentState>,
    pub bodies: Collection<BodyState>,
    pub circuits: Collection<CircuitState>,
    pub features: Collection<FeatureState>,
    pub pumps: Collection<PumpState>,
    pub heaters: Collection<HeaterState>,
    pub chlorinators: Collection<ChlorinatorState>,
    pub chem_controllers: Collection<ChemControllerState>,
    pub schedules: Collection<ScheduleState>,
    pub valves: Collection<ValveState>,
    pub filters: Collection<FilterState>,
    pub circuit_groups: Collection<GroupState>,
    pub light_groups: Collection<GroupState>,
    pub covers: Collection<CoverState>,
}

/// The live configuration graph plus its state mirror, in one place so
/// callers (Board decoders, intent handlers, the scheduler) can reach
/// both halves of an entity without juggling two top-level objects.
#[derive(Debug, Clone, Default)]
pub struct EquipmentModel {
    pub config: PoolConfig,
    pub state: PoolState,
}

impl EquipmentModel {
    pub fn new(config: PoolConfig, state: PoolState) -> Self {
        let mut model = Self { config, state };
        model.prune_orphan_state();
        model
    }

    /// Remove every state item whose id has no configuration counterpart.
    /// Called once on load (§3, §8 invariant 5: "orphan counts are 0
    /// after load") and again whenever a config item is deleted.
    pub fn prune_orphan_state(&mut self) -> usize {
        let mut pruned = 0;
        pruned += self.state.bodies.prune_orphans(&ids(&self.config.bodies));
        pruned += self
            .state
            .circuits
            .prune_orphans(&ids(&self.config.circuits));
        pruned += self
            .state
            .features
            .prune_orphans(&ids(&self.config.features));
        pruned += self.state.pumps.prune_orphans(&ids(&self.config.pumps));
        pruned += self.state.heaters.prune_orphans(&ids(&self.config.heaters));
        pruned += self
            .state
            .chlorinators
            .prune_orphans(&ids(&self.config.chlorinators));
        pruned += self
            .state
            .chem_controllers
            .prune_orphans(&ids(&self.config.chem_controllers));
        pruned += self
            .state
            .schedules
            .prune_orphans(&ids(&self.config.schedules));
        pruned += self.state.valves.prune_orphans(&ids(&self.config.valves));
        pruned += self.state.filters.prune_orphans(&ids(&self.config.filters));
        pruned += self
            .state
            .circuit_groups
            .prune_orphans(&ids(&self.config.circuit_groups));
        pruned += self
            .state
            .light_groups
            .prune_orphans(&ids(&self.config.light_groups));
        pruned += self.state.covers.prune_orphans(&ids(&self.config.covers));
        pruned += self
            .state
            .equipment
            .prune_orphans(&ids(&self.config.equipment));
        pruned
    }
}

fn ids<T: Clone>(collection: &Collection<T>) -> std::collections::BTreeSet<Id> {
    collection.iter().map(|(id, _)| *id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::circuit::{CircuitFunction, CircuitConfig};

    #[test]
    fn orphan_state_is_pruned_on_construction() {
        let mut config = PoolConfig::default();
        config.circuits.upsert(
            1,
            CircuitConfig {
                id: 1,
                name: "Pool".into(),
                function: CircuitFunction::Pool,
                show_in_features: true,
                freeze_protect: false,
                egg_timer_minutes: 0,
            },
        );

        let mut state = PoolState::default();
        state.circuits.upsert(
            1,
            CircuitState {
                id: 1,
                is_on: false,
                end_time: None,
                lighting_theme: None,
            },
        );
        state.circuits.upsert(
            99,
            CircuitState {
                id: 99,
                is_on: true,
                end_time: None,
                lighting_theme: None,
            },
        );

        let model = EquipmentModel::new(config, state);
        assert!(model.state.circuits.get(1).is_some());
        assert!(model.state.circuits.get(99).is_none());
    }
}
