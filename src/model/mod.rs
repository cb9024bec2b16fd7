//! Equipment Model (§3, §4.6): the configuration graph and the live-state
//! graph that mirrors it, plus the generic `Collection<T>` every entity
//! kind is stored in.

pub mod body;
pub mod chemcontroller;
pub mod chlorinator;
pub mod circuit;
pub mod collection;
pub mod cover;
pub mod equipment;
pub mod feature;
pub mod filter;
pub mod graph;
pub mod group;
pub mod heater;
pub mod pump;
pub mod schedule;
pub mod valve;

pub use collection::{Collection, Patch};
pub use graph::EquipmentModel;

use std::fmt;

/// Every addressable entity kind in the Data Model table (§3). Used for
/// error payloads, event topics, and delay-manager keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Body,
    Circuit,
    Feature,
    Pump,
    Heater,
    Chlorinator,
    ChemController,
    Schedule,
    Valve,
    Filter,
    CircuitGroup,
    LightGroup,
    Cover,
    Equipment,
}

impl EntityKind {
    /// The event-stream topic name this entity kind publishes under (§6).
    pub fn topic(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Circuit => "circuit",
            Self::Feature => "feature",
            Self::Pump => "pump",
            Self::Heater => "heater",
            Self::Chlorinator => "chlorinator",
            Self::ChemController => "chemController",
            Self::Schedule => "schedule",
            Self::Valve => "valve",
            Self::Filter => "filter",
            Self::CircuitGroup => "circuitGroup",
            Self::LightGroup => "lightGroup",
            Self::Cover => "cover",
            Self::Equipment => "equipment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.topic())
    }
}

/// Stable 1-based integer identity, per §3's "id is stable for the life of
/// an item; renumbering is forbidden once a state counterpart exists."
pub type Id = u32;
