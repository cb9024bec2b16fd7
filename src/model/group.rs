//! CircuitGroup / LightGroup entities (§3): a named set of circuits driven
//! together, optionally with per-member swim delay and a shared lighting
//! theme.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupType {
    Circuit,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub circuit: Id,
    pub desired_state: bool,
    /// Seconds to wait after the group starts before driving this member,
    /// staggering high-current loads (ties into the Delay Manager's
    /// `startup-stagger` purpose).
    pub swim_delay_secs: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub id: Id,
    pub name: String,
    pub group_type: GroupType,
    pub circuits: Vec<GroupMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    pub id: Id,
    pub is_on: bool,
    pub end_time: Option<u16>,
    pub lighting_theme: Option<u8>,
}
