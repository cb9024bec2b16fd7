//! Pump entity (§3): relay, single/dual-speed, VS/VSF/VF pumps.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PumpType {
    Relay,
    Single,
    Dual,
    Vs,
    Vsf,
    Vf,
}

/// One of up to eight circuit bindings on a VS/VSF pump: "when circuit X
/// is on, run at this speed or flow".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpCircuitBinding {
    pub circuit: Id,
    pub speed_rpm: Option<u16>,
    pub flow_gpm: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpConfig {
    pub id: Id,
    pub name: String,
    pub pump_type: PumpType,
    /// Bus address for pumps addressed independently of the main
    /// controller (VS/VSF/VF pumps typically are).
    pub address: u8,
    pub circuits: Vec<PumpCircuitBinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PumpStatus {
    Off,
    Running,
    Priming,
    Fault,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpState {
    pub id: Id,
    pub rpm: u16,
    pub watts: u16,
    pub flow_gpm: Option<u16>,
    pub status: PumpStatus,
    /// Drive-reported fault/state code; variant-specific meaning, decoded
    /// through the pump's value map at the API boundary.
    pub drive_state: u8,
}

impl PumpConfig {
    /// A VS/VSF/VF pump speaks on the bus directly; relay/single/dual
    /// pumps are just switched circuits from the protocol's point of view.
    pub fn is_addressable(&self) -> bool {
        matches!(
            self.pump_type,
            PumpType::Vs | PumpType::Vsf | PumpType::Vf
        )
    }
}
