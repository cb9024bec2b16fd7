//! Body entity (§3 Data Model table): pool/spa/auxiliary water bodies.

use serde::{Deserialize, Serialize};

use super::Id;

bitflags::bitflags! {
    /// Which heat sources this body may draw on. The controller-variant
    /// capability matrix (§4.5) further restricts which bits are legal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct HeatSources: u8 {
        const GAS       = 0b0000_0001;
        const SOLAR     = 0b0000_0010;
        const HEAT_PUMP = 0b0000_0100;
        const ULTRATEMP = 0b0000_1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    Pool,
    Spa,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatMode {
    Off,
    Heater,
    Solar,
    SolarPreferred,
    HeatPump,
    UltraTemp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatStatus {
    Off,
    Heating,
    Cooling,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    pub id: Id,
    pub name: String,
    #[serde(rename = "type")]
    pub body_type: BodyType,
    /// Gallons (or variant-native unit); purely descriptive at this layer.
    pub capacity: u32,
    pub heat_sources: HeatSources,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub id: Id,
    /// Tenths of a degree, in the controller's native unit.
    pub temp: i16,
    pub set_point: i16,
    pub heat_mode: HeatMode,
    pub heat_status: HeatStatus,
    pub is_on: bool,
    pub solar_temp: Option<i16>,
}

impl BodyConfig {
    /// §3 invariant: "A body's heatMode must be permitted by its
    /// heatSources bitmask for the current controller variant." This checks
    /// the bitmask side only; the Board's own capability gate (§4.5) is a
    /// separate check made before this one ever runs.
    pub fn permits(&self, mode: HeatMode) -> bool {
        match mode {
            HeatMode::Off => true,
            HeatMode::Heater => self.heat_sources.contains(HeatSources::GAS),
            HeatMode::Solar | HeatMode::SolarPreferred => {
                self.heat_sources.contains(HeatSources::SOLAR)
            }
            HeatMode::HeatPump => self.heat_sources.contains(HeatSources::HEAT_PUMP),
            HeatMode::UltraTemp => self.heat_sources.contains(HeatSources::ULTRATEMP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_mode_requires_matching_source() {
        let cfg = BodyConfig {
            id: 1,
            name: "Pool".into(),
            body_type: BodyType::Pool,
            capacity: 20000,
            heat_sources: HeatSources::GAS,
        };
        assert!(cfg.permits(HeatMode::Heater));
        assert!(!cfg.permits(HeatMode::Solar));
        assert!(cfg.permits(HeatMode::Off));
    }
}
