//! Feature entity (§3): a circuit-like switch with no direct wire output
//! of its own — typically a macro that the board dispatch fans out to
//! one or more real circuits.

use serde::{Deserialize, Serialize};

use super::circuit::CircuitFunction;
use super::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub id: Id,
    pub name: String,
    pub function: CircuitFunction,
    pub show_in_features: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureState {
    pub id: Id,
    pub is_on: bool,
    pub end_time: Option<u16>,
}
