//! Cover entity (§3): automatic pool/spa cover.

use serde::{Deserialize, Serialize};

use super::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverConfig {
    pub id: Id,
    pub body: Id,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverState {
    pub id: Id,
    pub is_closed: bool,
}
