//! `ControllerType` — the tagged variant every Board realization, the
//! equipment singleton, and the error taxonomy key off (§4.5, §9 Design
//! Notes: "Prefer a tagged variant ... rather than deep inheritance").
//!
//! Lives at the crate root (rather than under `board::`) so that
//! `model::equipment` can reference it without a `model` ↔ `board` import
//! cycle.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ControllerType {
    IntelliCenter,
    IntelliTouch,
    EasyTouch,
    SunTouch,
    IntelliCom,
    AquaLink,
    Standalone,
}

impl ControllerType {
    pub const ALL: [ControllerType; 7] = [
        Self::IntelliCenter,
        Self::IntelliTouch,
        Self::EasyTouch,
        Self::SunTouch,
        Self::IntelliCom,
        Self::AquaLink,
        Self::Standalone,
    ];

    /// Which frame codec variant this controller type speaks on the wire
    /// (§4.2). `Standalone` has no wire at all; callers must not ask.
    pub fn frame_variant(self) -> Option<crate::codec::FrameVariant> {
        match self {
            Self::IntelliCenter => Some(crate::codec::FrameVariant::Pentair2),
            Self::IntelliTouch
            | Self::EasyTouch
            | Self::SunTouch
            | Self::IntelliCom
            | Self::AquaLink => Some(crate::codec::FrameVariant::Pentair16),
            Self::Standalone => None,
        }
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IntelliCenter => "IntelliCenter",
            Self::IntelliTouch => "IntelliTouch",
            Self::EasyTouch => "EasyTouch",
            Self::SunTouch => "SunTouch",
            Self::IntelliCom => "IntelliCom",
            Self::AquaLink => "AquaLink",
            Self::Standalone => "Standalone",
        };
        f.write_str(s)
    }
}
