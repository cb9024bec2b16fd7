//! Unified error types for the pool bridge core.
//!
//! Follows the same shape as the rest of the core: a single [`PoolError`]
//! enum that every subsystem funnels into, keeping intent handlers and the
//! daemon's top-level error handling uniform. Component-local error enums
//! (`PortError`, `CodecError`, ...) carry the detail their layer needs and
//! convert into `PoolError` via `#[from]`.

use std::path::PathBuf;

use crate::controller_type::ControllerType;
use crate::model::EntityKind;

/// Every fallible operation in the core funnels into this type.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("{kind} {id} not found")]
    EquipmentNotFound { kind: EntityKind, id: u32 },

    #[error("{kind} {id} field `{field}`: {reason}")]
    InvalidEquipmentData {
        kind: EntityKind,
        id: u32,
        field: &'static str,
        reason: String,
    },

    #[error("{intent} is not supported on {controller_type}")]
    InvalidOperation {
        controller_type: ControllerType,
        intent: &'static str,
    },

    #[error("interlock `{conflicting_key}` is active")]
    InterlockViolation { conflicting_key: String },

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Protocol(#[from] CodecError),

    #[error("port {port_id}: no response to {descriptor}")]
    NoResponse { port_id: u8, descriptor: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("persisting {path}: {cause}")]
    Persistence { path: PathBuf, cause: String },

    #[error("configuration file corrupt: {0}")]
    ConfigurationCorrupt(PathBuf),

    #[error("internal invariant broken: {0}")]
    Internal(String),
}

/// Transport-layer errors (§4.1 / §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortError {
    #[error("port {port_id} unavailable: {cause}")]
    Unavailable { port_id: u8, cause: String },

    #[error("port {port_id} closed")]
    Closed { port_id: u8 },

    #[error("port {port_id} rejected write: backpressure bound exceeded")]
    WriteRejected { port_id: u8 },
}

impl From<PortError> for PoolError {
    fn from(e: PortError) -> Self {
        Self::Port(e)
    }
}

/// Frame-codec errors (§4.2 / §7). `detail` is free text suitable for logs;
/// it is never derived from wire content that could be attacker-controlled
/// in a way that matters here since this bus has no hostile peers in scope.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    #[error("port {port_id}: checksum mismatch, resynchronizing")]
    ChecksumMismatch { port_id: u8 },

    #[error("port {port_id}: frame aborted after {waited_ms}ms without completion: {detail}")]
    FramingTimeout {
        port_id: u8,
        waited_ms: u64,
        detail: String,
    },

    #[error("port {port_id}: {detail}")]
    Malformed { port_id: u8, detail: String },
}

impl From<CodecError> for PoolError {
    fn from(e: CodecError) -> Self {
        Self::Protocol(e)
    }
}

/// Transaction-engine errors that don't already have a `PoolError` variant
/// of their own (retry exhaustion surfaces as `PoolError::NoResponse`
/// directly, constructed by the engine).
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransactionError {
    #[error("transaction queue for port {port_id} is full")]
    QueueFull { port_id: u8 },

    #[error("transaction cancelled while {state}")]
    Cancelled { state: &'static str },
}

/// Delay-manager errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DelayError {
    #[error("interlock `{conflicting_key}` is active")]
    InterlockActive { conflicting_key: String },

    #[error("cooldown active for {kind} {id} ({purpose}), {remaining_ms}ms remaining")]
    CooldownActive {
        kind: EntityKind,
        id: u32,
        purpose: &'static str,
        remaining_ms: u64,
    },
}

impl From<DelayError> for PoolError {
    fn from(e: DelayError) -> Self {
        match e {
            DelayError::InterlockActive { conflicting_key } => {
                Self::InterlockViolation { conflicting_key }
            }
            DelayError::CooldownActive { .. } => Self::InterlockViolation {
                conflicting_key: e.to_string(),
            },
        }
    }
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, PoolError>;
