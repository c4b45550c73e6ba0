//! Error types for the document model

use crate::{NodeId, NodeKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown node kind: {0}")]
    UnknownKind(String),

    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("{kind} has no slot {slot}")]
    SlotMismatch { kind: NodeKind, slot: String },

    #[error("Field '{field}' is a slot and cannot be written as content of {kind}")]
    ReservedField { kind: NodeKind, field: String },

    #[error("Invalid slot '{key}' on {kind}: {reason}")]
    InvalidSlot {
        kind: NodeKind,
        key: String,
        reason: String,
    },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Moving {node} under {target} would create a cycle")]
    CycleDetected { node: NodeId, target: NodeId },

    #[error("Corrupt tree: {0}")]
    Corrupt(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
