//! # Placement
//!
//! Turns a user drop intent into exactly one engine [`Mutation`].
//!
//! Drop targets come in three flavours. All of them end up as a
//! `(parent, slot index)` pair, so the engine never sees slot names:
//!
//! ```text
//! RootIndex(i)            → root list, index i
//! ContainerSlot(p)        → p.children            (Container, Flexbox)
//! GridSlot(p, 0 | 1)      → p.leftChildren / p.rightChildren   (GridTwoCols)
//! GridSlot(p, 0 | 1 | 2)  → p.columns[i]          (GridThreeCols)
//! ```
//!
//! A parent that does not exist is left for the engine to report as a
//! no-op. A parent of the wrong kind, or a grid index it does not have, is a
//! [`MutationError::SlotMismatch`].

use crate::mutations::{Mutation, MutationError, Outcome};
use pagesmith_model::{Node, NodeId, NodeKind, Position, SlotName, Tree};
use serde::{Deserialize, Serialize};

/// Where the user dropped something
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropTarget {
    RootIndex(usize),
    ContainerSlot(NodeId),
    GridSlot(NodeId, usize),
}

/// Stateless mapping from drop targets to engine calls
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementResolver;

impl PlacementResolver {
    pub fn new() -> Self {
        Self
    }

    /// Normalize `target` into a tree position
    pub fn position(&self, tree: &Tree, target: &DropTarget) -> Result<Position, MutationError> {
        match target {
            DropTarget::RootIndex(index) => Ok(Position::Root(*index)),
            DropTarget::ContainerSlot(parent) => {
                let slot = match tree.kind(parent) {
                    Some(kind) => SlotName::Children.resolve(kind)?,
                    None => 0,
                };
                Ok(Position::Slot {
                    parent: parent.clone(),
                    slot,
                    index: None,
                })
            }
            DropTarget::GridSlot(parent, index) => {
                let slot = match tree.kind(parent) {
                    Some(kind) => grid_slot(kind, *index).resolve(kind)?,
                    None => *index,
                };
                Ok(Position::Slot {
                    parent: parent.clone(),
                    slot,
                    index: None,
                })
            }
        }
    }

    /// Mutation inserting a fresh node of palette kind `kind` at `target`
    pub fn insert(&self, tree: &Tree, kind: &str, target: &DropTarget) -> Result<Mutation, MutationError> {
        let node = Node::from_palette(kind);
        Ok(match self.position(tree, target)? {
            Position::Root(index) => Mutation::InsertAtRoot { node, index },
            Position::Slot {
                parent,
                slot,
                index,
            } => Mutation::InsertIntoSlot {
                parent_id: parent,
                slot,
                node,
                index,
            },
        })
    }

    /// Mutation moving the existing `node_id` to `target`
    pub fn relocate(&self, tree: &Tree, node_id: &NodeId, target: &DropTarget) -> Result<Mutation, MutationError> {
        Ok(Mutation::Relocate {
            node_id: node_id.clone(),
            to: self.position(tree, target)?,
        })
    }

    /// Resolve and apply an insert in one step
    pub fn place(&self, tree: &Tree, kind: &str, target: &DropTarget) -> Result<Outcome, MutationError> {
        self.insert(tree, kind, target)?.apply(tree)
    }
}

/// Name of grid column `index` on `kind`; non-grid kinds get a name they
/// cannot resolve
fn grid_slot(kind: NodeKind, index: usize) -> SlotName {
    match (kind, index) {
        (NodeKind::GridTwoCols, 0) => SlotName::Left,
        (NodeKind::GridTwoCols, 1) => SlotName::Right,
        _ => SlotName::Column(index),
    }
}
