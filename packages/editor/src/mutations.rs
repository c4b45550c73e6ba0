//! # Tree Mutations
//!
//! Structural and property edits over a page [`Tree`].
//!
//! ## Design Principles
//!
//! 1. **Pure**: every operation reads a tree and returns a new one; the input
//!    is never touched, so the old value stays valid as a history snapshot
//! 2. **Forgiving**: a missing id or a move past either end is a no-op
//!    ([`Outcome::Skipped`]), never an error
//! 3. **Strict about schema**: writing a slot a kind does not have, reusing
//!    an id, or dropping a node into itself is a hard [`MutationError`]
//!
//! ## Mutation Semantics
//!
//! ### Move
//! - Swaps the node with its neighbour in whichever list holds it
//! - At either end of the list nothing happens
//!
//! ### Relocate
//! - Takes the node (and its subtree, ids kept) out of its list and drops it
//!   at the target position
//! - Fails if the target is the node itself or one of its descendants
//!
//! ### Duplicate
//! - Deep copy inserted right after the original, in the same list
//! - The copy and every node nested in it get fresh ids
//!
//! ### Delete
//! - Removes the node wherever it is, with all descendants
//!
//! ### UpdateContent / UpdateStyle
//! - Shallow merge: only the keys in the patch change

use pagesmith_model::{ModelError, Node, NodeId, NodeKind, Position, Props, Tree};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards index 0
    Up,
    Down,
}

/// Edits the engine knows how to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert a node into the root list at `index` (clamped)
    InsertAtRoot { node: Node, index: usize },

    /// Insert a node into slot `slot` of `parent_id`; appends when `index`
    /// is `None`
    InsertIntoSlot {
        parent_id: NodeId,
        slot: usize,
        node: Node,
        index: Option<usize>,
    },

    /// Swap a node with its previous or next sibling
    Move { node_id: NodeId, direction: Direction },

    /// Move a node and its subtree to another position
    Relocate { node_id: NodeId, to: Position },

    Duplicate { node_id: NodeId },

    Delete { node_id: NodeId },

    UpdateContent { node_id: NodeId, patch: Props },

    UpdateStyle { node_id: NodeId, patch: Props },
}

/// Hard failures: the caller asked for something the schema forbids
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("{kind} has no slot {slot}")]
    SlotMismatch { kind: NodeKind, slot: String },

    #[error("Field '{field}' is a slot and cannot be written as content of {kind}")]
    ReservedField { kind: NodeKind, field: String },

    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("Moving {node} under {target} would create a cycle")]
    CycleDetected { node: NodeId, target: NodeId },

    #[error(transparent)]
    Model(ModelError),
}

impl From<ModelError> for MutationError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::SlotMismatch { kind, slot } => MutationError::SlotMismatch { kind, slot },
            ModelError::ReservedField { kind, field } => {
                MutationError::ReservedField { kind, field }
            }
            ModelError::DuplicateId(id) => MutationError::DuplicateId(id),
            ModelError::CycleDetected { node, target } => {
                MutationError::CycleDetected { node, target }
            }
            other => MutationError::Model(other),
        }
    }
}

/// Why nothing happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOp {
    NodeNotFound,
    ParentNotFound,
    AtBoundary,
    Unchanged,
    NothingToUndo,
    NothingToRedo,
}

impl fmt::Display for NoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoOp::NodeNotFound => "block not found",
            NoOp::ParentNotFound => "target container not found",
            NoOp::AtBoundary => "already at the edge",
            NoOp::Unchanged => "nothing changed",
            NoOp::NothingToUndo => "nothing to undo",
            NoOp::NothingToRedo => "nothing to redo",
        })
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied {
        tree: Tree,
        /// Id of the node an insert or duplicate created
        created: Option<NodeId>,
    },
    Skipped(NoOp),
}

impl Outcome {
    fn applied(tree: Tree) -> Self {
        Outcome::Applied {
            tree,
            created: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    /// The new tree, if anything was applied
    pub fn tree(&self) -> Option<&Tree> {
        match self {
            Outcome::Applied { tree, .. } => Some(tree),
            Outcome::Skipped(_) => None,
        }
    }

    pub fn into_tree(self) -> Option<Tree> {
        match self {
            Outcome::Applied { tree, .. } => Some(tree),
            Outcome::Skipped(_) => None,
        }
    }
}

impl Mutation {
    /// Apply to `tree`, returning the edited copy
    pub fn apply(&self, tree: &Tree) -> Result<Outcome, MutationError> {
        match self {
            Mutation::InsertAtRoot { node, index } => insert_at_root(tree, node.clone(), *index),
            Mutation::InsertIntoSlot {
                parent_id,
                slot,
                node,
                index,
            } => insert_into_slot(tree, parent_id, *slot, node.clone(), *index),
            Mutation::Move { node_id, direction } => move_node(tree, node_id, *direction),
            Mutation::Relocate { node_id, to } => relocate(tree, node_id, to.clone()),
            Mutation::Duplicate { node_id } => duplicate(tree, node_id),
            Mutation::Delete { node_id } => delete_node(tree, node_id),
            Mutation::UpdateContent { node_id, patch } => update_content(tree, node_id, patch),
            Mutation::UpdateStyle { node_id, patch } => update_style(tree, node_id, patch),
        }
    }

    /// The existing node this mutation acts on, if any
    pub fn target(&self) -> Option<&NodeId> {
        match self {
            Mutation::InsertAtRoot { .. } | Mutation::InsertIntoSlot { .. } => None,
            Mutation::Move { node_id, .. }
            | Mutation::Relocate { node_id, .. }
            | Mutation::Duplicate { node_id }
            | Mutation::Delete { node_id }
            | Mutation::UpdateContent { node_id, .. }
            | Mutation::UpdateStyle { node_id, .. } => Some(node_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertAtRoot { .. } => "insert_at_root",
            Mutation::InsertIntoSlot { .. } => "insert_into_slot",
            Mutation::Move { .. } => "move",
            Mutation::Relocate { .. } => "relocate",
            Mutation::Duplicate { .. } => "duplicate",
            Mutation::Delete { .. } => "delete",
            Mutation::UpdateContent { .. } => "update_content",
            Mutation::UpdateStyle { .. } => "update_style",
        }
    }
}

pub fn insert_at_root(tree: &Tree, node: Node, index: usize) -> Result<Outcome, MutationError> {
    let mut next = tree.clone();
    let id = next.attach(node, Position::Root(index))?;
    Ok(Outcome::Applied {
        tree: next,
        created: Some(id),
    })
}

pub fn insert_into_slot(
    tree: &Tree,
    parent_id: &str,
    slot: usize,
    node: Node,
    index: Option<usize>,
) -> Result<Outcome, MutationError> {
    if !tree.contains(parent_id) {
        return Ok(Outcome::Skipped(NoOp::ParentNotFound));
    }

    let mut next = tree.clone();
    let id = next.attach(
        node,
        Position::Slot {
            parent: NodeId::from(parent_id),
            slot,
            index,
        },
    )?;
    Ok(Outcome::Applied {
        tree: next,
        created: Some(id),
    })
}

pub fn move_node(tree: &Tree, node_id: &str, direction: Direction) -> Result<Outcome, MutationError> {
    let (Some(location), Some(siblings)) = (tree.location(node_id), tree.siblings(node_id)) else {
        return Ok(Outcome::Skipped(NoOp::NodeNotFound));
    };

    let neighbour = match direction {
        Direction::Up => location.index.checked_sub(1),
        Direction::Down => Some(location.index + 1).filter(|i| *i < siblings.len()),
    };
    let Some(neighbour) = neighbour.map(|i| siblings[i].clone()) else {
        return Ok(Outcome::Skipped(NoOp::AtBoundary));
    };

    let mut next = tree.clone();
    next.swap(node_id, &neighbour)?;
    Ok(Outcome::applied(next))
}

pub fn relocate(tree: &Tree, node_id: &str, to: Position) -> Result<Outcome, MutationError> {
    if !tree.contains(node_id) {
        return Ok(Outcome::Skipped(NoOp::NodeNotFound));
    }
    if let Position::Slot { parent, .. } = &to {
        if !tree.contains(parent) {
            return Ok(Outcome::Skipped(NoOp::ParentNotFound));
        }
    }

    let mut next = tree.clone();
    next.relocate(node_id, to)?;
    if next == *tree {
        return Ok(Outcome::Skipped(NoOp::Unchanged));
    }
    Ok(Outcome::applied(next))
}

pub fn duplicate(tree: &Tree, node_id: &str) -> Result<Outcome, MutationError> {
    let (Some(location), Some(original)) = (tree.location(node_id), tree.materialize(node_id)) else {
        return Ok(Outcome::Skipped(NoOp::NodeNotFound));
    };

    let copy = original.with_fresh_ids();
    let index = location.index + 1;
    let position = match location.parent {
        None => Position::Root(index),
        Some(parent) => Position::Slot {
            parent,
            slot: location.slot,
            index: Some(index),
        },
    };

    let mut next = tree.clone();
    let id = next.attach(copy, position)?;
    Ok(Outcome::Applied {
        tree: next,
        created: Some(id),
    })
}

pub fn delete_node(tree: &Tree, node_id: &str) -> Result<Outcome, MutationError> {
    let mut next = tree.clone();
    match next.detach(node_id) {
        Some(_) => Ok(Outcome::applied(next)),
        None => Ok(Outcome::Skipped(NoOp::NodeNotFound)),
    }
}

pub fn update_content(tree: &Tree, node_id: &str, patch: &Props) -> Result<Outcome, MutationError> {
    if !tree.contains(node_id) {
        return Ok(Outcome::Skipped(NoOp::NodeNotFound));
    }

    let mut next = tree.clone();
    if next.merge_content(node_id, patch)? {
        Ok(Outcome::applied(next))
    } else {
        Ok(Outcome::Skipped(NoOp::Unchanged))
    }
}

pub fn update_style(tree: &Tree, node_id: &str, patch: &Props) -> Result<Outcome, MutationError> {
    if !tree.contains(node_id) {
        return Ok(Outcome::Skipped(NoOp::NodeNotFound));
    }

    let mut next = tree.clone();
    if next.merge_style(node_id, patch)? {
        Ok(Outcome::applied(next))
    } else {
        Ok(Outcome::Skipped(NoOp::Unchanged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree_with(kinds: &[NodeKind]) -> (Tree, Vec<NodeId>) {
        let mut tree = Tree::new();
        let ids = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| tree.attach(Node::create(*kind), Position::Root(i)).unwrap())
            .collect();
        (tree, ids)
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::UpdateContent {
            node_id: NodeId::from("hero-1"),
            patch: Props::new().with("title", "Hello World"),
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let (tree, ids) = tree_with(&[NodeKind::Hero, NodeKind::Button]);
        let before = tree.clone();

        let outcome = delete_node(&tree, &ids[0]).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(tree, before);
        assert_eq!(outcome.tree().unwrap().root(), &ids[1..]);
    }

    #[test]
    fn test_move_swaps_and_stops_at_edges() {
        let (tree, ids) = tree_with(&[NodeKind::Hero, NodeKind::Paragraph, NodeKind::Footer]);

        let moved = move_node(&tree, &ids[0], Direction::Down).unwrap().into_tree().unwrap();
        assert_eq!(moved.root(), &[ids[1].clone(), ids[0].clone(), ids[2].clone()]);

        assert_eq!(
            move_node(&tree, &ids[0], Direction::Up).unwrap(),
            Outcome::Skipped(NoOp::AtBoundary)
        );
        assert_eq!(
            move_node(&tree, &ids[2], Direction::Down).unwrap(),
            Outcome::Skipped(NoOp::AtBoundary)
        );
    }

    #[test]
    fn test_missing_ids_are_no_ops() {
        let (tree, _) = tree_with(&[NodeKind::Hero]);
        let patch = Props::new().with("title", "x");

        assert_eq!(delete_node(&tree, "nope").unwrap(), Outcome::Skipped(NoOp::NodeNotFound));
        assert_eq!(duplicate(&tree, "nope").unwrap(), Outcome::Skipped(NoOp::NodeNotFound));
        assert_eq!(move_node(&tree, "nope", Direction::Up).unwrap(), Outcome::Skipped(NoOp::NodeNotFound));
        assert_eq!(update_content(&tree, "nope", &patch).unwrap(), Outcome::Skipped(NoOp::NodeNotFound));
        assert_eq!(update_style(&tree, "nope", &patch).unwrap(), Outcome::Skipped(NoOp::NodeNotFound));
        assert_eq!(
            insert_into_slot(&tree, "nope", 0, Node::create(NodeKind::Button), None).unwrap(),
            Outcome::Skipped(NoOp::ParentNotFound)
        );
    }

    #[test]
    fn test_incompatible_slot_is_rejected() {
        let (tree, ids) = tree_with(&[NodeKind::GridThreeCols, NodeKind::Hero]);

        let err = insert_into_slot(&tree, &ids[0], 3, Node::create(NodeKind::Button), None);
        assert!(matches!(err, Err(MutationError::SlotMismatch { kind: NodeKind::GridThreeCols, .. })));

        let err = insert_into_slot(&tree, &ids[1], 0, Node::create(NodeKind::Button), None);
        assert!(matches!(err, Err(MutationError::SlotMismatch { kind: NodeKind::Hero, .. })));
    }

    #[test]
    fn test_update_content_merges_shallowly() {
        let (tree, ids) = tree_with(&[NodeKind::Hero]);
        let subtitle = tree.content(&ids[0]).unwrap().get("subtitle").cloned();

        let next = update_content(&tree, &ids[0], &Props::new().with("title", "New"))
            .unwrap()
            .into_tree()
            .unwrap();
        let content = next.content(&ids[0]).unwrap();
        assert_eq!(content.get_str("title"), Some("New"));
        assert_eq!(content.get("subtitle").cloned(), subtitle);
    }

    #[test]
    fn test_update_content_rejects_slot_keys() {
        let (tree, ids) = tree_with(&[NodeKind::GridThreeCols]);
        let patch = Props::new().with("leftChildren", json!([]));
        assert!(matches!(
            update_content(&tree, &ids[0], &patch),
            Err(MutationError::ReservedField { .. })
        ));
    }

    #[test]
    fn test_update_with_same_values_is_unchanged() {
        let (tree, ids) = tree_with(&[NodeKind::Button]);
        let patch = Props::new().with("buttonText", "Click here");
        assert_eq!(update_content(&tree, &ids[0], &patch).unwrap(), Outcome::Skipped(NoOp::Unchanged));
    }

    #[test]
    fn test_duplicate_nested_node_stays_in_its_slot() {
        let (tree, ids) = tree_with(&[NodeKind::GridTwoCols]);
        let button = insert_into_slot(&tree, &ids[0], 1, Node::create(NodeKind::Button), None).unwrap();
        let Outcome::Applied { tree, created: Some(button) } = button else {
            panic!("insert was skipped");
        };

        let Outcome::Applied { tree, created: Some(copy) } = duplicate(&tree, &button).unwrap() else {
            panic!("duplicate was skipped");
        };
        assert_eq!(tree.slot(&ids[0], 1).unwrap(), &[button.clone(), copy.clone()]);
        assert_eq!(tree.content(&button), tree.content(&copy));
        assert_ne!(button, copy);
    }

    #[test]
    fn test_relocate_between_slots() {
        let (tree, ids) = tree_with(&[NodeKind::Container, NodeKind::Image]);
        let next = relocate(
            &tree,
            &ids[1],
            Position::Slot { parent: ids[0].clone(), slot: 0, index: None },
        )
        .unwrap()
        .into_tree()
        .unwrap();

        assert_eq!(next.root(), &ids[..1]);
        assert_eq!(next.slot(&ids[0], 0).unwrap(), &ids[1..]);

        assert!(matches!(
            relocate(&next, &ids[0], Position::Slot { parent: ids[0].clone(), slot: 0, index: None }),
            Err(MutationError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_relocate_to_current_place_is_unchanged() {
        let (tree, ids) = tree_with(&[NodeKind::Hero, NodeKind::Image]);
        assert_eq!(
            relocate(&tree, &ids[1], Position::Root(1)).unwrap(),
            Outcome::Skipped(NoOp::Unchanged)
        );
    }
}
