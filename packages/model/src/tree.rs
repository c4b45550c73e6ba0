//! # Arena tree
//!
//! The page is an ordered root list of top-level nodes. Internally every node
//! lives in one flat map keyed by id, and every slot is an ordered list of
//! child ids. Each entry also remembers its parent and slot, so locating a
//! node never walks the tree.
//!
//! ```text
//!   root: [hero-1, grid3-2]
//!   nodes:
//!     hero-1   Hero          parent: -
//!     grid3-2  GridThreeCols parent: -        slots: [[], [], [button-3]]
//!     button-3 Button        parent: grid3-2/2
//! ```
//!
//! `Tree` is a plain value: cloning it is the snapshot used by history, and
//! `==` compares the whole page (root order, every slot, every field).

use crate::node::check_content_fields;
use crate::{ModelError, Node, NodeId, NodeKind, Props};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    kind: NodeKind,
    content: Props,
    style: Props,
    slots: Vec<Vec<NodeId>>,
    parent: Option<(NodeId, usize)>,
}

/// Where a node should go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    /// Index in the root list, clamped to `[0, len]`
    Root(usize),

    /// Slot `slot` of `parent`; `None` appends, `Some(i)` is clamped
    Slot {
        parent: NodeId,
        slot: usize,
        index: Option<usize>,
    },
}

/// Where a node currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// `None` for root-level nodes
    pub parent: Option<NodeId>,
    pub slot: usize,
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    root: Vec<NodeId>,
    nodes: HashMap<NodeId, Entry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from top-level nodes, rejecting duplicate ids anywhere
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, ModelError> {
        let mut tree = Tree::new();
        for node in nodes {
            let index = tree.root.len();
            tree.attach(node, Position::Root(index))?;
        }
        tree.check_invariants()?;
        Ok(tree)
    }

    /// Top-level ids in page order
    pub fn root(&self) -> &[NodeId] {
        &self.root
    }

    /// Whether the page has no top-level nodes
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of nodes at every depth
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn kind(&self, id: &str) -> Option<NodeKind> {
        self.nodes.get(id).map(|e| e.kind)
    }

    pub fn content(&self, id: &str) -> Option<&Props> {
        self.nodes.get(id).map(|e| &e.content)
    }

    pub fn style(&self, id: &str) -> Option<&Props> {
        self.nodes.get(id).map(|e| &e.style)
    }

    /// Ordered ids in slot `slot` of `parent`
    pub fn slot(&self, parent: &str, slot: usize) -> Option<&[NodeId]> {
        self.nodes
            .get(parent)
            .and_then(|e| e.slots.get(slot))
            .map(Vec::as_slice)
    }

    pub fn location(&self, id: &str) -> Option<Location> {
        let entry = self.nodes.get(id)?;
        let (parent, slot) = match &entry.parent {
            Some((parent, slot)) => (Some(parent.clone()), *slot),
            None => (None, 0),
        };
        let index = self.list(parent.as_ref(), slot)?.iter().position(|x| x == id)?;
        Some(Location {
            parent,
            slot,
            index,
        })
    }

    /// The list that holds `id`, itself included
    pub fn siblings(&self, id: &str) -> Option<&[NodeId]> {
        let entry = self.nodes.get(id)?;
        match &entry.parent {
            Some((parent, slot)) => self.list(Some(parent), *slot),
            None => Some(&self.root),
        }
    }

    /// Whether `ancestor` strictly contains `id`
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.nodes.get(id).and_then(|e| e.parent.as_ref());
        while let Some((parent, _)) = current {
            if parent.as_str() == ancestor {
                return true;
            }
            current = self.nodes.get(parent.as_str()).and_then(|e| e.parent.as_ref());
        }
        false
    }

    /// Ids of every node nested under `id`, depth-first, excluding `id`
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<&NodeId> = match self.nodes.get(id) {
            Some(entry) => entry.slots.iter().flatten().rev().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next.clone());
            if let Some(entry) = self.nodes.get(next.as_str()) {
                stack.extend(entry.slots.iter().flatten().rev());
            }
        }
        out
    }

    /// Insert `node` and its whole subtree at `position`.
    ///
    /// Fails without touching the tree if any id in the subtree already
    /// exists, the parent is missing, or the parent has no such slot.
    pub fn attach(&mut self, node: Node, position: Position) -> Result<NodeId, ModelError> {
        let mut seen = HashSet::new();
        for id in node.ids() {
            if self.nodes.contains_key(id.as_str()) || !seen.insert(id) {
                return Err(ModelError::DuplicateId(id.clone()));
            }
        }

        let (parent, slot, index) = match position {
            Position::Root(index) => (None, 0, Some(index)),
            Position::Slot {
                parent,
                slot,
                index,
            } => {
                let entry = self
                    .nodes
                    .get(parent.as_str())
                    .ok_or_else(|| ModelError::NodeNotFound(parent.clone()))?;
                if slot >= entry.slots.len() {
                    return Err(ModelError::SlotMismatch {
                        kind: entry.kind,
                        slot: entry.kind.slots().label(slot),
                    });
                }
                (Some(parent), slot, index)
            }
        };

        let id = node.id().clone();
        let list = self.list_mut(parent.as_ref(), slot)?;
        let at = index.map_or(list.len(), |i| i.min(list.len()));
        list.insert(at, id.clone());

        self.flatten(node, parent.map(|p| (p, slot)));
        Ok(id)
    }

    /// Remove `id` and its subtree, returning it in nested form
    pub fn detach(&mut self, id: &str) -> Option<Node> {
        let entry = self.nodes.get(id)?;
        let (parent, slot) = match &entry.parent {
            Some((parent, slot)) => (Some(parent.clone()), *slot),
            None => (None, 0),
        };
        let list = self.list_mut(parent.as_ref(), slot).ok()?;
        list.retain(|x| x != id);
        self.take(id)
    }

    /// Move an existing subtree to `position`, keeping its ids.
    ///
    /// `position`'s index is read against the target list after the node has
    /// been taken out of its current place.
    pub fn relocate(&mut self, id: &str, position: Position) -> Result<(), ModelError> {
        if !self.contains(id) {
            return Err(ModelError::NodeNotFound(NodeId::from(id)));
        }
        if let Position::Slot { parent, slot, .. } = &position {
            let entry = self
                .nodes
                .get(parent.as_str())
                .ok_or_else(|| ModelError::NodeNotFound(parent.clone()))?;
            if parent.as_str() == id || self.is_ancestor(id, parent) {
                return Err(ModelError::CycleDetected {
                    node: NodeId::from(id),
                    target: parent.clone(),
                });
            }
            if *slot >= entry.slots.len() {
                return Err(ModelError::SlotMismatch {
                    kind: entry.kind,
                    slot: entry.kind.slots().label(*slot),
                });
            }
        }

        let node = self
            .detach(id)
            .ok_or_else(|| ModelError::NodeNotFound(NodeId::from(id)))?;
        self.attach(node, position)?;
        Ok(())
    }

    /// Swap two nodes that share a list
    pub fn swap(&mut self, a: &str, b: &str) -> Result<(), ModelError> {
        let (la, lb) = match (self.location(a), self.location(b)) {
            (Some(la), Some(lb)) => (la, lb),
            (None, _) => return Err(ModelError::NodeNotFound(NodeId::from(a))),
            (_, None) => return Err(ModelError::NodeNotFound(NodeId::from(b))),
        };
        if la.parent != lb.parent || la.slot != lb.slot {
            return Err(ModelError::Corrupt(format!("{} and {} are not siblings", a, b)));
        }
        self.list_mut(la.parent.as_ref(), la.slot)?
            .swap(la.index, lb.index);
        Ok(())
    }

    /// Shallow-merge `patch` into the content of `id`. Slot keys are rejected.
    pub fn merge_content(&mut self, id: &str, patch: &Props) -> Result<bool, ModelError> {
        let entry = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ModelError::NodeNotFound(NodeId::from(id)))?;
        check_content_fields(entry.kind, patch)?;
        Ok(entry.content.merge(patch))
    }

    /// Shallow-merge `patch` into the style of `id`
    pub fn merge_style(&mut self, id: &str, patch: &Props) -> Result<bool, ModelError> {
        let entry = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ModelError::NodeNotFound(NodeId::from(id)))?;
        Ok(entry.style.merge(patch))
    }

    /// Nested copy of the subtree rooted at `id`
    pub fn materialize(&self, id: &str) -> Option<Node> {
        let entry = self.nodes.get(id)?;
        let slots = entry
            .slots
            .iter()
            .map(|list| list.iter().filter_map(|child| self.materialize(child)).collect())
            .collect();
        Some(Node::assemble(
            NodeId::from(id),
            entry.kind,
            entry.content.clone(),
            entry.style.clone(),
            slots,
        ))
    }

    /// The whole page in nested form
    pub fn to_nodes(&self) -> Vec<Node> {
        self.root.iter().filter_map(|id| self.materialize(id)).collect()
    }

    /// Verify parent links, slot arity, reachability, acyclicity and that
    /// no content record carries a slot key.
    pub fn check_invariants(&self) -> Result<(), ModelError> {
        let mut reached: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&NodeId, Option<(&NodeId, usize)>)> =
            self.root.iter().rev().map(|id| (id, None)).collect();

        while let Some((id, expected_parent)) = stack.pop() {
            if !reached.insert(id.as_str()) {
                return Err(ModelError::Corrupt(format!("{} is reachable twice", id)));
            }
            let entry = self
                .nodes
                .get(id.as_str())
                .ok_or_else(|| ModelError::NodeNotFound(id.clone()))?;

            let actual_parent = entry.parent.as_ref().map(|(p, s)| (p, *s));
            if actual_parent != expected_parent {
                return Err(ModelError::Corrupt(format!("{} has a stale parent link", id)));
            }
            if entry.slots.len() != entry.kind.slots().slot_count() {
                return Err(ModelError::InvalidSlot {
                    kind: entry.kind,
                    key: entry.kind.slots().label(entry.slots.len()),
                    reason: format!("holds {} slot lists", entry.slots.len()),
                });
            }
            check_content_fields(entry.kind, &entry.content)?;

            for (slot, list) in entry.slots.iter().enumerate().rev() {
                for child in list.iter().rev() {
                    if child == id || self.is_ancestor(child, id) {
                        return Err(ModelError::CycleDetected {
                            node: child.clone(),
                            target: id.clone(),
                        });
                    }
                    stack.push((child, Some((id, slot))));
                }
            }
        }

        if reached.len() != self.nodes.len() {
            return Err(ModelError::Corrupt(format!(
                "{} nodes are not reachable from the root",
                self.nodes.len() - reached.len()
            )));
        }
        Ok(())
    }

    fn list(&self, parent: Option<&NodeId>, slot: usize) -> Option<&[NodeId]> {
        match parent {
            None => Some(&self.root),
            Some(parent) => self.slot(parent, slot),
        }
    }

    fn list_mut(&mut self, parent: Option<&NodeId>, slot: usize) -> Result<&mut Vec<NodeId>, ModelError> {
        match parent {
            None => Ok(&mut self.root),
            Some(parent) => {
                let entry = self
                    .nodes
                    .get_mut(parent.as_str())
                    .ok_or_else(|| ModelError::NodeNotFound(parent.clone()))?;
                let kind = entry.kind;
                entry.slots.get_mut(slot).ok_or_else(|| ModelError::SlotMismatch {
                    kind,
                    slot: kind.slots().label(slot),
                })
            }
        }
    }

    fn flatten(&mut self, node: Node, parent: Option<(NodeId, usize)>) {
        let (id, kind, content, style, slots) = node.into_parts();
        let mut ids = Vec::with_capacity(slots.len());
        for (slot, list) in slots.into_iter().enumerate() {
            let mut slot_ids = Vec::with_capacity(list.len());
            for child in list {
                slot_ids.push(child.id().clone());
                self.flatten(child, Some((id.clone(), slot)));
            }
            ids.push(slot_ids);
        }
        self.nodes.insert(
            id,
            Entry {
                kind,
                content,
                style,
                slots: ids,
                parent,
            },
        );
    }

    fn take(&mut self, id: &str) -> Option<Node> {
        let entry = self.nodes.remove(id)?;
        let slots = entry
            .slots
            .iter()
            .map(|list| list.iter().filter_map(|child| self.take(child)).collect())
            .collect();
        Some(Node::assemble(
            NodeId::from(id),
            entry.kind,
            entry.content,
            entry.style,
            slots,
        ))
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_nodes())
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nodes = Vec::<Node>::deserialize(deserializer)?;
        Tree::from_nodes(nodes).map_err(serde::de::Error::custom)
    }
}
