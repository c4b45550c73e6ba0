//! # Nodes
//!
//! `Node` is the nested, by-value form of a block: what the factory creates,
//! what gets inserted, and what is persisted. Inside a [`crate::Tree`] nodes
//! live flattened in an arena; `Node` is only the exchange format.
//!
//! ## JSON shape
//!
//! ```text
//! { "id": "grid2-…", "type": "GridTwoCols",
//!   "content": { "gap": "6", "leftChildren": [...], "rightChildren": [...] },
//!   "style": { "padding": "6" } }
//! ```
//!
//! Slot lists are written inside `content` under the keys of the kind's
//! [`SlotLayout`]. Reading is strict: a slot key the kind does not own, or a
//! `columns` array of the wrong length, is a schema violation.

use crate::kind::SLOT_KEYS;
use crate::{ModelError, NodeId, NodeKind, Props, SlotLayout};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

/// A block and, for containers, everything nested inside it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    content: Props,
    style: Props,
    /// One list per slot of `kind`; always `kind.slots().slot_count()` long
    slots: Vec<Vec<Node>>,
}

impl Node {
    /// Create a node of `kind` with a fresh id and the default content and
    /// style for that kind.
    pub fn create(kind: NodeKind) -> Self {
        let (content, style) = defaults(kind);
        Self {
            id: NodeId::generate(kind),
            kind,
            content,
            style,
            slots: vec![Vec::new(); kind.slots().slot_count()],
        }
    }

    /// Create from a palette/drag-source kind string.
    ///
    /// Unrecognized names produce a fallback leaf that names the requested
    /// kind instead of failing.
    pub fn from_palette(name: &str) -> Self {
        match NodeKind::from_palette(name) {
            Some(kind) => Self::create(kind),
            None => {
                tracing::warn!(kind = name, "creating fallback block for unknown kind");
                let mut node = Self::create(NodeKind::FALLBACK);
                node.content = Props::new()
                    .with("title", "Unknown block")
                    .with("subtitle", format!("Unrecognized component: {}", name));
                node
            }
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn content(&self) -> &Props {
        &self.content
    }

    pub fn style(&self) -> &Props {
        &self.style
    }

    /// Set one content field. Slot keys are rejected.
    pub fn set_content(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        check_content_field(self.kind, key)?;
        self.content.insert(key, value);
        Ok(())
    }

    /// Append `child` to slot `slot`
    pub fn push_child(&mut self, slot: usize, child: Node) -> Result<(), ModelError> {
        let kind = self.kind;
        let list = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| ModelError::SlotMismatch {
                kind,
                slot: kind.slots().label(slot),
            })?;
        list.push(child);
        Ok(())
    }

    /// Builder-style [`Node::push_child`]
    pub fn with_child(mut self, slot: usize, child: Node) -> Result<Self, ModelError> {
        self.push_child(slot, child)?;
        Ok(self)
    }

    /// All slot lists, in slot index order
    pub fn slots(&self) -> &[Vec<Node>] {
        &self.slots
    }

    pub fn slot(&self, slot: usize) -> Option<&[Node]> {
        self.slots.get(slot).map(Vec::as_slice)
    }

    /// `children` of a Container/Flexbox
    pub fn children(&self) -> Option<&[Node]> {
        match self.kind {
            NodeKind::Container | NodeKind::Flexbox => self.slot(0),
            _ => None,
        }
    }

    /// `leftChildren` of a GridTwoCols
    pub fn left_children(&self) -> Option<&[Node]> {
        match self.kind {
            NodeKind::GridTwoCols => self.slot(0),
            _ => None,
        }
    }

    /// `rightChildren` of a GridTwoCols
    pub fn right_children(&self) -> Option<&[Node]> {
        match self.kind {
            NodeKind::GridTwoCols => self.slot(1),
            _ => None,
        }
    }

    /// `columns[index]` of a GridThreeCols
    pub fn column(&self, index: usize) -> Option<&[Node]> {
        match self.kind {
            NodeKind::GridThreeCols => self.slot(index),
            _ => None,
        }
    }

    /// Deep copy in which this node and every descendant get a fresh id
    pub fn with_fresh_ids(&self) -> Node {
        Node {
            id: NodeId::generate(self.kind),
            kind: self.kind,
            content: self.content.clone(),
            style: self.style.clone(),
            slots: self
                .slots
                .iter()
                .map(|list| list.iter().map(Node::with_fresh_ids).collect())
                .collect(),
        }
    }

    /// Ids of this node and all descendants, depth-first
    pub fn ids(&self) -> Vec<&NodeId> {
        let mut out = Vec::new();
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids<'a>(&'a self, out: &mut Vec<&'a NodeId>) {
        out.push(&self.id);
        for child in self.slots.iter().flatten() {
            child.collect_ids(out);
        }
    }

    pub(crate) fn assemble(
        id: NodeId,
        kind: NodeKind,
        content: Props,
        style: Props,
        slots: Vec<Vec<Node>>,
    ) -> Self {
        Self {
            id,
            kind,
            content,
            style,
            slots,
        }
    }

    pub(crate) fn into_parts(self) -> (NodeId, NodeKind, Props, Props, Vec<Vec<Node>>) {
        (self.id, self.kind, self.content, self.style, self.slots)
    }
}

/// Reject content patches that would write a slot key
pub fn check_content_fields(kind: NodeKind, content: &Props) -> Result<(), ModelError> {
    content.keys().try_for_each(|key| check_content_field(kind, key))
}

fn check_content_field(kind: NodeKind, key: &str) -> Result<(), ModelError> {
    if SLOT_KEYS.contains(&key) {
        return Err(ModelError::ReservedField {
            kind,
            field: key.to_string(),
        });
    }
    Ok(())
}

fn props(value: Value) -> Props {
    match value {
        Value::Object(map) => Props::from(map),
        _ => Props::new(),
    }
}

/// Default content and style per kind
fn defaults(kind: NodeKind) -> (Props, Props) {
    let (content, style) = match kind {
        NodeKind::Hero => (
            json!({
                "badge": "NEW",
                "title": "Stay connected with friends and family",
                "subtitle": "Keep in touch with the people you love, wherever you are.",
                "buttonText": "Get the app"
            }),
            json!({ "backgroundColor": "builder-light-blue", "padding": "12", "textAlign": "center" }),
        ),
        NodeKind::Paragraph => (
            json!({
                "title": "Paragraph title",
                "subtitle": "Write your text here."
            }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "left" }),
        ),
        NodeKind::Button => (
            json!({ "buttonText": "Click here", "url": "#" }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "center" }),
        ),
        NodeKind::Image => (
            json!({ "imageUrl": "", "alt": "Image", "caption": "" }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "center" }),
        ),
        NodeKind::Testimonial => (
            json!({
                "quote": "This product changed the way our team works.",
                "author": "Jane Doe",
                "role": "Product Manager",
                "avatarUrl": ""
            }),
            json!({ "backgroundColor": "builder-light-blue", "padding": "8", "textAlign": "center" }),
        ),
        NodeKind::Navbar => (
            json!({
                "title": "My Brand",
                "subtitle": "Home,Features,Pricing,Contact",
                "buttonText": "Sign in"
            }),
            json!({ "backgroundColor": "white", "padding": "4" }),
        ),
        NodeKind::Footer => (
            json!({
                "title": "My Brand",
                "subtitle": "© All rights reserved",
                "buttonText": "Privacy,Terms,Contact"
            }),
            json!({ "backgroundColor": "gray-100", "padding": "8", "textAlign": "center" }),
        ),
        NodeKind::Features => (
            json!({
                "title": "Features",
                "subtitle": "Everything you need to get started.",
                "features": [
                    { "title": "Easy to use", "description": "Designed to be simple from day one." },
                    { "title": "Fast and reliable", "description": "Tuned for the best possible experience." },
                    { "title": "Secure", "description": "Your data is protected." }
                ]
            }),
            json!({ "backgroundColor": "white", "padding": "12", "textAlign": "center" }),
        ),
        NodeKind::Pricing => (
            json!({
                "title": "Our Plans",
                "subtitle": "Choose the plan that fits your needs.",
                "plans": [
                    { "title": "Basic", "price": "9€", "description": "For beginners",
                      "features": ["Core modules", "Email support"], "buttonText": "Start" },
                    { "title": "Pro", "price": "19€", "description": "For professionals",
                      "features": ["Everything in Basic", "Unlimited API", "Priority support"],
                      "isPopular": true, "buttonText": "Free trial" },
                    { "title": "Enterprise", "price": "49€", "description": "For large teams",
                      "features": ["Everything in Pro", "On-premise", "Dedicated support"],
                      "buttonText": "Contact sales" }
                ]
            }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "center" }),
        ),
        NodeKind::Faq => (
            json!({
                "title": "Frequently asked questions",
                "subtitle": "",
                "faqs": [
                    { "question": "How do I sign up?", "answer": "Click 'Sign up' at the top right of the home page." },
                    { "question": "Can I cancel at any time?", "answer": "Yes, from your dashboard." }
                ]
            }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "left" }),
        ),
        NodeKind::Cta => (
            json!({
                "title": "Ready to get started?",
                "subtitle": "Join thousands of happy customers today.",
                "buttonText": "Get started",
                "buttonUrl": "#",
                "secondaryButtonText": "Learn more",
                "secondaryButtonUrl": "#"
            }),
            json!({ "backgroundColor": "blue-500", "padding": "12", "textAlign": "center", "layout": "center" }),
        ),
        NodeKind::Container => (
            json!({ "title": "", "subtitle": "" }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "left", "maxWidth": "full" }),
        ),
        NodeKind::Flexbox => (
            json!({
                "title": "",
                "subtitle": "",
                "direction": "row",
                "wrap": false,
                "justifyContent": "start",
                "alignItems": "start",
                "gap": "4"
            }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "left" }),
        ),
        NodeKind::GridTwoCols | NodeKind::GridThreeCols => (
            json!({ "title": "", "subtitle": "", "gap": "6" }),
            json!({ "backgroundColor": "white", "padding": "6", "textAlign": "left" }),
        ),
    };

    (props(content), props(style))
}

/// Wire form of a node before slot extraction
#[derive(Deserialize)]
struct RawNode {
    id: NodeId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Map<String, Value>,
    #[serde(default)]
    style: Props,
}

impl TryFrom<RawNode> for Node {
    type Error = ModelError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let kind: NodeKind = raw.kind.parse()?;
        let layout = kind.slots();
        let mut content = raw.content;

        for key in SLOT_KEYS {
            if content.contains_key(*key) && !layout.owns_key(key) {
                return Err(ModelError::SlotMismatch {
                    kind,
                    slot: key.to_string(),
                });
            }
        }

        let slots = match layout {
            SlotLayout::Leaf => Vec::new(),
            SlotLayout::Named(names) => names
                .iter()
                .map(|name| read_list(kind, name, content.remove(*name)))
                .collect::<Result<_, _>>()?,
            SlotLayout::Indexed { key, count } => match content.remove(key) {
                None | Some(Value::Null) => vec![Vec::new(); count],
                Some(Value::Array(columns)) if columns.len() == count => columns
                    .into_iter()
                    .map(|column| read_list(kind, key, Some(column)))
                    .collect::<Result<_, _>>()?,
                Some(other) => {
                    return Err(ModelError::InvalidSlot {
                        kind,
                        key: key.to_string(),
                        reason: format!("expected an array of {} lists, got {}", count, other),
                    })
                }
            },
        };

        Ok(Node {
            id: raw.id,
            kind,
            content: Props::from(content),
            style: raw.style,
            slots,
        })
    }
}

fn read_list(kind: NodeKind, key: &str, value: Option<Value>) -> Result<Vec<Node>, ModelError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value @ Value::Array(_)) => Ok(serde_json::from_value(value)?),
        Some(other) => Err(ModelError::InvalidSlot {
            kind,
            key: key.to_string(),
            reason: format!("expected a list of nodes, got {}", other),
        }),
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("Node", 4)?;
        node.serialize_field("id", &self.id)?;
        node.serialize_field("type", &self.kind)?;
        node.serialize_field("content", &ContentView(self))?;
        node.serialize_field("style", &self.style)?;
        node.end()
    }
}

/// Content fields followed by slot lists under their schema keys
struct ContentView<'a>(&'a Node);

impl Serialize for ContentView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.0;
        let layout = node.kind.slots();
        let slot_entries = match layout {
            SlotLayout::Leaf => 0,
            SlotLayout::Named(names) => names.len(),
            SlotLayout::Indexed { .. } => 1,
        };

        let mut map = serializer.serialize_map(Some(node.content.len() + slot_entries))?;
        for (key, value) in node.content.iter() {
            map.serialize_entry(key, value)?;
        }
        match layout {
            SlotLayout::Leaf => {}
            SlotLayout::Named(names) => {
                for (name, list) in names.iter().zip(&node.slots) {
                    map.serialize_entry(name, list)?;
                }
            }
            SlotLayout::Indexed { key, .. } => map.serialize_entry(key, &node.slots)?,
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults() {
        let hero = Node::create(NodeKind::Hero);
        assert_eq!(hero.kind(), NodeKind::Hero);
        assert!(hero.content().get_str("title").is_some());
        assert!(hero.content().get_str("subtitle").is_some());
        assert!(hero.content().get_str("buttonText").is_some());
        assert!(hero.slots().is_empty());

        let grid = Node::create(NodeKind::GridThreeCols);
        assert_eq!(grid.slots().len(), 3);
        assert!(grid.slots().iter().all(Vec::is_empty));
        assert!(grid.left_children().is_none());
    }

    #[test]
    fn test_every_kind_has_matching_slot_arity() {
        for kind in NodeKind::ALL {
            let node = Node::create(kind);
            assert_eq!(node.slots().len(), kind.slots().slot_count(), "{}", kind);
            for key in SLOT_KEYS {
                assert!(!node.content().contains_key(key), "{} default content has {}", kind, key);
            }
        }
    }

    #[test]
    fn test_unknown_palette_kind_falls_back_to_leaf() {
        let node = Node::from_palette("Carousel");
        assert_eq!(node.kind(), NodeKind::FALLBACK);
        assert!(node.content().get_str("subtitle").unwrap().contains("Carousel"));
    }

    #[test]
    fn test_slot_keys_cannot_be_written_as_content() {
        let mut grid = Node::create(NodeKind::GridThreeCols);
        assert!(matches!(
            grid.set_content("leftChildren", json!([])),
            Err(ModelError::ReservedField { .. })
        ));
        assert!(grid.set_content("gap", "8").is_ok());
    }

    #[test]
    fn test_json_shape_of_grid() {
        let button = Node::create(NodeKind::Button);
        let grid = Node::create(NodeKind::GridTwoCols)
            .with_child(1, button.clone())
            .unwrap();

        let value = serde_json::to_value(&grid).unwrap();
        assert_eq!(value["type"], "GridTwoCols");
        assert_eq!(value["content"]["leftChildren"], json!([]));
        assert_eq!(value["content"]["rightChildren"][0]["id"], button.id().as_str());

        let three = serde_json::to_value(Node::create(NodeKind::GridThreeCols)).unwrap();
        assert_eq!(three["content"]["columns"], json!([[], [], []]));
    }

    #[test]
    fn test_faq_and_cta_use_uppercase_type_names() {
        let value = serde_json::to_value(Node::create(NodeKind::Faq)).unwrap();
        assert_eq!(value["type"], "FAQ");
        let value = serde_json::to_value(Node::create(NodeKind::Cta)).unwrap();
        assert_eq!(value["type"], "CTA");
    }

    #[test]
    fn test_deserialize_rejects_foreign_slot_keys() {
        let value = json!({
            "id": "g", "type": "GridThreeCols",
            "content": { "leftChildren": [] }, "style": {}
        });
        assert!(serde_json::from_value::<Node>(value).is_err());

        let value = json!({
            "id": "h", "type": "Hero",
            "content": { "children": [] }, "style": {}
        });
        assert!(serde_json::from_value::<Node>(value).is_err());
    }

    #[test]
    fn test_deserialize_rejects_wrong_column_count() {
        let value = json!({
            "id": "g", "type": "GridThreeCols",
            "content": { "columns": [[], []] }, "style": {}
        });
        assert!(serde_json::from_value::<Node>(value).is_err());
    }

    #[test]
    fn test_missing_slots_read_as_empty() {
        let value = json!({ "id": "c", "type": "Container", "content": { "title": "x" } });
        let node: Node = serde_json::from_value(value).unwrap();
        assert_eq!(node.children(), Some(&[][..]));
        assert!(node.style().is_empty());
    }

    #[test]
    fn test_fresh_ids_cover_every_descendant() {
        let grid = Node::create(NodeKind::GridThreeCols)
            .with_child(2, Node::create(NodeKind::Container).with_child(0, Node::create(NodeKind::Image)).unwrap())
            .unwrap();

        let copy = grid.with_fresh_ids();
        let old: Vec<_> = grid.ids();
        let new: Vec<_> = copy.ids();
        assert_eq!(old.len(), 3);
        assert_eq!(new.len(), 3);
        assert!(new.iter().all(|id| !old.contains(id)));
        assert_eq!(copy.column(2).unwrap()[0].children().unwrap()[0].content(), grid.column(2).unwrap()[0].children().unwrap()[0].content());
    }
}
