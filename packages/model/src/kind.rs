//! # Node kinds and slot schemas
//!
//! The closed set of block kinds and, for each kind, the shape of the nested
//! node lists it holds. All slot addressing goes through one normalized
//! `(parent, slot index)` pair; the JSON key names only matter at the
//! serialization edge.
//!
//! | kind            | slots                              |
//! |-----------------|------------------------------------|
//! | content leaves  | none                               |
//! | Container       | `children`                         |
//! | Flexbox         | `children`                         |
//! | GridTwoCols     | `leftChildren`, `rightChildren`    |
//! | GridThreeCols   | `columns[0..3]`                    |

use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every kind of block a page can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Hero,
    Paragraph,
    Button,
    Image,
    Testimonial,
    Navbar,
    Footer,
    Features,
    Pricing,
    #[serde(rename = "FAQ")]
    Faq,
    #[serde(rename = "CTA")]
    Cta,
    Container,
    Flexbox,
    GridTwoCols,
    GridThreeCols,
}

/// Slot shape of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLayout {
    /// Content leaf, holds no nodes
    Leaf,

    /// One list per name, each stored under its own content key
    Named(&'static [&'static str]),

    /// `count` lists stored as an array of arrays under a single key
    Indexed { key: &'static str, count: usize },
}

/// Content keys that hold slots on some kind. They can never be written as
/// plain content, on any kind.
pub const SLOT_KEYS: &[&str] = &["children", "leftChildren", "rightChildren", "columns"];

const CHILDREN: SlotLayout = SlotLayout::Named(&["children"]);
const TWO_COLUMNS: SlotLayout = SlotLayout::Named(&["leftChildren", "rightChildren"]);
const THREE_COLUMNS: SlotLayout = SlotLayout::Indexed {
    key: "columns",
    count: 3,
};

impl NodeKind {
    pub const ALL: [NodeKind; 15] = [
        NodeKind::Hero,
        NodeKind::Paragraph,
        NodeKind::Button,
        NodeKind::Image,
        NodeKind::Testimonial,
        NodeKind::Navbar,
        NodeKind::Footer,
        NodeKind::Features,
        NodeKind::Pricing,
        NodeKind::Faq,
        NodeKind::Cta,
        NodeKind::Container,
        NodeKind::Flexbox,
        NodeKind::GridTwoCols,
        NodeKind::GridThreeCols,
    ];

    /// Kind used when the palette hands us something we don't know
    pub const FALLBACK: NodeKind = NodeKind::Paragraph;

    /// Canonical name, as written in the `type` field of persisted nodes
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Hero => "Hero",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Button => "Button",
            NodeKind::Image => "Image",
            NodeKind::Testimonial => "Testimonial",
            NodeKind::Navbar => "Navbar",
            NodeKind::Footer => "Footer",
            NodeKind::Features => "Features",
            NodeKind::Pricing => "Pricing",
            NodeKind::Faq => "FAQ",
            NodeKind::Cta => "CTA",
            NodeKind::Container => "Container",
            NodeKind::Flexbox => "Flexbox",
            NodeKind::GridTwoCols => "GridTwoCols",
            NodeKind::GridThreeCols => "GridThreeCols",
        }
    }

    /// Lowercase prefix used in generated ids
    pub fn slug(self) -> &'static str {
        match self {
            NodeKind::Hero => "hero",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Button => "button",
            NodeKind::Image => "image",
            NodeKind::Testimonial => "testimonial",
            NodeKind::Navbar => "navbar",
            NodeKind::Footer => "footer",
            NodeKind::Features => "features",
            NodeKind::Pricing => "pricing",
            NodeKind::Faq => "faq",
            NodeKind::Cta => "cta",
            NodeKind::Container => "container",
            NodeKind::Flexbox => "flexbox",
            NodeKind::GridTwoCols => "grid2",
            NodeKind::GridThreeCols => "grid3",
        }
    }

    /// Resolve a palette/drag-source kind string.
    ///
    /// Accepts canonical names, any casing of them, and the legacy palette
    /// labels. Unrecognized input is `None`; [`crate::Node::from_palette`]
    /// turns that into a fallback block.
    pub fn from_palette(name: &str) -> Option<NodeKind> {
        if let Ok(kind) = name.parse() {
            return Some(kind);
        }

        let trimmed = name.trim();
        if let Some(kind) = NodeKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(trimmed))
        {
            return Some(kind);
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "paragraphe" | "text" => Some(NodeKind::Paragraph),
            "bouton" => Some(NodeKind::Button),
            "grid2" => Some(NodeKind::GridTwoCols),
            "grid3" => Some(NodeKind::GridThreeCols),
            _ => None,
        }
    }

    /// Slot schema for this kind
    pub fn slots(self) -> SlotLayout {
        match self {
            NodeKind::Container | NodeKind::Flexbox => CHILDREN,
            NodeKind::GridTwoCols => TWO_COLUMNS,
            NodeKind::GridThreeCols => THREE_COLUMNS,
            _ => SlotLayout::Leaf,
        }
    }

}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = ModelError;

    /// Strict parse of a canonical kind name (persisted documents)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}

impl SlotLayout {
    /// Number of node lists this layout holds
    pub fn slot_count(&self) -> usize {
        match self {
            SlotLayout::Leaf => 0,
            SlotLayout::Named(names) => names.len(),
            SlotLayout::Indexed { count, .. } => *count,
        }
    }

    /// Whether `key` is one of this layout's content keys
    pub fn owns_key(&self, key: &str) -> bool {
        match self {
            SlotLayout::Leaf => false,
            SlotLayout::Named(names) => names.contains(&key),
            SlotLayout::Indexed { key: k, .. } => *k == key,
        }
    }

    /// Human label of a slot, used in error messages
    pub fn label(&self, slot: usize) -> String {
        match self {
            SlotLayout::Named(names) if slot < names.len() => names[slot].to_string(),
            SlotLayout::Indexed { key, .. } => format!("{}[{}]", key, slot),
            _ => format!("#{}", slot),
        }
    }
}

/// Named slot addressing for the API edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotName {
    /// `children` of Container/Flexbox
    Children,
    /// `leftChildren` of GridTwoCols
    Left,
    /// `rightChildren` of GridTwoCols
    Right,
    /// `columns[i]` of GridThreeCols
    Column(usize),
}

impl SlotName {
    /// Normalize to a slot index for `kind`, rejecting names the kind lacks
    pub fn resolve(self, kind: NodeKind) -> Result<usize, ModelError> {
        let index = match (self, kind) {
            (SlotName::Children, NodeKind::Container | NodeKind::Flexbox) => Some(0),
            (SlotName::Left, NodeKind::GridTwoCols) => Some(0),
            (SlotName::Right, NodeKind::GridTwoCols) => Some(1),
            (SlotName::Column(i), NodeKind::GridThreeCols) if i < 3 => Some(i),
            _ => None,
        };

        index.ok_or_else(|| ModelError::SlotMismatch {
            kind,
            slot: self.to_string(),
        })
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotName::Children => f.write_str("children"),
            SlotName::Left => f.write_str("leftChildren"),
            SlotName::Right => f.write_str("rightChildren"),
            SlotName::Column(i) => write!(f, "columns[{}]", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse_round_trips_every_kind() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
        }
        assert!("Paragraphe".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_palette_aliases() {
        assert_eq!(NodeKind::from_palette("hero"), Some(NodeKind::Hero));
        assert_eq!(NodeKind::from_palette("Paragraphe"), Some(NodeKind::Paragraph));
        assert_eq!(NodeKind::from_palette("Bouton"), Some(NodeKind::Button));
        assert_eq!(NodeKind::from_palette(" faq "), Some(NodeKind::Faq));
        assert_eq!(NodeKind::from_palette("Carousel"), None);
        assert_eq!(NodeKind::from_palette(""), None);
    }

    #[test]
    fn test_slot_schema_table() {
        assert_eq!(NodeKind::Hero.slots().slot_count(), 0);
        assert_eq!(NodeKind::Container.slots().slot_count(), 1);
        assert_eq!(NodeKind::Flexbox.slots().slot_count(), 1);
        assert_eq!(NodeKind::GridTwoCols.slots().slot_count(), 2);
        assert_eq!(NodeKind::GridThreeCols.slots().slot_count(), 3);

        assert!(NodeKind::GridTwoCols.slots().owns_key("leftChildren"));
        assert!(!NodeKind::GridThreeCols.slots().owns_key("leftChildren"));
        assert!(NodeKind::GridThreeCols.slots().owns_key("columns"));
    }

    #[test]
    fn test_slot_names_resolve_per_kind() {
        assert_eq!(SlotName::Right.resolve(NodeKind::GridTwoCols).unwrap(), 1);
        assert_eq!(SlotName::Column(2).resolve(NodeKind::GridThreeCols).unwrap(), 2);
        assert_eq!(SlotName::Children.resolve(NodeKind::Flexbox).unwrap(), 0);

        assert!(matches!(
            SlotName::Left.resolve(NodeKind::GridThreeCols),
            Err(ModelError::SlotMismatch { kind: NodeKind::GridThreeCols, .. })
        ));
        assert!(SlotName::Column(3).resolve(NodeKind::GridThreeCols).is_err());
        assert!(SlotName::Children.resolve(NodeKind::Hero).is_err());
    }
}
