//! # Pagesmith Model
//!
//! The document tree of a visual page builder: a closed set of block kinds,
//! the slot schema for each container kind, and the page they make up.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ kind: NodeKind + per-kind slot schema       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ node: nested Node values                    │
//! │  - factory with default content per kind    │
//! │  - strict JSON read, lossless JSON write    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ tree: arena of nodes + ordered id lists     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: { title, components, settings }   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use pagesmith_model::{Node, NodeKind, PageDocument, PageSettings, Position, SlotName, Tree};
//!
//! let mut tree = Tree::new();
//! let grid = tree.attach(Node::create(NodeKind::GridTwoCols), Position::Root(0))?;
//! let right = SlotName::Right.resolve(NodeKind::GridTwoCols)?;
//! tree.attach(
//!     Node::create(NodeKind::Button),
//!     Position::Slot { parent: grid, slot: right, index: None },
//! )?;
//!
//! let doc = PageDocument::new("Landing", tree, PageSettings::default());
//! let json = doc.to_json()?;
//! assert_eq!(PageDocument::from_json(&json)?, doc);
//! # Ok::<(), pagesmith_model::ModelError>(())
//! ```

mod document;
mod error;
mod id_generator;
mod kind;
mod node;
mod props;
mod tree;

pub use document::{PageDocument, PageSettings, Viewport};
pub use error::ModelError;
pub use id_generator::NodeId;
pub use kind::{NodeKind, SlotLayout, SlotName, SLOT_KEYS};
pub use node::{check_content_fields, Node};
pub use props::Props;
pub use tree::{Location, Position, Tree};
