//! # Pagesmith Editor
//!
//! Editing engine for the page tree: mutations, drop placement, undo/redo
//! history, the store that owns the page, and the property-panel binder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: NodeKind, Node, Tree, PageDocument   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor                                      │
//! │  - placement: drop target → Mutation        │
//! │  - mutations: pure Tree → Tree edits        │
//! │  - undo_stack: snapshot history             │
//! │  - store: tree + selection, dispatch        │
//! │  - binder: staged property-panel edits      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ renderer / property panel (subscribers)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are values**: every edit produces a new tree, so history is
//!    a list of trees and undo is a cursor move
//! 2. **Record on dispatch**: history is written by the dispatch path, never
//!    in response to the tree changing
//! 3. **Routine failures are statuses**: a missing id or an undo with no past
//!    returns [`NoOp`]; only schema violations are errors
//!
//! ## Usage
//!
//! ```rust
//! use pagesmith_editor::{Action, DropTarget, TreeStore};
//!
//! let mut store = TreeStore::new();
//! let status = store.dispatch(Action::Insert {
//!     kind: "GridTwoCols".to_string(),
//!     target: DropTarget::RootIndex(0),
//! })?;
//! let grid = status.created().cloned().unwrap();
//!
//! store.dispatch(Action::Insert {
//!     kind: "Button".to_string(),
//!     target: DropTarget::GridSlot(grid.clone(), 1),
//! })?;
//! assert_eq!(store.tree().slot(&grid, 1).map(|s| s.len()), Some(1));
//!
//! store.undo();
//! assert_eq!(store.tree().slot(&grid, 1).map(|s| s.len()), Some(0));
//! # Ok::<(), pagesmith_editor::EditorError>(())
//! ```

mod binder;
mod config;
mod errors;
mod mutations;
mod placement;
mod store;
mod undo_stack;

pub use binder::PropertyBinder;
pub use config::EditorConfig;
pub use errors::EditorError;
pub use mutations::{
    delete_node, duplicate, insert_at_root, insert_into_slot, move_node, relocate, update_content,
    update_style, Direction, Mutation, MutationError, NoOp, Outcome,
};
pub use placement::{DropTarget, PlacementResolver};
pub use store::{Action, Cause, DispatchStatus, Selection, StoreEvent, SubscriptionId, TreeStore};
pub use undo_stack::{CoalesceKey, History};

// Re-export model types for convenience
pub use pagesmith_model as model;
