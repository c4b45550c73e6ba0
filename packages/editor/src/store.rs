//! # Tree Store
//!
//! Owns the page tree, the selection and the page metadata as one unit.
//! Every change goes through [`TreeStore::dispatch`] (or undo/redo), which
//! computes the new state, commits all of it at once, records history for
//! user edits, and then notifies subscribers synchronously.
//!
//! ```text
//! Action ─→ PlacementResolver ─→ Mutation::apply ─→ commit (tree + selection)
//!                                                    ├─→ History::record_*  (edits only)
//!                                                    └─→ subscribers
//! undo/redo ─→ History cursor ─→ commit ─→ subscribers   (never recorded)
//! ```
//!
//! Listeners receive a borrowed [`StoreEvent`] and cannot reach back into
//! the store while it is being notified.

use crate::mutations::{Direction, Mutation, MutationError, NoOp, Outcome};
use crate::placement::{DropTarget, PlacementResolver};
use crate::undo_stack::{CoalesceKey, History};
use crate::{EditorConfig, EditorError};
use pagesmith_model::{NodeId, NodeKind, PageDocument, PageSettings, Props, Tree, Viewport};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// The active node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub id: NodeId,
    pub kind: NodeKind,
}

/// Everything a user can ask the store to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Create a block of palette kind `kind` at `target`
    Insert { kind: String, target: DropTarget },
    Move { node_id: NodeId, direction: Direction },
    Relocate { node_id: NodeId, target: DropTarget },
    Duplicate { node_id: NodeId },
    Delete { node_id: NodeId },
    UpdateContent { node_id: NodeId, patch: Props },
    UpdateStyle { node_id: NodeId, patch: Props },
    Select(Option<NodeId>),
    SetTitle(String),
    SetViewport(Viewport),
    SetWidth(String),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Insert { .. } => "insert",
            Action::Move { .. } => "move",
            Action::Relocate { .. } => "relocate",
            Action::Duplicate { .. } => "duplicate",
            Action::Delete { .. } => "delete",
            Action::UpdateContent { .. } => "update_content",
            Action::UpdateStyle { .. } => "update_style",
            Action::Select(_) => "select",
            Action::SetTitle(_) => "set_title",
            Action::SetViewport(_) => "set_viewport",
            Action::SetWidth(_) => "set_width",
        }
    }

    /// History grouping key for property-panel edits
    fn coalesce_key(&self) -> Option<CoalesceKey> {
        let (node_id, patch, style) = match self {
            Action::UpdateContent { node_id, patch } => (node_id, patch, false),
            Action::UpdateStyle { node_id, patch } => (node_id, patch, true),
            _ => return None,
        };
        Some(CoalesceKey {
            node_id: node_id.clone(),
            style,
            fields: patch.keys().map(str::to_string).collect(),
        })
    }
}

/// What a dispatch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Committed {
        version: u64,
        /// Node created by an insert or duplicate
        created: Option<NodeId>,
    },
    NoOp(NoOp),
}

impl DispatchStatus {
    pub fn is_committed(&self) -> bool {
        matches!(self, DispatchStatus::Committed { .. })
    }

    pub fn created(&self) -> Option<&NodeId> {
        match self {
            DispatchStatus::Committed { created, .. } => created.as_ref(),
            DispatchStatus::NoOp(_) => None,
        }
    }
}

/// Why subscribers are being notified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Edit,
    Selection,
    Metadata,
    Undo,
    Redo,
    Load,
}

/// Committed state handed to subscribers
#[derive(Debug, Clone, Copy)]
pub struct StoreEvent<'a> {
    pub version: u64,
    pub cause: Cause,
    pub tree: &'a Tree,
    pub selection: Option<&'a Selection>,
    pub title: &'a str,
    pub settings: &'a PageSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent<'_>)>;

pub struct TreeStore {
    tree: Tree,
    selection: Option<Selection>,
    title: String,
    settings: PageSettings,
    history: History,
    resolver: PlacementResolver,
    config: EditorConfig,

    /// Increments on every committed change
    version: u64,

    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let tree = Tree::new();
        Self {
            history: Self::history_for(&config, tree.clone()),
            tree,
            selection: None,
            title: config.default_title.clone(),
            settings: config.default_settings(),
            resolver: PlacementResolver::new(),
            config,
            version: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    fn history_for(config: &EditorConfig, baseline: Tree) -> History {
        History::with_max_levels(baseline, config.history_limit)
            .with_coalesce_window(config.coalesce_window())
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Register a listener; it runs after every committed change
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent<'_>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the listener was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn dispatch(&mut self, action: Action) -> Result<DispatchStatus, EditorError> {
        self.dispatch_at(action, Instant::now())
    }

    /// [`TreeStore::dispatch`] with an explicit clock reading, used for
    /// keystroke coalescing
    pub fn dispatch_at(&mut self, action: Action, now: Instant) -> Result<DispatchStatus, EditorError> {
        let name = action.name();
        let key = action.coalesce_key();
        let status = match action {
            Action::Select(id) => self.select(id),
            Action::SetTitle(title) => {
                if title == self.title {
                    DispatchStatus::NoOp(NoOp::Unchanged)
                } else {
                    self.title = title;
                    self.commit(Cause::Metadata, None)
                }
            }
            Action::SetViewport(viewport) => {
                if viewport == self.settings.viewport {
                    DispatchStatus::NoOp(NoOp::Unchanged)
                } else {
                    self.settings.viewport = viewport;
                    self.commit(Cause::Metadata, None)
                }
            }
            Action::SetWidth(width) => {
                if width == self.settings.width {
                    DispatchStatus::NoOp(NoOp::Unchanged)
                } else {
                    self.settings.width = width;
                    self.commit(Cause::Metadata, None)
                }
            }
            Action::Insert { kind, target } => {
                let mutation = self.resolver.insert(&self.tree, &kind, &target)?;
                self.apply(&mutation, key, now)?
            }
            Action::Relocate { node_id, target } => {
                let mutation = self.resolver.relocate(&self.tree, &node_id, &target)?;
                self.apply(&mutation, key, now)?
            }
            Action::Move { node_id, direction } => {
                self.apply(&Mutation::Move { node_id, direction }, key, now)?
            }
            Action::Duplicate { node_id } => self.apply(&Mutation::Duplicate { node_id }, key, now)?,
            Action::Delete { node_id } => self.apply(&Mutation::Delete { node_id }, key, now)?,
            Action::UpdateContent { node_id, patch } => {
                self.apply(&Mutation::UpdateContent { node_id, patch }, key, now)?
            }
            Action::UpdateStyle { node_id, patch } => {
                self.apply(&Mutation::UpdateStyle { node_id, patch }, key, now)?
            }
        };

        match &status {
            DispatchStatus::Committed { version, .. } => {
                tracing::debug!(action = name, version, "dispatch committed");
            }
            DispatchStatus::NoOp(reason) => {
                tracing::debug!(action = name, %reason, "dispatch skipped");
            }
        }
        Ok(status)
    }

    fn apply(
        &mut self,
        mutation: &Mutation,
        key: Option<CoalesceKey>,
        now: Instant,
    ) -> Result<DispatchStatus, MutationError> {
        let (tree, created) = match mutation.apply(&self.tree)? {
            Outcome::Applied { tree, created } => (tree, created),
            Outcome::Skipped(reason) => return Ok(DispatchStatus::NoOp(reason)),
        };

        self.tree = tree;
        self.reconcile_selection();

        // one record per user edit, from here only
        match key {
            Some(key) => self.history.record_coalesced(&self.tree, key, now),
            None => self.history.record_if_changed(&self.tree),
        };

        Ok(self.commit(Cause::Edit, created))
    }

    fn select(&mut self, id: Option<NodeId>) -> DispatchStatus {
        let next = match id {
            None => None,
            Some(id) => match self.tree.kind(&id) {
                Some(kind) => Some(Selection { id, kind }),
                None => return DispatchStatus::NoOp(NoOp::NodeNotFound),
            },
        };
        if next == self.selection {
            return DispatchStatus::NoOp(NoOp::Unchanged);
        }
        self.selection = next;
        self.commit(Cause::Selection, None)
    }

    /// Drop the selection if its node no longer exists
    fn reconcile_selection(&mut self) {
        if let Some(selection) = &self.selection {
            if self.tree.kind(&selection.id) != Some(selection.kind) {
                self.selection = None;
            }
        }
    }

    /// Step back in history. Restored trees are not re-recorded.
    pub fn undo(&mut self) -> DispatchStatus {
        let Some(tree) = self.history.undo().cloned() else {
            return DispatchStatus::NoOp(NoOp::NothingToUndo);
        };
        self.restore(tree, Cause::Undo)
    }

    /// Step forward in history. Restored trees are not re-recorded.
    pub fn redo(&mut self) -> DispatchStatus {
        let Some(tree) = self.history.redo().cloned() else {
            return DispatchStatus::NoOp(NoOp::NothingToRedo);
        };
        self.restore(tree, Cause::Redo)
    }

    fn restore(&mut self, tree: Tree, cause: Cause) -> DispatchStatus {
        self.tree = tree;
        self.reconcile_selection();
        let status = self.commit(cause, None);
        tracing::debug!(?cause, version = self.version, "history restored");
        status
    }

    /// Group the following dispatches into a single undo step
    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Install `document`, dropping selection and history
    pub fn load(&mut self, document: PageDocument) -> Result<DispatchStatus, EditorError> {
        document.components.check_invariants()?;
        let PageDocument {
            title,
            components,
            settings,
        } = document;

        tracing::info!(title = %title, nodes = components.node_count(), "loading page");
        self.history.reset(components.clone());
        self.tree = components;
        self.title = title;
        self.settings = settings;
        self.selection = None;
        Ok(self.commit(Cause::Load, None))
    }

    /// Parse and install a JSON page document
    pub fn load_json(&mut self, json: &str) -> Result<DispatchStatus, EditorError> {
        let document = PageDocument::from_json(json)?;
        self.load(document)
    }

    /// Start over with an empty page
    pub fn reset(&mut self) -> DispatchStatus {
        tracing::info!("resetting page");
        self.history.reset(Tree::new());
        self.tree = Tree::new();
        self.title = self.config.default_title.clone();
        self.settings = self.config.default_settings();
        self.selection = None;
        self.commit(Cause::Load, None)
    }

    /// Frozen copy of the page for persistence
    pub fn document(&self) -> PageDocument {
        PageDocument::new(self.title.clone(), self.tree.clone(), self.settings.clone())
    }

    fn commit(&mut self, cause: Cause, created: Option<NodeId>) -> DispatchStatus {
        self.version += 1;
        let event = StoreEvent {
            version: self.version,
            cause,
            tree: &self.tree,
            selection: self.selection.as_ref(),
            title: &self.title,
            settings: &self.settings,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        DispatchStatus::Committed {
            version: self.version,
            created,
        }
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("tree", &self.tree)
            .field("selection", &self.selection)
            .field("title", &self.title)
            .field("settings", &self.settings)
            .field("version", &self.version)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
