//! # Undo/Redo History
//!
//! Linear history of whole-tree snapshots.
//!
//! ## Design
//!
//! - `snapshots[cursor]` is always the tree currently shown
//! - Recording after an undo discards every snapshot past the cursor
//! - Undo/redo only move the cursor; they never record
//! - A batch (several dispatches, one undo step) replaces its own snapshot
//!   instead of pushing a new one
//! - Rapid edits of the same fields on the same node within the coalescing
//!   window also replace the top snapshot
//!
//! ## Example
//!
//! ```rust
//! use pagesmith_editor::History;
//! use pagesmith_model::{Node, NodeKind, Position, Tree};
//!
//! let mut history = History::new(Tree::new());
//! let mut tree = Tree::new();
//! tree.attach(Node::create(NodeKind::Hero), Position::Root(0))?;
//!
//! assert!(history.record_if_changed(&tree));
//! assert!(!history.record_if_changed(&tree));
//! assert_eq!(history.undo(), Some(&Tree::new()));
//! assert_eq!(history.undo(), None);
//! # Ok::<(), pagesmith_model::ModelError>(())
//! ```

use pagesmith_model::{NodeId, Tree};
use std::time::{Duration, Instant};

/// Identifies a run of keystrokes that may share one undo step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalesceKey {
    pub node_id: NodeId,
    /// `true` for style edits, `false` for content edits
    pub style: bool,
    /// Patched field names, sorted
    pub fields: Vec<String>,
}

/// Undo/redo history for one page
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Tree>,
    cursor: usize,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    coalesce_window: Duration,
    last_edit: Option<(CoalesceKey, Instant)>,

    /// `Some(pushed)` while a batch is open
    batch: Option<bool>,
}

impl History {
    /// History with `initial` as the baseline and default max levels (100)
    pub fn new(initial: Tree) -> Self {
        Self::with_max_levels(initial, 100)
    }

    pub fn with_max_levels(initial: Tree, max_levels: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            max_levels,
            coalesce_window: Duration::from_millis(300),
            last_edit: None,
            batch: None,
        }
    }

    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    /// The snapshot under the cursor
    pub fn current(&self) -> &Tree {
        &self.snapshots[self.cursor]
    }

    /// Record `tree` unless it equals the current snapshot. Returns whether
    /// anything was recorded.
    pub fn record_if_changed(&mut self, tree: &Tree) -> bool {
        self.last_edit = None;
        if *tree == self.snapshots[self.cursor] {
            tracing::trace!(cursor = self.cursor, "history unchanged");
            return false;
        }

        self.snapshots.truncate(self.cursor + 1);
        match self.batch {
            Some(true) => {
                tracing::trace!(cursor = self.cursor, "history replace (batch)");
                self.snapshots[self.cursor] = tree.clone();
            }
            _ => {
                self.push(tree.clone());
                if self.batch.is_some() {
                    self.batch = Some(true);
                }
            }
        }
        true
    }

    /// Like [`History::record_if_changed`], but an edit with the same `key`
    /// within the coalescing window of the previous one replaces the top
    /// snapshot instead of adding an undo step.
    pub fn record_coalesced(&mut self, tree: &Tree, key: CoalesceKey, now: Instant) -> bool {
        let coalesce = self.batch.is_none()
            && self.cursor > 0
            && self.cursor + 1 == self.snapshots.len()
            && matches!(
                &self.last_edit,
                Some((last, at)) if *last == key && now.saturating_duration_since(*at) <= self.coalesce_window
            );

        if !coalesce {
            let recorded = self.record_if_changed(tree);
            if recorded && self.batch.is_none() {
                self.last_edit = Some((key, now));
            }
            return recorded;
        }

        self.last_edit = Some((key, now));
        if *tree == self.snapshots[self.cursor] {
            return false;
        }
        if *tree == self.snapshots[self.cursor - 1] {
            tracing::trace!(cursor = self.cursor, "history coalesced back to previous");
            self.snapshots.pop();
            self.cursor -= 1;
            self.last_edit = None;
        } else {
            tracing::trace!(cursor = self.cursor, "history replace (coalesced)");
            self.snapshots[self.cursor] = tree.clone();
        }
        true
    }

    fn push(&mut self, tree: Tree) {
        self.snapshots.push(tree);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.snapshots.len() > self.max_levels + 1 {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
        tracing::trace!(cursor = self.cursor, "history push");
    }

    /// Step back; `None` when already at the oldest snapshot
    pub fn undo(&mut self) -> Option<&Tree> {
        self.batch = None;
        self.last_edit = None;
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward; `None` when already at the newest snapshot
    pub fn redo(&mut self) -> Option<&Tree> {
        self.batch = None;
        self.last_edit = None;
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.snapshots[self.cursor])
    }

    /// Start grouping records into one undo step
    pub fn begin_batch(&mut self) {
        if self.batch.is_none() {
            self.batch = Some(false);
        }
        self.last_edit = None;
    }

    /// Close the batch; the next edit always starts a new undo step
    pub fn end_batch(&mut self) {
        self.batch = None;
        self.last_edit = None;
    }

    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn undo_levels(&self) -> usize {
        self.cursor
    }

    pub fn redo_levels(&self) -> usize {
        self.snapshots.len() - 1 - self.cursor
    }

    /// Drop all history, keeping the current tree as the new baseline
    pub fn clear(&mut self) {
        let current = self.snapshots.swap_remove(self.cursor);
        self.reset(current);
    }

    /// Drop all history and start over from `baseline`
    pub fn reset(&mut self, baseline: Tree) {
        self.snapshots = vec![baseline];
        self.cursor = 0;
        self.last_edit = None;
        self.batch = None;
    }
}
