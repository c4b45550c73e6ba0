//! # Property Binder
//!
//! Glue between a property panel and the store. It follows the store's
//! selection, keeps field edits staged so the panel can show them at once,
//! and forwards them as partial `UpdateContent` / `UpdateStyle` dispatches.
//!
//! Switching to another node drops anything still staged.

use crate::mutations::NoOp;
use crate::store::{Action, DispatchStatus, Selection, TreeStore};
use crate::EditorError;
use pagesmith_model::{check_content_fields, Props};
use serde_json::Value;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PropertyBinder {
    selection: Option<Selection>,
    staged_content: Props,
    staged_style: Props,
}

impl PropertyBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Follow the store's selection. Staged edits for a node that is no
    /// longer selected are discarded.
    pub fn sync(&mut self, store: &TreeStore) {
        let current = store.selection();
        if self.selection.as_ref() != current {
            if self.has_pending() {
                tracing::debug!("discarding staged property edits");
            }
            self.selection = current.cloned();
            self.staged_content = Props::new();
            self.staged_style = Props::new();
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.staged_content.is_empty() || !self.staged_style.is_empty()
    }

    /// Stage one content field. Slot keys are refused here rather than at
    /// commit time. Returns `Some(NoOp::NodeNotFound)` when nothing is
    /// selected.
    pub fn stage_content(&mut self, key: &str, value: impl Into<Value>) -> Result<Option<NoOp>, EditorError> {
        let Some(selection) = &self.selection else {
            return Ok(Some(NoOp::NodeNotFound));
        };
        let field = Props::new().with(key, value);
        check_content_fields(selection.kind, &field)?;
        self.staged_content.merge(&field);
        Ok(None)
    }

    pub fn stage_style(&mut self, key: &str, value: impl Into<Value>) -> Option<NoOp> {
        if self.selection.is_none() {
            return Some(NoOp::NodeNotFound);
        }
        self.staged_style.insert(key, value);
        None
    }

    /// Content value as the panel should show it: staged first, then the tree
    pub fn content_value<'a>(&'a self, store: &'a TreeStore, key: &str) -> Option<&'a Value> {
        self.staged_content
            .get(key)
            .or_else(|| store.tree().content(&self.selection.as_ref()?.id)?.get(key))
    }

    pub fn style_value<'a>(&'a self, store: &'a TreeStore, key: &str) -> Option<&'a Value> {
        self.staged_style
            .get(key)
            .or_else(|| store.tree().style(&self.selection.as_ref()?.id)?.get(key))
    }

    pub fn commit(&mut self, store: &mut TreeStore) -> Result<DispatchStatus, EditorError> {
        self.commit_at(store, Instant::now())
    }

    /// Send staged edits to `store`. Content and style go out as one undo
    /// step when both are staged.
    pub fn commit_at(&mut self, store: &mut TreeStore, now: Instant) -> Result<DispatchStatus, EditorError> {
        self.sync(store);
        let Some(selection) = &self.selection else {
            return Ok(DispatchStatus::NoOp(NoOp::NodeNotFound));
        };
        if !self.has_pending() {
            return Ok(DispatchStatus::NoOp(NoOp::Unchanged));
        }

        let node_id = selection.id.clone();
        let content = std::mem::take(&mut self.staged_content);
        let style = std::mem::take(&mut self.staged_style);

        let mut actions = Vec::with_capacity(2);
        if !content.is_empty() {
            actions.push(Action::UpdateContent {
                node_id: node_id.clone(),
                patch: content,
            });
        }
        if !style.is_empty() {
            actions.push(Action::UpdateStyle {
                node_id,
                patch: style,
            });
        }

        let batched = actions.len() > 1;
        if batched {
            store.begin_batch();
        }
        let mut status = DispatchStatus::NoOp(NoOp::Unchanged);
        let mut result = Ok(());
        for action in actions {
            match store.dispatch_at(action, now) {
                Ok(next) if next.is_committed() || !status.is_committed() => status = next,
                Ok(_) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        if batched {
            store.end_batch();
        }

        result.map(|_| status)
    }

    /// Stage and immediately commit one content field (a keystroke)
    pub fn edit_content(
        &mut self,
        store: &mut TreeStore,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<DispatchStatus, EditorError> {
        self.sync(store);
        if let Some(reason) = self.stage_content(key, value)? {
            return Ok(DispatchStatus::NoOp(reason));
        }
        self.commit(store)
    }

    /// Stage and immediately commit one style field
    pub fn edit_style(
        &mut self,
        store: &mut TreeStore,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<DispatchStatus, EditorError> {
        self.sync(store);
        if let Some(reason) = self.stage_style(key, value) {
            return Ok(DispatchStatus::NoOp(reason));
        }
        self.commit(store)
    }
}
