//! Integration tests for editor crate

use pagesmith_editor::{
    Action, Cause, DispatchStatus, DropTarget, EditorConfig, EditorError, Mutation, NoOp,
    PropertyBinder, TreeStore,
};
use pagesmith_model::{NodeId, NodeKind, PageDocument, Viewport};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_document_lifecycle() -> anyhow::Result<()> {
    let mut store = TreeStore::new();
    assert_eq!(store.version(), 0);

    let status = store.dispatch(Action::Insert {
        kind: "Navbar".to_string(),
        target: DropTarget::RootIndex(0),
    })?;
    assert!(status.is_committed());
    store.dispatch(Action::SetTitle("Launch".to_string()))?;
    store.dispatch(Action::SetViewport(Viewport::Tablet))?;

    let saved = store.document().to_json_pretty()?;

    let mut reopened = TreeStore::new();
    reopened.load_json(&saved)?;
    assert_eq!(reopened.document(), store.document());
    assert_eq!(reopened.title(), "Launch");
    assert_eq!(reopened.settings().viewport, Viewport::Tablet);
    assert!(!reopened.can_undo());
    Ok(())
}

#[test]
fn test_subscriber_observes_consistent_tree_and_selection() -> anyhow::Result<()> {
    let mut store = TreeStore::new();
    let container = store
        .dispatch(Action::Insert { kind: "Container".to_string(), target: DropTarget::RootIndex(0) })?
        .created()
        .cloned()
        .unwrap();
    let child = store
        .dispatch(Action::Insert {
            kind: "Testimonial".to_string(),
            target: DropTarget::ContainerSlot(container.clone()),
        })?
        .created()
        .cloned()
        .unwrap();
    store.dispatch(Action::Select(Some(child.clone())))?;

    let violations = Rc::new(RefCell::new(0));
    let events = Rc::new(RefCell::new(Vec::new()));
    let (v, e) = (violations.clone(), events.clone());
    store.subscribe(move |event| {
        if let Some(selection) = event.selection {
            if event.tree.kind(&selection.id) != Some(selection.kind) {
                *v.borrow_mut() += 1;
            }
        }
        e.borrow_mut().push((event.version, event.cause));
    });

    store.dispatch(Action::Delete { node_id: container })?;
    store.undo();
    store.redo();

    assert_eq!(*violations.borrow(), 0);
    let events = events.borrow();
    assert_eq!(
        events.iter().map(|(_, cause)| *cause).collect::<Vec<_>>(),
        vec![Cause::Edit, Cause::Undo, Cause::Redo]
    );
    assert!(events.windows(2).all(|w| w[0].0 < w[1].0));
    assert!(store.selection().is_none());
    Ok(())
}

#[test]
fn test_property_panel_typing_flow() -> anyhow::Result<()> {
    let mut store = TreeStore::new();
    let cta = store
        .dispatch(Action::Insert { kind: "cta".to_string(), target: DropTarget::RootIndex(0) })?
        .created()
        .cloned()
        .unwrap();
    store.dispatch(Action::Select(Some(cta.clone())))?;

    let mut binder = PropertyBinder::new();
    binder.sync(&store);
    assert_eq!(binder.selection().map(|s| s.kind), Some(NodeKind::Cta));

    for text in ["S", "Si", "Sig", "Sign up"] {
        binder.edit_content(&mut store, "buttonText", text)?;
    }
    binder.edit_style(&mut store, "backgroundColor", "green-500")?;

    let content = store.tree().content(&cta).unwrap();
    assert_eq!(content.get_str("buttonText"), Some("Sign up"));
    assert_eq!(content.get_str("secondaryButtonText"), Some("Learn more"));
    assert_eq!(store.tree().style(&cta).unwrap().get_str("layout"), Some("center"));
    Ok(())
}

#[test]
fn test_unknown_palette_kind_never_fails() -> anyhow::Result<()> {
    let mut store = TreeStore::new();
    let id = store
        .dispatch(Action::Insert { kind: "VideoEmbed".to_string(), target: DropTarget::RootIndex(0) })?
        .created()
        .cloned()
        .unwrap();

    assert_eq!(store.tree().kind(&id), Some(NodeKind::FALLBACK));
    let subtitle = store.tree().content(&id).unwrap().get_str("subtitle").unwrap();
    assert!(subtitle.contains("VideoEmbed"));
    Ok(())
}

#[test]
fn test_schema_violations_are_errors_not_no_ops() {
    let mut store = TreeStore::new();
    let grid = store
        .dispatch(Action::Insert { kind: "GridThreeCols".to_string(), target: DropTarget::RootIndex(0) })
        .unwrap()
        .created()
        .cloned()
        .unwrap();
    let version = store.version();

    let write_slot = store.dispatch(Action::UpdateContent {
        node_id: grid.clone(),
        patch: serde_json::from_value(json!({ "leftChildren": [] })).unwrap(),
    });
    assert!(matches!(write_slot, Err(EditorError::Mutation(_))));

    let bad_column = store.dispatch(Action::Insert {
        kind: "Button".to_string(),
        target: DropTarget::GridSlot(grid, 3),
    });
    assert!(matches!(bad_column, Err(EditorError::Mutation(_))));

    assert_eq!(store.version(), version);
    assert_eq!(store.tree().node_count(), 1);
}

#[test]
fn test_load_rejects_malformed_documents() {
    let mut store = TreeStore::new();
    let bad = json!({
        "title": "x",
        "components": [{ "id": "g", "type": "GridThreeCols", "content": { "columns": [[]] }, "style": {} }]
    });
    assert!(matches!(store.load_json(&bad.to_string()), Err(EditorError::Model(_))));
    assert_eq!(store.version(), 0);
}

#[test]
fn test_config_drives_fresh_page() -> anyhow::Result<()> {
    let config = EditorConfig::from_json(r#"{ "defaultTitle": "Blank", "defaultViewport": "mobile" }"#)?;
    let mut store = TreeStore::with_config(config);
    assert_eq!(store.title(), "Blank");
    assert_eq!(store.settings().viewport, Viewport::Mobile);

    store.dispatch(Action::SetTitle("Changed".to_string()))?;
    store.reset();
    assert_eq!(store.title(), "Blank");
    Ok(())
}

#[test]
fn test_action_and_mutation_serialization() -> anyhow::Result<()> {
    let action = Action::Insert {
        kind: "Hero".to_string(),
        target: DropTarget::GridSlot(NodeId::from("grid2-1"), 1),
    };
    let json = serde_json::to_string(&action)?;
    assert_eq!(serde_json::from_str::<Action>(&json)?, action);

    let mutation = Mutation::Delete { node_id: NodeId::from("hero-1") };
    let json = serde_json::to_string(&mutation)?;
    assert_eq!(serde_json::from_str::<Mutation>(&json)?, mutation);
    Ok(())
}

#[test]
fn test_selecting_same_node_twice_is_unchanged() -> anyhow::Result<()> {
    let mut store = TreeStore::new();
    let id = store
        .dispatch(Action::Insert { kind: "Image".to_string(), target: DropTarget::RootIndex(0) })?
        .created()
        .cloned()
        .unwrap();

    assert!(store.dispatch(Action::Select(Some(id.clone())))?.is_committed());
    assert_eq!(
        store.dispatch(Action::Select(Some(id)))?,
        DispatchStatus::NoOp(NoOp::Unchanged)
    );
    assert!(store.dispatch(Action::Select(None))?.is_committed());
    Ok(())
}

#[test]
fn test_document_snapshot_is_frozen() -> anyhow::Result<()> {
    let mut store = TreeStore::new();
    store.dispatch(Action::Insert { kind: "Hero".to_string(), target: DropTarget::RootIndex(0) })?;
    let snapshot: PageDocument = store.document();

    store.dispatch(Action::Insert { kind: "Footer".to_string(), target: DropTarget::RootIndex(1) })?;
    assert_eq!(snapshot.components.root().len(), 1);
    assert_eq!(store.tree().root().len(), 2);
    Ok(())
}
