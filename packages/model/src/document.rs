//! The persisted page: `{ title, components, settings: { viewport, width } }`

use crate::{ModelError, Tree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preview width class of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Viewport::Desktop => "desktop",
            Viewport::Tablet => "tablet",
            Viewport::Mobile => "mobile",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default = "default_width")]
    pub width: String,
}

fn default_width() -> String {
    "1440".to_string()
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            width: default_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDocument {
    pub title: String,
    pub components: Tree,
    #[serde(default)]
    pub settings: PageSettings,
}

impl PageDocument {
    pub fn new(title: impl Into<String>, components: Tree, settings: PageSettings) -> Self {
        Self {
            title: title.into(),
            components,
            settings,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, NodeKind, Position};
    use serde_json::json;

    #[test]
    fn test_settings_use_lowercase_viewport() {
        let doc = PageDocument::new("Home", Tree::new(), PageSettings::default());
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Home",
                "components": [],
                "settings": { "viewport": "desktop", "width": "1440" }
            })
        );
    }

    #[test]
    fn test_missing_settings_take_defaults() {
        let doc = PageDocument::from_json(r#"{ "title": "x", "components": [] }"#).unwrap();
        assert_eq!(doc.settings, PageSettings::default());
    }

    #[test]
    fn test_duplicate_ids_are_rejected_on_load() {
        let hero = json!({ "id": "same", "type": "Hero", "content": {}, "style": {} });
        let text = json!({
            "title": "x",
            "components": [
                hero,
                { "id": "c", "type": "Container", "content": { "children": [hero] }, "style": {} }
            ]
        })
        .to_string();
        assert!(PageDocument::from_json(&text).is_err());
    }

    #[test]
    fn test_round_trip_preserves_nested_columns() {
        let mut tree = Tree::new();
        let grid = tree.attach(Node::create(NodeKind::GridThreeCols), Position::Root(0)).unwrap();
        tree.attach(
            Node::create(NodeKind::Testimonial),
            Position::Slot {
                parent: grid,
                slot: 2,
                index: None,
            },
        )
        .unwrap();

        let doc = PageDocument::new("Page", tree, PageSettings::default());
        let back = PageDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(back, doc);
    }
}
