//! # Document Model
//!
//! The page-builder document as plain serializable values.
//!
//! ```text
//! Project
//!   ├── pages: [Page { tree: [ComponentNode { children: [...] }] }]
//!   └── global_components: [GlobalComponent { children: [...] }]
//! ```
//!
//! The JSON form produced by serde is the import/export and persistence
//! format. Every field round-trips, including `collapsed`, `interactions`
//! and the instance back-reference.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Ordered list of top-level nodes for one page
pub type Tree = Vec<ComponentNode>;

/// Opaque prop bag owned by the component catalog
pub type Props = Map<String, Value>;

/// A single element of the page tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub id: String,

    /// Catalog tag (e.g. "Div", "Button")
    #[serde(rename = "type")]
    pub node_type: String,

    /// User label, distinct from the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub children: Vec<ComponentNode>,

    /// Trigger/action bindings, carried without interpretation
    #[serde(default)]
    pub interactions: Vec<Value>,

    #[serde(default)]
    pub collapsed: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_global_instance: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_component_id: Option<String>,
}

impl ComponentNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            name: None,
            props: Props::new(),
            children: Vec::new(),
            interactions: Vec::new(),
            collapsed: false,
            is_global_instance: false,
            global_component_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_child(mut self, child: ComponentNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = ComponentNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// Number of nodes in this subtree, the node itself included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ComponentNode::count).sum::<usize>()
    }

    /// Ids of this node and all descendants in pre-order
    pub fn subtree_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.collect_ids_into(&mut ids);
        ids
    }

    fn collect_ids_into(&self, ids: &mut Vec<String>) {
        ids.push(self.id.clone());
        for child in &self.children {
            child.collect_ids_into(ids);
        }
    }

    /// Mark this node as an instance of a master
    pub fn link_to_master(&mut self, global_component_id: impl Into<String>) {
        self.is_global_instance = true;
        self.global_component_id = Some(global_component_id.into());
    }

    /// Drop the master link, keeping everything else
    pub fn unlink_from_master(&mut self) {
        self.is_global_instance = false;
        self.global_component_id = None;
    }

    /// The master id if this node is a live instance
    pub fn instance_of(&self) -> Option<&str> {
        if self.is_global_instance {
            self.global_component_id.as_deref()
        } else {
            None
        }
    }
}

/// One page of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tree: Tree,
}

impl Page {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tree: Tree::new(),
        }
    }

    pub fn with_tree(mut self, tree: Tree) -> Self {
        self.tree = tree;
        self
    }
}

/// A master subtree definition (symbol)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalComponent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub children: Vec<ComponentNode>,
}

/// A whole editable document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub pages: Vec<Page>,
    pub current_page_id: String,

    #[serde(default)]
    pub global_components: Vec<GlobalComponent>,

    /// Theme/layout settings, opaque to the engine
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,
}

impl Project {
    /// Project with a single page
    pub fn new(id: impl Into<String>, name: impl Into<String>, first_page: Page) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current_page_id: first_page.id.clone(),
            pages: vec![first_page],
            global_components: Vec::new(),
            settings: Map::new(),
        }
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn page_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == page_id)
    }

    /// The active page; falls back to the first page if the id is stale
    pub fn current_page(&self) -> Option<&Page> {
        self.page(&self.current_page_id).or_else(|| self.pages.first())
    }

    pub fn current_page_mut(&mut self) -> Option<&mut Page> {
        let index = self
            .pages
            .iter()
            .position(|p| p.id == self.current_page_id)
            .or(if self.pages.is_empty() { None } else { Some(0) })?;
        self.pages.get_mut(index)
    }

    pub fn global_component(&self, id: &str) -> Option<&GlobalComponent> {
        self.global_components.iter().find(|g| g.id == id)
    }

    /// Every id in use: pages, page nodes at all depths and master subtrees
    pub fn all_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        for page in &self.pages {
            ids.insert(page.id.clone());
            for node in &page.tree {
                ids.extend(node.subtree_ids());
            }
        }
        for master in &self.global_components {
            ids.insert(master.id.clone());
            for child in &master.children {
                ids.extend(child.subtree_ids());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_json_shape() {
        let node = ComponentNode::new("a", "Button")
            .with_name("Submit")
            .with_prop("label", json!("Go"));

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "Button");
        assert_eq!(value["name"], "Submit");
        assert_eq!(value["children"], json!([]));
        assert_eq!(value["collapsed"], false);
        assert!(value.get("isGlobalInstance").is_none());
    }

    #[test]
    fn test_instance_fields_round_trip() {
        let mut node = ComponentNode::new("a", "Card").with_collapsed(true);
        node.interactions.push(json!({ "trigger": "click", "action": { "navigate": "/home" } }));
        node.link_to_master("gc-1");

        let text = serde_json::to_string(&node).unwrap();
        assert!(text.contains("\"isGlobalInstance\":true"));
        assert!(text.contains("\"globalComponentId\":\"gc-1\""));

        let back: ComponentNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.instance_of(), Some("gc-1"));
    }

    #[test]
    fn test_minimal_node_deserializes() {
        let node: ComponentNode = serde_json::from_str(r#"{"id":"x","type":"Text"}"#).unwrap();
        assert!(node.children.is_empty());
        assert!(!node.collapsed);
        assert_eq!(node.instance_of(), None);
    }

    #[test]
    fn test_count_and_subtree_ids() {
        let node = ComponentNode::new("a", "Div")
            .with_child(ComponentNode::new("b", "Div").with_child(ComponentNode::new("c", "Text")))
            .with_child(ComponentNode::new("d", "Text"));

        assert_eq!(node.count(), 4);
        assert_eq!(node.subtree_ids(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_all_ids_spans_pages_and_masters() {
        let mut project = Project::new(
            "p",
            "Site",
            Page::new("page-1", "Home").with_tree(vec![ComponentNode::new("a", "Div")]),
        );
        project
            .pages
            .push(Page::new("page-2", "About").with_tree(vec![ComponentNode::new("b", "Div")]));
        project.global_components.push(GlobalComponent {
            id: "gc".to_string(),
            name: "Header".to_string(),
            node_type: "Div".to_string(),
            props: Props::new(),
            children: vec![ComponentNode::new("m", "Text")],
        });

        let ids = project.all_ids();
        for id in ["page-1", "page-2", "a", "b", "gc", "m"] {
            assert!(ids.contains(id), "missing {id}");
        }
    }
}
