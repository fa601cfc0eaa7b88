//! Whole-project invariant checks
//!
//! Cycles and shared ownership cannot be expressed by an owned tree, so a
//! repeated id is the only way a loaded document can break them.

use crate::node::{ComponentNode, Project};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The same id appears more than once among pages, nodes and masters
    DuplicateId { id: String, occurrences: usize },

    /// An instance links to a master that does not exist
    DanglingInstance {
        page_id: String,
        node_id: String,
        global_component_id: String,
    },

    /// A node is flagged as an instance but names no master
    InstanceMissingReference { page_id: String, node_id: String },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::DuplicateId { id, occurrences } => {
                write!(f, "id {} is used {} times", id, occurrences)
            }
            InvariantViolation::DanglingInstance {
                page_id,
                node_id,
                global_component_id,
            } => write!(
                f,
                "{} on page {} is an instance of missing global component {}",
                node_id, page_id, global_component_id
            ),
            InvariantViolation::InstanceMissingReference { page_id, node_id } => {
                write!(f, "{} on page {} is an instance without a global component", node_id, page_id)
            }
        }
    }
}

pub fn check_project(project: &Project) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut count = |id: &str| {
        let entry = seen.entry(id.to_string()).or_insert(0);
        if *entry == 0 {
            order.push(id.to_string());
        }
        *entry += 1;
    };
    for page in &project.pages {
        count(&page.id);
        for node in &page.tree {
            node.subtree_ids().iter().for_each(|id| count(id));
        }
    }
    for master in &project.global_components {
        count(&master.id);
        for child in &master.children {
            child.subtree_ids().iter().for_each(|id| count(id));
        }
    }
    for id in order {
        let occurrences = seen[&id];
        if occurrences > 1 {
            violations.push(InvariantViolation::DuplicateId { id, occurrences });
        }
    }

    let masters: HashSet<&str> = project.global_components.iter().map(|g| g.id.as_str()).collect();
    for page in &project.pages {
        for node in &page.tree {
            check_instances(node, &page.id, &masters, &mut violations);
        }
    }

    violations
}

fn check_instances(
    node: &ComponentNode,
    page_id: &str,
    masters: &HashSet<&str>,
    violations: &mut Vec<InvariantViolation>,
) {
    if node.is_global_instance {
        match node.global_component_id.as_deref() {
            None => violations.push(InvariantViolation::InstanceMissingReference {
                page_id: page_id.to_string(),
                node_id: node.id.clone(),
            }),
            Some(master) if !masters.contains(master) => {
                violations.push(InvariantViolation::DanglingInstance {
                    page_id: page_id.to_string(),
                    node_id: node.id.clone(),
                    global_component_id: master.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    for child in &node.children {
        check_instances(child, page_id, masters, violations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{GlobalComponent, Page};
    use crate::Props;

    fn project(tree: Vec<ComponentNode>) -> Project {
        Project::new("p", "Site", Page::new("home", "Home").with_tree(tree))
    }

    #[test]
    fn test_clean_project() {
        let project = project(vec![ComponentNode::new("a", "Div").with_child(ComponentNode::new("b", "Text"))]);
        assert!(check_project(&project).is_empty());
    }

    #[test]
    fn test_duplicate_ids_across_pages() {
        let mut project = project(vec![ComponentNode::new("a", "Div")]);
        project
            .pages
            .push(Page::new("about", "About").with_tree(vec![ComponentNode::new("a", "Div")]));

        assert_eq!(
            check_project(&project),
            vec![InvariantViolation::DuplicateId { id: "a".to_string(), occurrences: 2 }]
        );
    }

    #[test]
    fn test_repeated_page_id() {
        let mut project = project(vec![ComponentNode::new("a", "Div")]);
        project.pages.push(Page::new("home", "Home again"));
        project.pages.push(Page::new("b", "B").with_tree(vec![ComponentNode::new("home", "Div")]));

        assert_eq!(
            check_project(&project),
            vec![InvariantViolation::DuplicateId { id: "home".to_string(), occurrences: 3 }]
        );
    }

    #[test]
    fn test_instance_links() {
        let mut linked = ComponentNode::new("a", "Card");
        linked.link_to_master("gc-1");
        let mut dangling = ComponentNode::new("b", "Card");
        dangling.link_to_master("gc-gone");
        let mut bare = ComponentNode::new("c", "Card");
        bare.is_global_instance = true;

        let mut project = project(vec![linked, dangling, bare]);
        project.global_components.push(GlobalComponent {
            id: "gc-1".to_string(),
            name: "Card".to_string(),
            node_type: "Card".to_string(),
            props: Props::new(),
            children: Vec::new(),
        });

        let violations = check_project(&project);
        assert_eq!(violations.len(), 2);
        assert!(matches!(&violations[0], InvariantViolation::DanglingInstance { node_id, .. } if node_id == "b"));
        assert!(matches!(&violations[1], InvariantViolation::InstanceMissingReference { node_id, .. } if node_id == "c"));
    }
}
