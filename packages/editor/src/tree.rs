//! # Node Store
//!
//! Structural operations on a page tree.
//!
//! Every operation validates before it touches the tree, so an `Err`
//! always leaves the tree exactly as it was. Relocation (move, reorder,
//! group) relinks the existing subtree values and never clones them;
//! cloning (duplicate) goes through an [`IdAllocator`] so every copied
//! node gets a fresh id.

use crate::id_generator::IdAllocator;
use crate::mutations::MutationError;
use crate::node::{ComponentNode, Props, Tree};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a node sits: its parent (None = top level) and index among siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    pub parent_id: Option<String>,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    Before,
    After,
    Inside,
}

pub fn find_node<'a>(nodes: &'a [ComponentNode], id: &str) -> Option<&'a ComponentNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_node_mut<'a>(nodes: &'a mut [ComponentNode], id: &str) -> Option<&'a mut ComponentNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn locate(nodes: &[ComponentNode], id: &str) -> Option<NodeLocation> {
    locate_in(nodes, None, id)
}

fn locate_in(nodes: &[ComponentNode], parent_id: Option<&str>, id: &str) -> Option<NodeLocation> {
    for (index, node) in nodes.iter().enumerate() {
        if node.id == id {
            return Some(NodeLocation {
                parent_id: parent_id.map(str::to_string),
                index,
            });
        }
        if let Some(found) = locate_in(&node.children, Some(&node.id), id) {
            return Some(found);
        }
    }
    None
}

/// The node owning `id`, or None when `id` is top-level or missing
pub fn find_parent<'a>(nodes: &'a [ComponentNode], id: &str) -> Option<&'a ComponentNode> {
    let parent_id = locate(nodes, id)?.parent_id?;
    find_node(nodes, &parent_id)
}

/// Outer None: `id` is missing. Inner None: `id` is top-level.
pub fn find_parent_id(nodes: &[ComponentNode], id: &str) -> Option<Option<String>> {
    locate(nodes, id).map(|location| location.parent_id)
}

/// The list that owns children of `parent_id` (None = top level)
pub fn sibling_list_mut<'a>(
    tree: &'a mut Tree,
    parent_id: Option<&str>,
) -> Option<&'a mut Vec<ComponentNode>> {
    match parent_id {
        None => Some(tree),
        Some(id) => find_node_mut(tree, id).map(|node| &mut node.children),
    }
}

pub fn contains(nodes: &[ComponentNode], id: &str) -> bool {
    find_node(nodes, id).is_some()
}

/// True if `id` lies strictly below `ancestor_id`
pub fn is_descendant(nodes: &[ComponentNode], ancestor_id: &str, id: &str) -> bool {
    find_node(nodes, ancestor_id)
        .map(|ancestor| contains(&ancestor.children, id))
        .unwrap_or(false)
}

pub fn collect_ids(nodes: &[ComponentNode]) -> Vec<String> {
    nodes.iter().flat_map(ComponentNode::subtree_ids).collect()
}

pub fn count_nodes(nodes: &[ComponentNode]) -> usize {
    nodes.iter().map(ComponentNode::count).sum()
}

/// Ids from the top-level ancestor down to the direct parent of `id`
pub fn ancestors_of(nodes: &[ComponentNode], id: &str) -> Vec<String> {
    let mut path = Vec::new();
    if path_to(nodes, id, &mut path) {
        path
    } else {
        Vec::new()
    }
}

fn path_to(nodes: &[ComponentNode], id: &str, path: &mut Vec<String>) -> bool {
    for node in nodes {
        if node.id == id {
            return true;
        }
        path.push(node.id.clone());
        if path_to(&node.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Insert an already id-assigned node
///
/// A parent that does not resolve falls back to top-level insertion; an
/// index past the end (or None) appends.
pub fn insert(
    tree: &mut Tree,
    node: ComponentNode,
    parent_id: Option<&str>,
    index: Option<usize>,
) -> Result<String, MutationError> {
    let incoming = node.subtree_ids();
    let mut seen = HashSet::new();
    for id in &incoming {
        if !seen.insert(id.as_str()) || contains(tree, id) {
            return Err(MutationError::DuplicateId(id.clone()));
        }
    }

    let id = node.id.clone();
    let target = match parent_id {
        Some(pid) if contains(tree, pid) => Some(pid),
        Some(pid) => {
            tracing::debug!("insert: parent {} not found, inserting {} at top level", pid, id);
            None
        }
        None => None,
    };

    let siblings = sibling_list_mut(tree, target)
        .ok_or_else(|| MutationError::ParentNotFound(target.unwrap_or_default().to_string()))?;
    let at = index.unwrap_or(siblings.len()).min(siblings.len());
    siblings.insert(at, node);

    Ok(id)
}

/// Remove a node and its whole subtree, returning the detached value
pub fn remove(tree: &mut Tree, id: &str) -> Result<ComponentNode, MutationError> {
    let location = locate(tree, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    let siblings = sibling_list_mut(tree, location.parent_id.as_deref())
        .ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    Ok(siblings.remove(location.index))
}

/// Shallow-merge `partial` into the props of every id that exists
///
/// Returns how many nodes actually changed. Fails if none of the ids
/// exist, or with `Unchanged` if every found node already held the values.
pub fn update_props(tree: &mut Tree, ids: &[String], partial: &Props) -> Result<usize, MutationError> {
    let mut found = 0;
    let mut updated = 0;
    for id in ids {
        if let Some(node) = find_node_mut(tree, id) {
            found += 1;
            let mut changed = false;
            for (key, value) in partial {
                if node.props.get(key) != Some(value) {
                    node.props.insert(key.clone(), value.clone());
                    changed = true;
                }
            }
            if changed {
                updated += 1;
            }
        }
    }

    if found == 0 {
        return Err(MutationError::NodeNotFound(ids.join(", ")));
    }
    if updated == 0 {
        return Err(MutationError::Unchanged);
    }
    Ok(updated)
}

pub fn rename(tree: &mut Tree, id: &str, name: Option<String>) -> Result<(), MutationError> {
    let node = find_node_mut(tree, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    if node.name == name {
        return Err(MutationError::Unchanged);
    }
    node.name = name;
    Ok(())
}

pub fn set_collapsed(tree: &mut Tree, id: &str, collapsed: bool) -> Result<(), MutationError> {
    let node = find_node_mut(tree, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    if node.collapsed == collapsed {
        return Err(MutationError::Unchanged);
    }
    node.collapsed = collapsed;
    Ok(())
}

/// Deep clone with a fresh id at every level
pub fn clone_with_fresh_ids(node: &ComponentNode, ids: &mut IdAllocator) -> ComponentNode {
    let mut copy = node.clone();
    reassign_ids(&mut copy, ids);
    copy
}

fn reassign_ids(node: &mut ComponentNode, ids: &mut IdAllocator) {
    node.id = ids.next_id();
    for child in &mut node.children {
        reassign_ids(child, ids);
    }
}

/// Clone `id` with fresh ids and place the clone right after it
pub fn duplicate(tree: &mut Tree, id: &str, ids: &mut IdAllocator) -> Result<String, MutationError> {
    let location = locate(tree, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    let original = find_node(tree, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    let copy = clone_with_fresh_ids(original, ids);
    let copy_id = copy.id.clone();

    let siblings = sibling_list_mut(tree, location.parent_id.as_deref())
        .ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    siblings.insert(location.index + 1, copy);

    Ok(copy_id)
}

/// Swap a node with its previous or next sibling
pub fn move_node(tree: &mut Tree, id: &str, direction: Direction) -> Result<(), MutationError> {
    let location = locate(tree, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;
    let siblings = sibling_list_mut(tree, location.parent_id.as_deref())
        .ok_or_else(|| MutationError::NodeNotFound(id.to_string()))?;

    let other = match direction {
        Direction::Up if location.index > 0 => location.index - 1,
        Direction::Down if location.index + 1 < siblings.len() => location.index + 1,
        _ => return Err(MutationError::Unchanged),
    };
    siblings.swap(location.index, other);
    Ok(())
}

/// Relocate `active_id` relative to `over_id`
///
/// Rejected when `over_id` is `active_id` or lies inside its subtree,
/// since either would make the node its own ancestor.
pub fn reorder(
    tree: &mut Tree,
    active_id: &str,
    over_id: &str,
    position: DropPosition,
) -> Result<(), MutationError> {
    if !contains(tree, active_id) {
        return Err(MutationError::NodeNotFound(active_id.to_string()));
    }
    if !contains(tree, over_id) {
        return Err(MutationError::NodeNotFound(over_id.to_string()));
    }
    if active_id == over_id || is_descendant(tree, active_id, over_id) {
        return Err(MutationError::CycleDetected);
    }

    let before = locate(tree, active_id);
    let moving = remove(tree, active_id)?;
    // over is outside the removed subtree, so it still resolves
    let over = locate(tree, over_id).ok_or_else(|| MutationError::NodeNotFound(over_id.to_string()))?;

    match position {
        DropPosition::Inside => {
            let target = find_node_mut(tree, over_id)
                .ok_or_else(|| MutationError::NodeNotFound(over_id.to_string()))?;
            target.children.push(moving);
        }
        DropPosition::Before | DropPosition::After => {
            let siblings = sibling_list_mut(tree, over.parent_id.as_deref())
                .ok_or_else(|| MutationError::NodeNotFound(over_id.to_string()))?;
            let at = if position == DropPosition::Before {
                over.index
            } else {
                over.index + 1
            };
            siblings.insert(at, moving);
        }
    }

    // dropped back where it was
    if locate(tree, active_id) == before {
        return Err(MutationError::Unchanged);
    }
    Ok(())
}

/// Wrap sibling nodes in a new container placed where the first member was
///
/// The container's children keep their sibling order, whatever order the
/// ids were given in.
pub fn group(
    tree: &mut Tree,
    ids: &[String],
    container: ComponentNode,
    root_id: &str,
) -> Result<String, MutationError> {
    let mut members: Vec<&str> = Vec::new();
    for id in ids {
        if !members.contains(&id.as_str()) {
            members.push(id);
        }
    }
    if members.len() < 2 {
        return Err(MutationError::InvalidStructure(
            "Grouping needs at least two nodes".to_string(),
        ));
    }
    if members.contains(&root_id) {
        return Err(MutationError::ReservedRoot(root_id.to_string()));
    }
    if contains(tree, &container.id) {
        return Err(MutationError::DuplicateId(container.id.clone()));
    }

    let locations = members
        .iter()
        .map(|id| locate(tree, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    let parent_id = locations[0].parent_id.clone();
    if locations.iter().any(|l| l.parent_id != parent_id) {
        return Err(MutationError::InvalidStructure(
            "Grouped nodes must share a parent".to_string(),
        ));
    }

    let siblings = sibling_list_mut(tree, parent_id.as_deref())
        .ok_or_else(|| MutationError::ParentNotFound(parent_id.clone().unwrap_or_default()))?;

    let first = siblings
        .iter()
        .position(|n| members.contains(&n.id.as_str()))
        .ok_or_else(|| MutationError::NodeNotFound(members[0].to_string()))?;

    let mut kept = Vec::with_capacity(siblings.len());
    let mut grouped = Vec::with_capacity(members.len());
    for node in siblings.drain(..) {
        if members.contains(&node.id.as_str()) {
            grouped.push(node);
        } else {
            kept.push(node);
        }
    }

    let mut container = container;
    container.children = grouped;
    let container_id = container.id.clone();
    kept.insert(first, container);
    *siblings = kept;

    Ok(container_id)
}

/// Expand every collapsed ancestor of `id`; returns true if any changed
pub fn expand_ancestors(tree: &mut Tree, id: &str) -> bool {
    let mut changed = false;
    for ancestor in ancestors_of(tree, id) {
        if let Some(node) = find_node_mut(tree, &ancestor) {
            if node.collapsed {
                node.collapsed = false;
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_generator::IdGenerator;
    use serde_json::json;

    fn leaf(id: &str) -> ComponentNode {
        ComponentNode::new(id, "Div")
    }

    /// [A[B, C], D]
    fn sample() -> Tree {
        vec![leaf("A").with_child(leaf("B")).with_child(leaf("C")), leaf("D")]
    }

    fn shape(nodes: &[ComponentNode]) -> String {
        nodes
            .iter()
            .map(|n| {
                if n.children.is_empty() {
                    n.id.clone()
                } else {
                    format!("{}[{}]", n.id, shape(&n.children))
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_find_and_locate() {
        let tree = sample();
        assert_eq!(find_node(&tree, "C").unwrap().id, "C");
        assert_eq!(find_parent(&tree, "C").unwrap().id, "A");
        assert!(find_parent(&tree, "D").is_none());
        assert_eq!(
            locate(&tree, "C"),
            Some(NodeLocation { parent_id: Some("A".to_string()), index: 1 })
        );
        assert_eq!(ancestors_of(&tree, "C"), vec!["A"]);
        assert!(locate(&tree, "Z").is_none());
        assert_eq!(find_parent_id(&tree, "D"), Some(None));
        assert_eq!(find_parent_id(&tree, "B"), Some(Some("A".to_string())));
        assert_eq!(find_parent_id(&tree, "Z"), None);
    }

    #[test]
    fn test_insert_falls_back_to_top_level() {
        let mut tree = sample();
        insert(&mut tree, leaf("E"), Some("missing"), None).unwrap();
        assert_eq!(shape(&tree), "A[B,C],D,E");

        insert(&mut tree, leaf("F"), Some("A"), Some(0)).unwrap();
        assert_eq!(shape(&tree), "A[F,B,C],D,E");

        insert(&mut tree, leaf("G"), Some("A"), Some(99)).unwrap();
        assert_eq!(shape(&tree), "A[F,B,C,G],D,E");
    }

    #[test]
    fn test_insert_rejects_existing_id() {
        let mut tree = sample();
        let result = insert(&mut tree, leaf("B"), None, None);
        assert_eq!(result, Err(MutationError::DuplicateId("B".to_string())));
        assert_eq!(shape(&tree), "A[B,C],D");
    }

    #[test]
    fn test_remove_takes_subtree() {
        let mut tree = sample();
        let removed = remove(&mut tree, "A").unwrap();
        assert_eq!(removed.count(), 3);
        assert_eq!(shape(&tree), "D");
        assert!(remove(&mut tree, "A").is_err());
    }

    #[test]
    fn test_update_props_batch_skips_missing() {
        let mut tree = sample();
        let mut partial = Props::new();
        partial.insert("color".to_string(), json!("red"));

        let ids = vec!["B".to_string(), "nope".to_string(), "D".to_string()];
        assert_eq!(update_props(&mut tree, &ids, &partial), Ok(2));
        assert_eq!(find_node(&tree, "B").unwrap().props["color"], json!("red"));
        assert_eq!(find_node(&tree, "D").unwrap().props["color"], json!("red"));

        let missing = vec!["nope".to_string()];
        assert!(update_props(&mut tree, &missing, &partial).is_err());
    }

    #[test]
    fn test_update_props_without_change_is_unchanged() {
        let mut tree = vec![leaf("A").with_prop("width", json!(10)), leaf("B")];
        let ids = vec!["A".to_string(), "B".to_string()];

        assert_eq!(update_props(&mut tree, &ids, &Props::new()), Err(MutationError::Unchanged));

        let mut same = Props::new();
        same.insert("width".to_string(), json!(10));
        assert_eq!(update_props(&mut tree, &ids[..1], &same), Err(MutationError::Unchanged));

        // only B picks up the value
        assert_eq!(update_props(&mut tree, &ids, &same), Ok(1));
        assert_eq!(find_node(&tree, "B").unwrap().props["width"], json!(10));
    }

    #[test]
    fn test_update_props_is_shallow_merge() {
        let mut tree = vec![leaf("A").with_prop("a", json!(1)).with_prop("style", json!({ "x": 1 }))];
        let mut partial = Props::new();
        partial.insert("style".to_string(), json!({ "y": 2 }));

        update_props(&mut tree, &["A".to_string()], &partial).unwrap();
        let props = &tree[0].props;
        assert_eq!(props["a"], json!(1));
        assert_eq!(props["style"], json!({ "y": 2 }));
    }

    #[test]
    fn test_duplicate_places_clone_after_original() {
        let mut tree = sample();
        let mut gen = IdGenerator::from_seed("n");
        let mut ids = IdAllocator::new(&mut gen, collect_ids(&tree).into_iter().collect());

        let copy_id = duplicate(&mut tree, "A", &mut ids).unwrap();
        assert_eq!(copy_id, "n-1");
        assert_eq!(shape(&tree), "A[B,C],n-1[n-2,n-3],D");
    }

    #[test]
    fn test_move_swaps_and_stops_at_boundary() {
        let mut tree = sample();
        move_node(&mut tree, "C", Direction::Up).unwrap();
        assert_eq!(shape(&tree), "A[C,B],D");
        assert_eq!(move_node(&mut tree, "C", Direction::Up), Err(MutationError::Unchanged));
        assert_eq!(move_node(&mut tree, "D", Direction::Down), Err(MutationError::Unchanged));
        move_node(&mut tree, "A", Direction::Down).unwrap();
        assert_eq!(shape(&tree), "D,A[C,B]");
    }

    #[test]
    fn test_reorder_after_reparents() {
        let mut tree = sample();
        reorder(&mut tree, "C", "D", DropPosition::After).unwrap();
        assert_eq!(shape(&tree), "A[B],D,C");

        // already there
        assert_eq!(reorder(&mut tree, "C", "D", DropPosition::After), Err(MutationError::Unchanged));
        assert_eq!(shape(&tree), "A[B],D,C");
    }

    #[test]
    fn test_reorder_before_and_inside() {
        let mut tree = sample();
        reorder(&mut tree, "D", "B", DropPosition::Before).unwrap();
        assert_eq!(shape(&tree), "A[D,B,C]");

        reorder(&mut tree, "C", "D", DropPosition::Inside).unwrap();
        assert_eq!(shape(&tree), "A[D[C],B]");
    }

    #[test]
    fn test_reorder_rejects_cycles() {
        let mut tree = sample();
        for position in [DropPosition::Before, DropPosition::After, DropPosition::Inside] {
            assert_eq!(reorder(&mut tree, "A", "B", position), Err(MutationError::CycleDetected));
            assert_eq!(reorder(&mut tree, "A", "A", position), Err(MutationError::CycleDetected));
        }
        assert_eq!(shape(&tree), "A[B,C],D");
    }

    #[test]
    fn test_group_preserves_sibling_order() {
        let mut tree = vec![leaf("A"), leaf("B"), leaf("C"), leaf("D")];
        let ids = vec!["D".to_string(), "B".to_string()];

        let id = group(&mut tree, &ids, leaf("G"), "root").unwrap();
        assert_eq!(id, "G");
        assert_eq!(shape(&tree), "A,G[B,D],C");
        assert_eq!(count_nodes(&tree), 5);
    }

    #[test]
    fn test_group_rejects_invalid_selection() {
        let mut tree = sample();
        let cross_parent = vec!["B".to_string(), "D".to_string()];
        assert!(group(&mut tree, &cross_parent, leaf("G"), "root").is_err());

        let single = vec!["B".to_string(), "B".to_string()];
        assert!(group(&mut tree, &single, leaf("G"), "root").is_err());

        let mut rooted = vec![leaf("root").with_child(leaf("x")), leaf("y")];
        let with_root = vec!["root".to_string(), "y".to_string()];
        assert_eq!(
            group(&mut rooted, &with_root, leaf("G"), "root"),
            Err(MutationError::ReservedRoot("root".to_string()))
        );
        assert_eq!(shape(&tree), "A[B,C],D");
    }

    #[test]
    fn test_expand_ancestors() {
        let mut tree = vec![leaf("A")
            .with_collapsed(true)
            .with_child(leaf("B").with_collapsed(true).with_child(leaf("C")))];

        assert!(expand_ancestors(&mut tree, "C"));
        assert!(!find_node(&tree, "A").unwrap().collapsed);
        assert!(!find_node(&tree, "B").unwrap().collapsed);
        assert!(!expand_ancestors(&mut tree, "C"));
    }
}
