//! # Flatten / Projection
//!
//! Tree ⇄ flat-list conversion and drag-reparent target resolution.
//!
//! ```text
//! tree ──flatten──▶ [row{node, depth, parent}] ──build_tree──▶ tree
//!                          │
//!        drag move ──get_projection──▶ {depth, parent}   (preview only)
//!        drag end  ──relocate──▶ build_tree ──▶ one ReplaceTree mutation
//! ```
//!
//! Rows carry the node with its children stripped; ownership is rebuilt
//! from `parent_id` alone, so the depth of a row is informational once a
//! list has been relocated.

use crate::mutations::MutationError;
use crate::node::{ComponentNode, Tree};
use crate::tree;
use std::collections::{HashMap, HashSet};

/// One row of a flattened tree
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedNode {
    /// The node without its children
    pub node: ComponentNode,
    pub depth: usize,
    pub parent_id: Option<String>,
    /// Position among its siblings
    pub index: usize,
}

impl FlattenedNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }
}

/// Where a dragged row would land
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub depth: usize,
    pub max_depth: usize,
    pub min_depth: usize,
    pub parent_id: Option<String>,
}

/// Pre-order rows with depth (top level = 0) and parent id
pub fn flatten(tree: &[ComponentNode]) -> Vec<FlattenedNode> {
    let mut rows = Vec::new();
    flatten_into(tree, None, 0, &mut rows);
    rows
}

fn flatten_into(nodes: &[ComponentNode], parent_id: Option<&str>, depth: usize, rows: &mut Vec<FlattenedNode>) {
    for (index, node) in nodes.iter().enumerate() {
        let mut row = node.clone();
        row.children = Vec::new();
        rows.push(FlattenedNode {
            node: row,
            depth,
            parent_id: parent_id.map(str::to_string),
            index,
        });
        flatten_into(&node.children, Some(&node.id), depth + 1, rows);
    }
}

/// Drop every transitive descendant of `excluded_ids`
///
/// One left-to-right pass: pre-order guarantees a parent row comes before
/// its children, so each dropped row joins the excluded set in time to
/// drop its own children.
pub fn remove_children_of(rows: &[FlattenedNode], excluded_ids: &[String]) -> Vec<FlattenedNode> {
    let mut excluded: HashSet<&str> = excluded_ids.iter().map(String::as_str).collect();
    let mut kept = Vec::with_capacity(rows.len());

    for row in rows {
        match row.parent_id.as_deref() {
            Some(parent) if excluded.contains(parent) => {
                excluded.insert(row.id());
            }
            _ => kept.push(row.clone()),
        }
    }
    kept
}

/// Ids of collapsed nodes in the tree
pub fn collapsed_ids(tree: &[ComponentNode]) -> Vec<String> {
    flatten(tree)
        .into_iter()
        .filter(|row| row.node.collapsed)
        .map(|row| row.node.id)
        .collect()
}

/// Rows the user can see: depth-first, collapsed subtrees hidden
pub fn visible_rows(tree: &[ComponentNode]) -> Vec<FlattenedNode> {
    remove_children_of(&flatten(tree), &collapsed_ids(tree))
}

pub fn visible_ids(tree: &[ComponentNode]) -> Vec<String> {
    visible_rows(tree).into_iter().map(|row| row.node.id).collect()
}

/// Depth and parent for `active_id` hovering the row of `over_id`
///
/// The candidate depth is `round(over.depth + offset / indent)`, clamped to
/// `[0, over.depth + 1]`. When a row hovers itself the row above it is the
/// reference, since a node cannot nest inside itself.
pub fn get_projection(
    rows: &[FlattenedNode],
    active_id: &str,
    over_id: &str,
    horizontal_offset: f64,
    indent_unit: f64,
) -> Option<Projection> {
    let over_index = rows.iter().position(|row| row.id() == over_id)?;
    let over = &rows[over_index];

    let drag_depth = if indent_unit > 0.0 {
        horizontal_offset / indent_unit
    } else {
        0.0
    };
    let projected = (over.depth as f64 + drag_depth).round();

    // row the dragged node would sit right after
    let reference = if over_id == active_id {
        over_index.checked_sub(1)
    } else {
        Some(over_index)
    };

    let max_depth = reference.map(|i| rows[i].depth + 1).unwrap_or(0);
    let min_depth = 0;
    let depth = projected.clamp(min_depth as f64, max_depth as f64) as usize;

    let parent_id = match reference {
        None => None,
        Some(_) if depth == 0 => None,
        Some(i) => resolve_parent(rows, active_id, i, depth),
    };

    Some(Projection {
        depth,
        max_depth,
        min_depth,
        parent_id,
    })
}

fn resolve_parent(rows: &[FlattenedNode], active_id: &str, reference: usize, depth: usize) -> Option<String> {
    let row = &rows[reference];
    if depth == row.depth + 1 {
        return Some(row.id().to_string());
    }
    if depth == row.depth {
        return row.parent_id.clone();
    }
    rows[..reference]
        .iter()
        .rev()
        .filter(|candidate| candidate.id() != active_id)
        .find(|candidate| candidate.depth + 1 == depth)
        .map(|candidate| candidate.id().to_string())
}

/// Rebuild nested children from rows
///
/// Rows whose parent does not resolve are kept as top-level nodes. Sibling
/// order follows row order.
pub fn build_tree(rows: &[FlattenedNode]) -> Tree {
    let ids: HashSet<&str> = rows.iter().map(FlattenedNode::id).collect();
    let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        match row.parent_id.as_deref() {
            Some(parent) if parent != row.id() && ids.contains(parent) => {
                children.entry(parent).or_default().push(i);
            }
            Some(parent) => {
                tracing::warn!(
                    "build_tree: parent {} of {} does not resolve, keeping it at top level",
                    parent,
                    row.id()
                );
                roots.push(i);
            }
            None => roots.push(i),
        }
    }

    let mut visited = vec![false; rows.len()];
    let mut tree: Tree = roots
        .into_iter()
        .map(|i| assemble(i, rows, &children, &mut visited))
        .collect();

    // parent links that loop back on themselves never reach a root
    for i in 0..rows.len() {
        if !visited[i] {
            tracing::warn!("build_tree: {} is unreachable from the top level, keeping it there", rows[i].id());
            let node = assemble(i, rows, &children, &mut visited);
            tree.push(node);
        }
    }
    tree
}

fn assemble(
    i: usize,
    rows: &[FlattenedNode],
    children: &HashMap<&str, Vec<usize>>,
    visited: &mut [bool],
) -> ComponentNode {
    visited[i] = true;
    let mut node = rows[i].node.clone();
    node.children = Vec::new();
    if let Some(child_rows) = children.get(rows[i].id()) {
        for &child in child_rows {
            if !visited[child] {
                node.children.push(assemble(child, rows, children, visited));
            }
        }
    }
    node
}

/// Move the active row to the over row's slot and give it the projected parent
///
/// Array-move semantics: the row ends up before `over` when it came from
/// below and after it when it came from above.
pub fn relocate(
    rows: &[FlattenedNode],
    active_id: &str,
    over_id: &str,
    projection: &Projection,
) -> Option<Vec<FlattenedNode>> {
    let from = rows.iter().position(|row| row.id() == active_id)?;
    let to = rows.iter().position(|row| row.id() == over_id)?;

    let mut moved = rows.to_vec();
    let mut row = moved.remove(from);
    row.depth = projection.depth;
    row.parent_id = projection.parent_id.clone();
    moved.insert(to, row);
    Some(moved)
}

/// Transient state of an in-flight drag
///
/// Nothing here touches the document. Dropping the session cancels the
/// drag; only [`DragSession::commit`] produces a new tree.
#[derive(Debug, Clone)]
pub struct DragSession {
    active_id: String,
    over_id: Option<String>,
    horizontal_offset: f64,
    projection: Option<Projection>,
    /// Visible rows minus the dragged subtree, fixed for the whole drag
    rows: Vec<FlattenedNode>,
}

impl DragSession {
    pub fn begin(tree: &[ComponentNode], active_id: &str) -> Option<Self> {
        if !tree::contains(tree, active_id) {
            return None;
        }
        let mut excluded = collapsed_ids(tree);
        excluded.push(active_id.to_string());
        let rows = remove_children_of(&flatten(tree), &excluded);

        Some(Self {
            active_id: active_id.to_string(),
            over_id: None,
            horizontal_offset: 0.0,
            projection: None,
            rows,
        })
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn over_id(&self) -> Option<&str> {
        self.over_id.as_deref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    /// Rows a renderer should draw while dragging
    pub fn rows(&self) -> &[FlattenedNode] {
        &self.rows
    }

    /// Recompute the preview for a pointer move
    pub fn update(&mut self, over_id: &str, horizontal_offset: f64, indent_unit: f64) -> Option<&Projection> {
        self.over_id = Some(over_id.to_string());
        self.horizontal_offset = horizontal_offset;
        self.projection = get_projection(&self.rows, &self.active_id, over_id, horizontal_offset, indent_unit);
        self.projection.as_ref()
    }

    /// Produce the tree after the drop
    pub fn commit(&self, tree: &[ComponentNode]) -> Result<Tree, MutationError> {
        let over_id = self.over_id.as_deref().ok_or(MutationError::Unchanged)?;
        let projection = self.projection.as_ref().ok_or(MutationError::Unchanged)?;

        if !tree::contains(tree, &self.active_id) {
            return Err(MutationError::NodeNotFound(self.active_id.clone()));
        }
        if let Some(parent) = projection.parent_id.as_deref() {
            if parent == self.active_id || tree::is_descendant(tree, &self.active_id, parent) {
                return Err(MutationError::CycleDetected);
            }
            if !tree::contains(tree, parent) {
                return Err(MutationError::ParentNotFound(parent.to_string()));
            }
        }

        let rows = flatten(tree);
        let moved = relocate(&rows, &self.active_id, over_id, projection)
            .ok_or_else(|| MutationError::NodeNotFound(over_id.to_string()))?;
        let rebuilt = build_tree(&moved);

        if rebuilt.as_slice() == tree {
            return Err(MutationError::Unchanged);
        }
        Ok(rebuilt)
    }
}
