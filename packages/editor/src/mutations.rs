//! # Tree Mutations
//!
//! Structural edits on a page tree as serializable intent records.
//!
//! ## Mutation Semantics
//!
//! ### Insert
//! - Node arrives with its ids already assigned
//! - Missing parent falls back to top-level insertion
//!
//! ### Reorder
//! - Relinks the existing subtree, never copies it
//! - Fails if the drop target is the node itself or inside it
//!
//! ### Remove
//! - Removes node and all descendants
//!
//! ### Duplicate / Group
//! - Mint fresh ids through the context allocator
//!
//! A mutation that fails leaves the tree untouched. The engine turns those
//! failures into silent no-ops; callers working on raw trees get the reason.

use crate::id_generator::IdAllocator;
use crate::node::{ComponentNode, Props, Tree};
use crate::tree::{self, Direction, DropPosition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    Insert {
        node: ComponentNode,
        parent_id: Option<String>,
        index: Option<usize>,
    },

    Remove {
        node_id: String,
    },

    /// Shallow-merge props into every listed node
    UpdateProps {
        node_ids: Vec<String>,
        props: Props,
    },

    Rename {
        node_id: String,
        name: Option<String>,
    },

    SetCollapsed {
        node_id: String,
        collapsed: bool,
    },

    Duplicate {
        node_id: String,
    },

    Move {
        node_id: String,
        direction: Direction,
    },

    Reorder {
        active_id: String,
        over_id: String,
        position: DropPosition,
    },

    Group {
        node_ids: Vec<String>,
        container_type: String,
    },

    /// Swap in a whole new tree (drag commit, set_tree)
    ReplaceTree {
        tree: Tree,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Operation not allowed on reserved root: {0}")]
    ReservedRoot(String),

    #[error("Id already in use: {0}")]
    DuplicateId(String),

    #[error("Mutation would not change the document")]
    Unchanged,

    #[error("Clipboard is empty")]
    EmptyClipboard,

    #[error("Global component not found: {0}")]
    GlobalComponentNotFound(String),
}

/// Everything a mutation may need beyond the tree itself
pub struct MutationContext<'a> {
    pub ids: IdAllocator<'a>,
    pub root_id: &'a str,
}

/// Result of applying a mutation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOutcome {
    /// Node that should become the selection (insert, duplicate, group)
    pub select: Option<String>,
}

impl MutationOutcome {
    fn selecting(id: String) -> Self {
        Self { select: Some(id) }
    }
}

impl Mutation {
    /// Apply mutation to a tree with validation
    pub fn apply(
        &self,
        tree: &mut Tree,
        ctx: &mut MutationContext,
    ) -> Result<MutationOutcome, MutationError> {
        self.validate(tree)?;

        match self {
            Mutation::Insert { node, parent_id, index } => {
                // ids used on other pages or by masters are just as taken
                if let Some(id) = node.subtree_ids().into_iter().find(|id| ctx.ids.is_taken(id)) {
                    return Err(MutationError::DuplicateId(id));
                }
                let id = tree::insert(tree, node.clone(), parent_id.as_deref(), *index)?;
                ctx.ids.reserve(node.subtree_ids());
                Ok(MutationOutcome::selecting(id))
            }

            Mutation::Remove { node_id } => {
                tree::remove(tree, node_id)?;
                Ok(MutationOutcome::default())
            }

            Mutation::UpdateProps { node_ids, props } => {
                tree::update_props(tree, node_ids, props)?;
                Ok(MutationOutcome::default())
            }

            Mutation::Rename { node_id, name } => {
                tree::rename(tree, node_id, name.clone())?;
                Ok(MutationOutcome::default())
            }

            Mutation::SetCollapsed { node_id, collapsed } => {
                tree::set_collapsed(tree, node_id, *collapsed)?;
                Ok(MutationOutcome::default())
            }

            Mutation::Duplicate { node_id } => {
                let id = tree::duplicate(tree, node_id, &mut ctx.ids)?;
                Ok(MutationOutcome::selecting(id))
            }

            Mutation::Move { node_id, direction } => {
                tree::move_node(tree, node_id, *direction)?;
                Ok(MutationOutcome::default())
            }

            Mutation::Reorder { active_id, over_id, position } => {
                tree::reorder(tree, active_id, over_id, *position)?;
                Ok(MutationOutcome::default())
            }

            Mutation::Group { node_ids, container_type } => {
                let container = ComponentNode::new(ctx.ids.next_id(), container_type.clone());
                let id = tree::group(tree, node_ids, container, ctx.root_id)?;
                Ok(MutationOutcome::selecting(id))
            }

            Mutation::ReplaceTree { tree: replacement } => {
                if *tree == *replacement {
                    return Err(MutationError::Unchanged);
                }
                ctx.ids.reserve(tree::collect_ids(replacement));
                *tree = replacement.clone();
                Ok(MutationOutcome::default())
            }
        }
    }

    /// Validate without applying
    pub fn validate(&self, tree: &[ComponentNode]) -> Result<(), MutationError> {
        match self {
            Mutation::Insert { node, .. } => {
                if node.id.is_empty() {
                    return Err(MutationError::InvalidStructure("Node id is empty".to_string()));
                }
                Ok(())
            }

            Mutation::Remove { node_id }
            | Mutation::Rename { node_id, .. }
            | Mutation::SetCollapsed { node_id, .. }
            | Mutation::Duplicate { node_id }
            | Mutation::Move { node_id, .. } => {
                if tree::contains(tree, node_id) {
                    Ok(())
                } else {
                    Err(MutationError::NodeNotFound(node_id.clone()))
                }
            }

            Mutation::UpdateProps { node_ids, .. } => {
                if node_ids.iter().any(|id| tree::contains(tree, id)) {
                    Ok(())
                } else {
                    Err(MutationError::NodeNotFound(node_ids.join(", ")))
                }
            }

            Mutation::Reorder { active_id, over_id, .. } => {
                if !tree::contains(tree, active_id) {
                    return Err(MutationError::NodeNotFound(active_id.clone()));
                }
                if !tree::contains(tree, over_id) {
                    return Err(MutationError::NodeNotFound(over_id.clone()));
                }
                if active_id == over_id || tree::is_descendant(tree, active_id, over_id) {
                    return Err(MutationError::CycleDetected);
                }
                Ok(())
            }

            Mutation::Group { container_type, .. } => {
                if container_type.is_empty() {
                    return Err(MutationError::InvalidStructure(
                        "Group container type is empty".to_string(),
                    ));
                }
                Ok(())
            }

            Mutation::ReplaceTree { tree: replacement } => {
                let mut seen = HashSet::new();
                for id in tree::collect_ids(replacement) {
                    if !seen.insert(id.clone()) {
                        return Err(MutationError::DuplicateId(id));
                    }
                }
                Ok(())
            }
        }
    }

    /// Short name used for history descriptions and logs
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::Insert { .. } => "insert",
            Mutation::Remove { .. } => "remove",
            Mutation::UpdateProps { .. } => "update props",
            Mutation::Rename { .. } => "rename",
            Mutation::SetCollapsed { .. } => "set collapsed",
            Mutation::Duplicate { .. } => "duplicate",
            Mutation::Move { .. } => "move",
            Mutation::Reorder { .. } => "reorder",
            Mutation::Group { .. } => "group",
            Mutation::ReplaceTree { .. } => "replace tree",
        }
    }

    /// Identity of a prop edit for history coalescing
    ///
    /// Two edits with the same key touch the same props on the same nodes.
    /// Only prop updates coalesce.
    pub fn coalesce_key(&self) -> Option<String> {
        match self {
            Mutation::UpdateProps { node_ids, props } => {
                let mut ids: Vec<&str> = node_ids.iter().map(String::as_str).collect();
                ids.sort_unstable();
                ids.dedup();
                let mut keys: Vec<&str> = props.keys().map(String::as_str).collect();
                keys.sort_unstable();
                Some(format!("{}|{}", ids.join(","), keys.join(",")))
            }
            _ => None,
        }
    }
}
