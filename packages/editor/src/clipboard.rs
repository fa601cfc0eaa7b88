//! # Clipboard
//!
//! Single-slot buffer for the most recently copied or cut subtree.
//!
//! The buffer holds a deep value copy with its original ids. Those ids are
//! never inserted back: every paste mints fresh ids at every level, so
//! repeated pastes (or pastes into another document) stay id-disjoint.

use crate::id_generator::IdAllocator;
use crate::node::ComponentNode;
use crate::tree;

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    pub node: ComponentNode,

    /// Parent the node was copied from (None = top level)
    pub source_parent_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    entry: Option<ClipboardEntry>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, node: &ComponentNode, source_parent_id: Option<String>) {
        self.entry = Some(ClipboardEntry {
            node: node.clone(),
            source_parent_id,
        });
    }

    pub fn can_paste(&self) -> bool {
        self.entry.is_some()
    }

    pub fn entry(&self) -> Option<&ClipboardEntry> {
        self.entry.as_ref()
    }

    /// Fresh-id clone of the buffer plus the parent it came from
    pub fn instantiate(&self, ids: &mut IdAllocator) -> Option<(ComponentNode, Option<String>)> {
        let entry = self.entry.as_ref()?;
        let node = tree::clone_with_fresh_ids(&entry.node, ids);
        Some((node, entry.source_parent_id.clone()))
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
