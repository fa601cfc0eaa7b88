//! # Undo/Redo History
//!
//! Tracks document snapshots and enables undo/redo operations.
//!
//! ## Design
//!
//! - Each mutation records the pre-mutation snapshot before being applied
//! - Undo restores the snapshot and moves the left state to the redo stack
//! - Redo restores the undone state
//! - New mutations clear the redo stack
//! - Batches group several mutations into one undo step
//!
//! ## Coalescing
//!
//! Continuous prop edits (dragging a numeric control) would otherwise
//! flood the stack. An edit coalesces into the previous entry when:
//!
//! - both carry the same coalesce key (same nodes, same prop names)
//! - it arrives within `coalesce_window` of the previous edit of the run
//! - no undo, redo, seal or other mutation happened in between
//!
//! The run keeps the snapshot taken before its first edit, so a single
//! undo returns to the state before the whole run. Every coalesced edit
//! restarts the window. A zero window disables coalescing.

use crate::node::{GlobalComponent, Page, Project};
use std::time::{Duration, Instant};

/// Everything undo/redo restores: pages, masters and the active page
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub pages: Vec<Page>,
    pub global_components: Vec<GlobalComponent>,
    pub current_page_id: String,
}

impl DocumentSnapshot {
    pub fn capture(project: &Project) -> Self {
        Self {
            pages: project.pages.clone(),
            global_components: project.global_components.clone(),
            current_page_id: project.current_page_id.clone(),
        }
    }

    pub fn restore_into(self, project: &mut Project) {
        project.pages = self.pages;
        project.global_components = self.global_components;
        project.current_page_id = self.current_page_id;
    }
}

/// One undo step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub snapshot: DocumentSnapshot,
    pub description: Option<String>,
    coalesce_key: Option<String>,
    last_edit_at: Instant,
}

#[derive(Debug)]
struct PendingBatch {
    depth: usize,
    snapshot: Option<DocumentSnapshot>,
    description: Option<String>,
}

/// Undo/redo stack for document editing
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    coalesce_window: Duration,

    /// Set when the top entry must not absorb further edits
    sealed: bool,

    batch: Option<PendingBatch>,
}

impl History {
    /// Create a history with default max levels (100) and a 500ms window
    pub fn new() -> Self {
        Self::with_limits(100, Duration::from_millis(500))
    }

    pub fn with_limits(max_levels: usize, coalesce_window: Duration) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            coalesce_window,
            sealed: false,
            batch: None,
        }
    }

    /// Record the snapshot taken before a mutation
    ///
    /// Returns true if a new undo entry was pushed, false if the edit was
    /// absorbed by a batch or by the current coalescing run.
    pub fn record(
        &mut self,
        snapshot: DocumentSnapshot,
        description: &str,
        coalesce_key: Option<String>,
        now: Instant,
    ) -> bool {
        if let Some(batch) = &mut self.batch {
            if batch.snapshot.is_none() {
                batch.snapshot = Some(snapshot);
                if batch.description.is_none() {
                    batch.description = Some(description.to_string());
                }
            }
            return false;
        }

        if self.try_coalesce(coalesce_key.as_deref(), now) {
            self.redo_stack.clear();
            return false;
        }

        self.push_entry(HistoryEntry {
            snapshot,
            description: Some(description.to_string()),
            coalesce_key,
            last_edit_at: now,
        });
        true
    }

    fn try_coalesce(&mut self, key: Option<&str>, now: Instant) -> bool {
        if self.sealed || self.coalesce_window.is_zero() {
            return false;
        }
        let Some(key) = key else {
            return false;
        };
        match self.undo_stack.last_mut() {
            Some(last)
                if last.coalesce_key.as_deref() == Some(key)
                    && now.saturating_duration_since(last.last_edit_at) <= self.coalesce_window =>
            {
                last.last_edit_at = now;
                true
            }
            _ => false,
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        self.sealed = false;

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New action invalidates the redo future
        self.redo_stack.clear();
    }

    /// Start a batch; everything recorded until the matching `end_batch`
    /// becomes one undo step. Batches nest.
    pub fn begin_batch(&mut self, description: Option<&str>) {
        match &mut self.batch {
            Some(batch) => batch.depth += 1,
            None => {
                self.batch = Some(PendingBatch {
                    depth: 1,
                    snapshot: None,
                    description: description.map(str::to_string),
                })
            }
        }
    }

    /// Close the current batch, pushing one entry if anything was recorded
    pub fn end_batch(&mut self) {
        let Some(batch) = &mut self.batch else {
            return;
        };
        batch.depth -= 1;
        if batch.depth > 0 {
            return;
        }
        if let Some(PendingBatch {
            snapshot: Some(snapshot),
            description,
            ..
        }) = self.batch.take()
        {
            self.push_entry(HistoryEntry {
                snapshot,
                description,
                coalesce_key: None,
                last_edit_at: Instant::now(),
            });
            self.sealed = true;
        }
    }

    /// Drop the open batch without recording it
    pub fn abort_batch(&mut self) -> Option<DocumentSnapshot> {
        self.batch.take().and_then(|batch| batch.snapshot)
    }

    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// End the current coalescing run
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Step back, returning the snapshot to restore
    pub fn undo(&mut self, current: DocumentSnapshot) -> Option<DocumentSnapshot> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(HistoryEntry {
            snapshot: current,
            description: entry.description.clone(),
            coalesce_key: None,
            last_edit_at: entry.last_edit_at,
        });
        self.sealed = true;
        Some(entry.snapshot)
    }

    /// Step forward again, returning the snapshot to restore
    pub fn redo(&mut self, current: DocumentSnapshot) -> Option<DocumentSnapshot> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(HistoryEntry {
            snapshot: current,
            description: entry.description.clone(),
            coalesce_key: None,
            last_edit_at: entry.last_edit_at,
        });
        self.sealed = true;
        Some(entry.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
        self.sealed = false;
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
