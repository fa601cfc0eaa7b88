//! # Pageforge Editor
//!
//! Document and tree editing engine for the Pageforge page builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ UI layers: canvas, layer tree, inspector    │
//! └─────────────────────────────────────────────┘
//!                     ↓ operations
//! ┌─────────────────────────────────────────────┐
//! │ editor: Editor facade                       │
//! │  - Node store mutations (tree, mutations)   │
//! │  - Snapshot history with coalescing         │
//! │  - Selection, clipboard, drag projection    │
//! │  - Global components and cascades           │
//! └─────────────────────────────────────────────┘
//!                     ↓ snapshots
//! ┌─────────────────────────────────────────────┐
//! │ persistence: JSON storage, autosave worker  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Project is source of truth**: flattened rows and projections are derived views
//! 2. **Silent no-ops**: invalid structural requests change nothing and record nothing
//! 3. **Snapshot history**: every applied change can be undone exactly
//! 4. **Instances are snapshots**: editing a master never rewrites its instances
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pageforge_editor::{ComponentNode, DropPosition, Editor, EditorConfig};
//!
//! let mut editor = Editor::blank("site", "Site", EditorConfig::default());
//!
//! let hero = editor.create_node("Section");
//! editor.insert(hero, Some("root"), None);
//!
//! editor.reorder("hero-id", "footer-id", DropPosition::Before);
//! editor.undo();
//!
//! // Hand the latest state to a saver when something changed
//! if editor.take_dirty() {
//!     storage.save(editor.project())?;
//! }
//! ```

mod clipboard;
mod config;
mod editor;
mod errors;
mod history;
mod id_generator;
mod mutations;
mod node;
mod persistence;
mod project;
mod selection;
mod symbols;

pub mod projection;
pub mod tree;
pub mod validate;

#[cfg(feature = "autosave")]
mod autosave;

pub use clipboard::{Clipboard, ClipboardEntry};
pub use config::{EditorConfig, HistoryConfig, DEFAULT_CONFIG_NAME};
pub use editor::Editor;
pub use errors::EditorError;
pub use history::{DocumentSnapshot, History};
pub use id_generator::{get_project_seed, IdAllocator, IdGenerator};
pub use mutations::{Mutation, MutationContext, MutationError, MutationOutcome};
pub use node::{ComponentNode, GlobalComponent, Page, Project, Props, Tree};
pub use persistence::{from_json, to_json, JsonFileStorage, MemoryStorage, ProjectStorage};
pub use project::Workspace;
pub use projection::{DragSession, FlattenedNode, Projection};
pub use selection::Selection;
pub use symbols::{CascadeReport, InstanceCount, MasterSummary};
pub use tree::{Direction, DropPosition, NodeLocation};
pub use validate::{check_project, InvariantViolation};

#[cfg(feature = "autosave")]
pub use autosave::{AutosaveHandle, Autosaver, SaveReport};

/// Symbol registry functions for callers working on raw projects
pub mod symbol_ops {
    pub use crate::symbols::{
        count_instances, delete_master, detach, instantiate_master, list_masters, normalize_instances,
        promote, rename_master,
    };
}
