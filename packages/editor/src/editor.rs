//! # Editor Engine
//!
//! The stateful service UI layers talk to. One `Editor` owns one project
//! together with its history, selection, clipboard and in-flight drag,
//! all created with the document and dropped with it.
//!
//! ## Lifecycle
//!
//! ```text
//! gesture → Editor op → Mutation::apply → History::record → version++ / dirty
//!                ↘ rejected → no-op (logged, nothing recorded)
//! ```
//!
//! Structural operations never fail loudly: a missing node, a cycle, an
//! invalid group are all silent no-ops, reported only through the return
//! value (`false` / `None`). Page container operations return errors.

use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::history::{DocumentSnapshot, History};
use crate::id_generator::{IdAllocator, IdGenerator};
use crate::mutations::{Mutation, MutationContext, MutationError, MutationOutcome};
use crate::node::{ComponentNode, Page, Project, Props};
use crate::persistence::ProjectStorage;
use crate::projection::{self, DragSession, Projection};
use crate::selection::Selection;
use crate::symbols::{self, CascadeReport, InstanceCount, MasterSummary};
use crate::tree::{self, Direction, DropPosition};
use crate::EditorError;
use std::collections::HashSet;
use std::time::Instant;

pub struct Editor {
    project: Project,
    config: EditorConfig,
    history: History,
    selection: Selection,
    clipboard: Clipboard,
    ids: IdGenerator,
    drag: Option<DragSession>,

    /// Increments on each applied change
    version: u64,

    /// Set by every applied change, cleared by `take_dirty`
    dirty: bool,
}

impl Editor {
    /// Open a project; dangling instance links are repaired on the way in
    pub fn new(mut project: Project, config: EditorConfig) -> Self {
        let repaired = symbols::normalize_instances(&mut project);
        let ids = IdGenerator::new(&project.id);
        tracing::info!(
            "opened project {} with {} page(s), {} global component(s)",
            project.id,
            project.pages.len(),
            project.global_components.len()
        );

        Self {
            history: History::with_limits(config.history.max_levels, config.coalesce_window()),
            selection: Selection::new(config.root_id.clone()),
            clipboard: Clipboard::new(),
            ids,
            drag: None,
            version: 0,
            dirty: repaired > 0,
            project,
            config,
        }
    }

    /// Project with one page holding the reserved root container
    ///
    /// The page id comes from the editor's own generator, so later ids
    /// continue after it.
    pub fn blank(project_id: &str, name: &str, config: EditorConfig) -> Self {
        let mut ids = IdGenerator::new(project_id);
        let page = Page::new(ids.new_id(), "Page 1")
            .with_tree(vec![ComponentNode::new(config.root_id.clone(), config.group_type.clone())]);
        let mut editor = Self::new(Project::new(project_id, name, page), config);
        editor.ids = ids;
        editor
    }

    pub fn open(storage: &dyn ProjectStorage, project_id: &str, config: EditorConfig) -> Result<Self, EditorError> {
        Ok(Self::new(storage.load(project_id)?, config))
    }

    /// Swap in another document; history, selection and drag start over
    pub fn load(&mut self, project: Project) {
        let config = self.config.clone();
        let clipboard = std::mem::take(&mut self.clipboard);
        *self = Self::new(project, config);
        self.clipboard = clipboard;
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, reporting whether it was set
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Owned copy of the latest committed state, for savers and readers
    pub fn snapshot(&self) -> Project {
        self.project.clone()
    }

    pub fn save(&mut self, storage: &dyn ProjectStorage) -> Result<(), EditorError> {
        storage.save(&self.project)?;
        self.dirty = false;
        Ok(())
    }

    /// Push the current state to the autosave worker if anything changed
    #[cfg(feature = "autosave")]
    pub fn request_autosave(&mut self, handle: &crate::autosave::AutosaveHandle) -> Result<bool, EditorError> {
        if !self.take_dirty() {
            return Ok(false);
        }
        if let Err(e) = handle.request(self.project.clone(), self.version) {
            self.dirty = true;
            return Err(e);
        }
        Ok(true)
    }

    fn touch(&mut self) {
        self.version += 1;
        self.dirty = true;
    }

    fn allocator(&mut self) -> IdAllocator<'_> {
        let taken = self.project.all_ids();
        IdAllocator::new(&mut self.ids, taken)
    }

    // ---------------------------------------------------------------
    // Tree access
    // ---------------------------------------------------------------

    /// Top-level nodes of the current page
    pub fn get_tree(&self) -> &[ComponentNode] {
        self.project
            .current_page()
            .map(|page| page.tree.as_slice())
            .unwrap_or(&[])
    }

    pub fn current_page_id(&self) -> Option<&str> {
        self.project.current_page().map(|page| page.id.as_str())
    }

    /// Replace the current page's tree as one undoable step
    ///
    /// Rejected if the new tree repeats an id or uses one that names a
    /// page or lives on another page or in a master.
    pub fn set_tree(&mut self, tree: Vec<ComponentNode>) -> bool {
        let current = self.current_page_id().map(str::to_string);
        let mut elsewhere: HashSet<String> = HashSet::new();
        for page in &self.project.pages {
            elsewhere.insert(page.id.clone());
            if Some(&page.id) != current.as_ref() {
                elsewhere.extend(tree::collect_ids(&page.tree));
            }
        }
        for master in &self.project.global_components {
            elsewhere.insert(master.id.clone());
            elsewhere.extend(tree::collect_ids(&master.children));
        }
        if let Some(clash) = tree::collect_ids(&tree).into_iter().find(|id| elsewhere.contains(id)) {
            tracing::debug!("set_tree rejected: {}", MutationError::DuplicateId(clash));
            return false;
        }

        self.commit(Mutation::ReplaceTree { tree }, None).is_some()
    }

    pub fn get_node_by_id(&self, id: &str) -> Option<&ComponentNode> {
        tree::find_node(self.get_tree(), id)
    }

    pub fn get_parent_by_id(&self, id: &str) -> Option<&ComponentNode> {
        tree::find_parent(self.get_tree(), id)
    }

    /// A node with a fresh project-unique id, not yet inserted
    pub fn create_node(&mut self, node_type: &str) -> ComponentNode {
        let id = self.allocator().next_id();
        ComponentNode::new(id, node_type)
    }

    // ---------------------------------------------------------------
    // Node store
    // ---------------------------------------------------------------

    /// Apply a tree mutation to the current page through history
    fn commit(&mut self, mutation: Mutation, label: Option<&str>) -> Option<MutationOutcome> {
        let before = DocumentSnapshot::capture(&self.project);
        let taken = self.project.all_ids();
        let page = self.project.current_page_mut()?;
        let mut ctx = MutationContext {
            ids: IdAllocator::new(&mut self.ids, taken),
            root_id: &self.config.root_id,
        };

        match mutation.apply(&mut page.tree, &mut ctx) {
            Ok(outcome) => {
                let label = label.unwrap_or_else(|| mutation.label());
                self.history
                    .record(before, label, mutation.coalesce_key(), Instant::now());
                self.touch();
                self.prune_selection();
                if let Some(id) = &outcome.select {
                    self.select(id);
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::debug!("{} rejected: {}", mutation.label(), e);
                before.restore_into(&mut self.project);
                None
            }
        }
    }

    /// Run a project-wide change through history; failures roll back
    fn commit_project<T>(
        &mut self,
        label: &str,
        change: impl FnOnce(&mut Project, &mut IdAllocator) -> Result<T, MutationError>,
    ) -> Option<T> {
        let before = DocumentSnapshot::capture(&self.project);
        let taken = self.project.all_ids();
        let mut ids = IdAllocator::new(&mut self.ids, taken);

        match change(&mut self.project, &mut ids) {
            Ok(value) => {
                self.history.record(before, label, None, Instant::now());
                self.touch();
                self.prune_selection();
                Some(value)
            }
            Err(e) => {
                tracing::debug!("{} rejected: {}", label, e);
                before.restore_into(&mut self.project);
                None
            }
        }
    }

    /// Insert an id-assigned node; it becomes the selection
    pub fn insert(&mut self, node: ComponentNode, parent_id: Option<&str>, index: Option<usize>) -> Option<String> {
        let mutation = Mutation::Insert {
            node,
            parent_id: parent_id.map(str::to_string),
            index,
        };
        self.commit(mutation, None)?.select
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.commit(Mutation::Remove { node_id: id.to_string() }, None).is_some()
    }

    pub fn update_props(&mut self, id: &str, partial: Props) -> bool {
        self.update_props_batch(&[id.to_string()], partial)
    }

    /// Same partial props applied to every id (multi-selection edits)
    pub fn update_props_batch(&mut self, ids: &[String], partial: Props) -> bool {
        let mutation = Mutation::UpdateProps {
            node_ids: ids.to_vec(),
            props: partial,
        };
        self.commit(mutation, None).is_some()
    }

    pub fn rename(&mut self, id: &str, name: Option<&str>) -> bool {
        let mutation = Mutation::Rename {
            node_id: id.to_string(),
            name: name.map(str::to_string),
        };
        self.commit(mutation, None).is_some()
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> bool {
        let mutation = Mutation::SetCollapsed {
            node_id: id.to_string(),
            collapsed,
        };
        self.commit(mutation, None).is_some()
    }

    /// Clone a subtree next to the original and select the clone
    pub fn duplicate(&mut self, id: &str) -> Option<String> {
        self.commit(Mutation::Duplicate { node_id: id.to_string() }, None)?
            .select
    }

    pub fn move_node(&mut self, id: &str, direction: Direction) -> bool {
        let mutation = Mutation::Move {
            node_id: id.to_string(),
            direction,
        };
        self.commit(mutation, None).is_some()
    }

    pub fn reorder(&mut self, active_id: &str, over_id: &str, position: DropPosition) -> bool {
        let mutation = Mutation::Reorder {
            active_id: active_id.to_string(),
            over_id: over_id.to_string(),
            position,
        };
        self.commit(mutation, None).is_some()
    }

    /// Wrap sibling nodes in a new container; returns the container id
    pub fn group(&mut self, ids: &[String]) -> Option<String> {
        let mutation = Mutation::Group {
            node_ids: ids.to_vec(),
            container_type: self.config.group_type.clone(),
        };
        self.commit(mutation, None)?.select
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let current = DocumentSnapshot::capture(&self.project);
        match self.history.undo(current) {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = DocumentSnapshot::capture(&self.project);
        match self.history.redo(current) {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: DocumentSnapshot) {
        snapshot.restore_into(&mut self.project);
        self.drag = None;
        self.touch();
        self.prune_selection();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// End the current prop-edit run (e.g. on pointer release)
    pub fn seal_history(&mut self) {
        self.history.seal();
    }

    /// Run several operations as one undo step
    pub fn batch<T>(&mut self, description: &str, ops: impl FnOnce(&mut Self) -> T) -> T {
        self.history.begin_batch(Some(description));
        let result = ops(self);
        self.history.end_batch();
        result
    }

    // ---------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------

    pub fn selected_ids(&self) -> &[String] {
        self.selection.ids()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn select(&mut self, id: &str) -> bool {
        if !tree::contains(self.get_tree(), id) {
            return false;
        }
        self.selection.select(id);
        self.reveal_selection();
        true
    }

    /// Click with modifiers; ranges follow the visible row order
    pub fn toggle_select(&mut self, id: &str, multi_select: bool, range_select: bool) -> bool {
        if !tree::contains(self.get_tree(), id) {
            return false;
        }
        let visible = projection::visible_ids(self.get_tree());
        self.selection.toggle_select(id, multi_select, range_select, &visible);
        self.reveal_selection();
        true
    }

    /// Replace the selection, ignoring ids not on the current page
    pub fn select_many(&mut self, ids: &[String]) {
        let present: Vec<String> = ids
            .iter()
            .filter(|id| tree::contains(self.get_tree(), id))
            .cloned()
            .collect();
        self.selection.set(present);
        self.reveal_selection();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Expand collapsed ancestors so every selected node is visible
    ///
    /// Only the `collapsed` flags change; this is not an undo step.
    fn reveal_selection(&mut self) {
        let ids = self.selection.ids().to_vec();
        let Some(page) = self.project.current_page_mut() else {
            return;
        };
        let mut changed = false;
        for id in &ids {
            changed |= tree::expand_ancestors(&mut page.tree, id);
        }
        if changed {
            self.touch();
        }
    }

    fn prune_selection(&mut self) {
        let present: HashSet<String> = tree::collect_ids(self.get_tree()).into_iter().collect();
        self.selection.prune(|id| present.contains(id));
    }

    // ---------------------------------------------------------------
    // Clipboard
    // ---------------------------------------------------------------

    pub fn copy(&mut self, id: &str) -> bool {
        let Some(page) = self.project.current_page() else {
            return false;
        };
        let Some(node) = tree::find_node(&page.tree, id) else {
            return false;
        };
        let parent = tree::locate(&page.tree, id).and_then(|location| location.parent_id);
        self.clipboard.copy(node, parent);
        true
    }

    /// Copy then remove, as one undo step
    pub fn cut(&mut self, id: &str) -> bool {
        self.copy(id) && self.remove(id)
    }

    /// Paste a fresh-id clone of the buffer
    ///
    /// Without a target it goes back under the parent it was copied from,
    /// or to the top level when that parent is gone.
    pub fn paste(&mut self, target_parent_id: Option<&str>) -> Option<String> {
        let masters: HashSet<String> = self.project.global_components.iter().map(|g| g.id.clone()).collect();
        let mut ids = IdAllocator::new(&mut self.ids, self.project.all_ids());
        let Some((mut node, source_parent)) = self.clipboard.instantiate(&mut ids) else {
            tracing::debug!("paste rejected: {}", MutationError::EmptyClipboard);
            return None;
        };

        unlink_dangling(&mut node, &masters);
        let parent = target_parent_id.map(str::to_string).or(source_parent);
        let mutation = Mutation::Insert {
            node,
            parent_id: parent,
            index: None,
        };
        self.commit(mutation, Some("paste"))?.select
    }

    pub fn can_paste(&self) -> bool {
        self.clipboard.can_paste()
    }

    // ---------------------------------------------------------------
    // Symbols
    // ---------------------------------------------------------------

    /// Turn a node into a master; the node becomes its first instance
    pub fn promote(&mut self, node_id: &str, name: &str) -> Option<String> {
        self.commit_project("promote", |project, ids| symbols::promote(project, node_id, name, ids))
    }

    /// Insert a fresh instance of a master; it becomes the selection
    pub fn insert_instance(&mut self, global_component_id: &str, parent_id: Option<&str>) -> Option<String> {
        let mut ids = IdAllocator::new(&mut self.ids, self.project.all_ids());
        let instance = match symbols::instantiate_master(&self.project, global_component_id, &mut ids) {
            Ok(node) => node,
            Err(e) => {
                tracing::debug!("insert instance rejected: {}", e);
                return None;
            }
        };

        let mutation = Mutation::Insert {
            node: instance,
            parent_id: parent_id.map(str::to_string),
            index: None,
        };
        self.commit(mutation, Some("insert instance"))?.select
    }

    /// Unlink an instance from its master, on whichever page it sits
    pub fn detach(&mut self, node_id: &str) -> bool {
        self.commit_project("detach", |project, _| symbols::detach(project, node_id))
            .is_some()
    }

    /// How many instances a `delete_master` would detach
    pub fn count_instances(&self, global_component_id: &str) -> InstanceCount {
        symbols::count_instances(&self.project, global_component_id)
    }

    /// Detach every instance on every page, then drop the master
    pub fn delete_master(&mut self, global_component_id: &str) -> Option<CascadeReport> {
        self.commit_project("delete global component", |project, _| {
            symbols::delete_master(project, global_component_id)
        })
    }

    pub fn rename_master(&mut self, global_component_id: &str, name: &str) -> bool {
        self.commit_project("rename global component", |project, _| {
            symbols::rename_master(project, global_component_id, name)
        })
        .is_some()
    }

    pub fn list_masters(&self) -> Vec<MasterSummary> {
        symbols::list_masters(&self.project)
    }

    // ---------------------------------------------------------------
    // Pages
    // ---------------------------------------------------------------

    fn commit_page<T>(
        &mut self,
        label: &str,
        change: impl FnOnce(&mut Project, &mut IdAllocator) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let before = DocumentSnapshot::capture(&self.project);
        let taken = self.project.all_ids();
        let mut ids = IdAllocator::new(&mut self.ids, taken);

        match change(&mut self.project, &mut ids) {
            Ok(value) => {
                self.history.record(before, label, None, Instant::now());
                self.touch();
                self.drag = None;
                self.prune_selection();
                Ok(value)
            }
            Err(e) => {
                before.restore_into(&mut self.project);
                Err(e)
            }
        }
    }

    pub fn add_page(&mut self, name: &str) -> Result<String, EditorError> {
        self.commit_page("add page", |project, ids| Ok(project.add_page(name, ids)))
    }

    pub fn rename_page(&mut self, page_id: &str, name: &str) -> Result<(), EditorError> {
        self.commit_page("rename page", |project, _| project.rename_page(page_id, name))
    }

    pub fn duplicate_page(&mut self, page_id: &str) -> Result<String, EditorError> {
        self.commit_page("duplicate page", |project, ids| project.duplicate_page(page_id, ids))
    }

    pub fn delete_page(&mut self, page_id: &str) -> Result<(), EditorError> {
        self.commit_page("delete page", |project, _| project.delete_page(page_id).map(|_| ()))
    }

    pub fn reorder_page(&mut self, page_id: &str, new_index: usize) -> Result<(), EditorError> {
        self.commit_page("reorder page", |project, _| project.reorder_page(page_id, new_index))
    }

    /// Switch pages; navigation is not an undo step
    pub fn set_current_page(&mut self, page_id: &str) -> Result<(), EditorError> {
        self.project.set_current_page(page_id)?;
        self.drag = None;
        self.selection.clear();
        self.history.seal();
        self.dirty = true;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Drag
    // ---------------------------------------------------------------

    /// Start dragging a node; replaces any drag in flight
    pub fn begin_drag(&mut self, active_id: &str) -> bool {
        self.drag = DragSession::begin(self.get_tree(), active_id);
        self.drag.is_some()
    }

    /// Preview only: recompute the projection without touching the document
    pub fn drag_move(&mut self, over_id: &str, horizontal_offset: f64) -> Option<Projection> {
        let indent_unit = self.config.indent_unit;
        let drag = self.drag.as_mut()?;
        let projection = drag.update(over_id, horizontal_offset, indent_unit).cloned();
        tracing::trace!("drag {} over {} -> {:?}", drag.active_id(), over_id, projection);
        projection
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Abort the drag; nothing was committed, so nothing is rolled back
    pub fn cancel_drag(&mut self) {
        self.drag = None;
    }

    /// Drop: one atomic tree replacement, one history entry
    pub fn end_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        match drag.commit(self.get_tree()) {
            Ok(tree) => self.commit(Mutation::ReplaceTree { tree }, Some("drag")).is_some(),
            Err(e) => {
                tracing::debug!("drag of {} rejected: {}", drag.active_id(), e);
                false
            }
        }
    }
}

fn unlink_dangling(node: &mut ComponentNode, masters: &HashSet<String>) {
    if let Some(master) = node.instance_of() {
        if !masters.contains(master) {
            node.unlink_from_master();
        }
    }
    for child in &mut node.children {
        unlink_dangling(child, masters);
    }
}
