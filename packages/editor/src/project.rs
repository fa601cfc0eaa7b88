//! # Pages and Projects
//!
//! Container operations around page trees. None of these define structural
//! rules of their own: they add, remove, copy and order whole trees and
//! leave node-level invariants to the tree operations.

use crate::id_generator::{IdAllocator, IdGenerator};
use crate::node::{Page, Project};
use crate::tree;
use crate::EditorError;

impl Project {
    /// Append an empty page and return its id
    pub fn add_page(&mut self, name: &str, ids: &mut IdAllocator) -> String {
        let id = ids.next_id();
        self.pages.push(Page::new(id.clone(), name));
        tracing::info!("added page {} ({})", id, name);
        id
    }

    pub fn rename_page(&mut self, page_id: &str, name: &str) -> Result<(), EditorError> {
        let page = self
            .page_mut(page_id)
            .ok_or_else(|| EditorError::PageNotFound(page_id.to_string()))?;
        page.name = name.to_string();
        Ok(())
    }

    /// Copy a page with fresh ids for every node, placed right after it
    pub fn duplicate_page(&mut self, page_id: &str, ids: &mut IdAllocator) -> Result<String, EditorError> {
        let index = self.page_index(page_id)?;
        let source = &self.pages[index];

        let copy = Page {
            id: ids.next_id(),
            name: format!("{} copy", source.name),
            tree: source
                .tree
                .iter()
                .map(|node| tree::clone_with_fresh_ids(node, ids))
                .collect(),
        };
        let copy_id = copy.id.clone();
        self.pages.insert(index + 1, copy);
        Ok(copy_id)
    }

    /// Remove a page; the last page of a project cannot be deleted
    pub fn delete_page(&mut self, page_id: &str) -> Result<Page, EditorError> {
        let index = self.page_index(page_id)?;
        if self.pages.len() == 1 {
            return Err(EditorError::LastPage);
        }

        let removed = self.pages.remove(index);
        if self.current_page_id == removed.id {
            let neighbour = index.min(self.pages.len() - 1);
            self.current_page_id = self.pages[neighbour].id.clone();
        }
        tracing::info!("deleted page {} ({})", removed.id, removed.name);
        Ok(removed)
    }

    /// Move a page to `new_index` (clamped to the page count)
    pub fn reorder_page(&mut self, page_id: &str, new_index: usize) -> Result<(), EditorError> {
        let index = self.page_index(page_id)?;
        let page = self.pages.remove(index);
        let target = new_index.min(self.pages.len());
        self.pages.insert(target, page);
        Ok(())
    }

    pub fn set_current_page(&mut self, page_id: &str) -> Result<(), EditorError> {
        self.page_index(page_id)?;
        self.current_page_id = page_id.to_string();
        Ok(())
    }

    fn page_index(&self, page_id: &str) -> Result<usize, EditorError> {
        self.pages
            .iter()
            .position(|p| p.id == page_id)
            .ok_or_else(|| EditorError::PageNotFound(page_id.to_string()))
    }
}

/// Every project a user has open, in display order
#[derive(Debug, Clone)]
pub struct Workspace {
    projects: Vec<Project>,
    current_project_id: Option<String>,
    ids: IdGenerator,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            projects: Vec::new(),
            current_project_id: None,
            ids: IdGenerator::from_seed("project"),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn current_project(&self) -> Option<&Project> {
        let id = self.current_project_id.as_deref()?;
        self.project(id)
    }

    fn fresh_project_id(&mut self) -> String {
        loop {
            let id = self.ids.new_id();
            if self.project(&id).is_none() {
                return id;
            }
        }
    }

    /// Add a project with one empty page and make it current
    pub fn create_project(&mut self, name: &str) -> String {
        let id = self.fresh_project_id();
        let mut page_ids = IdGenerator::new(&id);
        let project = Project::new(id.clone(), name, Page::new(page_ids.new_id(), "Page 1"));
        self.projects.push(project);
        self.current_project_id = Some(id.clone());
        tracing::info!("created project {} ({})", id, name);
        id
    }

    /// Adopt an existing project (e.g. one loaded from storage)
    pub fn open_project(&mut self, project: Project) {
        let id = project.id.clone();
        match self.projects.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
        self.current_project_id = Some(id);
    }

    pub fn rename_project(&mut self, project_id: &str, name: &str) -> Result<(), EditorError> {
        let index = self.project_index(project_id)?;
        self.projects[index].name = name.to_string();
        Ok(())
    }

    /// Copy a project under a new id; node ids are per project and kept
    pub fn duplicate_project(&mut self, project_id: &str) -> Result<String, EditorError> {
        let index = self.project_index(project_id)?;
        let id = self.fresh_project_id();
        let mut copy = self.projects[index].clone();
        copy.id = id.clone();
        copy.name = format!("{} copy", copy.name);
        self.projects.insert(index + 1, copy);
        Ok(id)
    }

    pub fn delete_project(&mut self, project_id: &str) -> Result<Project, EditorError> {
        let index = self.project_index(project_id)?;
        if self.projects.len() == 1 {
            return Err(EditorError::LastProject);
        }
        let removed = self.projects.remove(index);
        if self.current_project_id.as_deref() == Some(project_id) {
            let neighbour = index.min(self.projects.len() - 1);
            self.current_project_id = Some(self.projects[neighbour].id.clone());
        }
        Ok(removed)
    }

    pub fn reorder_project(&mut self, project_id: &str, new_index: usize) -> Result<(), EditorError> {
        let index = self.project_index(project_id)?;
        let project = self.projects.remove(index);
        let target = new_index.min(self.projects.len());
        self.projects.insert(target, project);
        Ok(())
    }

    pub fn set_current_project(&mut self, project_id: &str) -> Result<(), EditorError> {
        self.project_index(project_id)?;
        self.current_project_id = Some(project_id.to_string());
        Ok(())
    }

    /// Hand a project over to an editor, removing it from the workspace
    pub fn take_project(&mut self, project_id: &str) -> Result<Project, EditorError> {
        let index = self.project_index(project_id)?;
        if self.current_project_id.as_deref() == Some(project_id) {
            self.current_project_id = None;
        }
        Ok(self.projects.remove(index))
    }

    fn project_index(&self, project_id: &str) -> Result<usize, EditorError> {
        self.projects
            .iter()
            .position(|p| p.id == project_id)
            .ok_or_else(|| EditorError::ProjectNotFound(project_id.to_string()))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
