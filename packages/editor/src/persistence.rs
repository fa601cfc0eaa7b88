//! # Project Storage
//!
//! Load/save of the JSON project document. The engine never calls storage
//! itself; hosts save snapshots when [`crate::Editor::take_dirty`] reports a
//! change, directly or through the autosave channel.

use crate::node::Project;
use crate::EditorError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage backend for projects
pub trait ProjectStorage: Send + Sync {
    fn load(&self, project_id: &str) -> Result<Project, EditorError>;

    fn save(&self, project: &Project) -> Result<(), EditorError>;
}

/// Parse a project document
pub fn from_json(source: &str) -> Result<Project, EditorError> {
    Ok(serde_json::from_str(source)?)
}

pub fn to_json(project: &Project) -> Result<String, EditorError> {
    Ok(serde_json::to_string_pretty(project)?)
}

/// One `<project id>.json` file per project in a directory
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, project_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", project_id))
    }

    /// Read a project document from any path
    pub fn read_file(path: &Path) -> Result<Project, EditorError> {
        let source = std::fs::read_to_string(path)?;
        from_json(&source)
    }

    /// Write through a temp file and rename, so readers never see half a file
    pub fn write_file(path: &Path, project: &Project) -> Result<(), EditorError> {
        let json = to_json(project)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ProjectStorage for JsonFileStorage {
    fn load(&self, project_id: &str) -> Result<Project, EditorError> {
        Self::read_file(&self.path_for(project_id))
    }

    fn save(&self, project: &Project) -> Result<(), EditorError> {
        std::fs::create_dir_all(&self.dir)?;
        Self::write_file(&self.path_for(&project.id), project)?;
        tracing::debug!("saved project {} to {:?}", project.id, self.dir);
        Ok(())
    }
}

/// In-memory storage holding serialized documents
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProjectStorage for MemoryStorage {
    fn load(&self, project_id: &str) -> Result<Project, EditorError> {
        let docs = self
            .documents
            .lock()
            .map_err(|e| EditorError::Save(e.to_string()))?;
        let source = docs
            .get(project_id)
            .ok_or_else(|| EditorError::ProjectNotFound(project_id.to_string()))?;
        from_json(source)
    }

    fn save(&self, project: &Project) -> Result<(), EditorError> {
        let json = to_json(project)?;
        self.documents
            .lock()
            .map_err(|e| EditorError::Save(e.to_string()))?
            .insert(project.id.clone(), json);
        Ok(())
    }
}
