//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Cannot delete the last page of a project")]
    LastPage,

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Cannot delete the last project of a workspace")]
    LastProject,

    #[error("Save failed: {0}")]
    Save(String),
}
