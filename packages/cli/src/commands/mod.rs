pub mod init;
pub mod inspect;
pub mod symbols;
pub mod validate;

pub use init::{init, InitArgs};
pub use inspect::{inspect, InspectArgs};
pub use symbols::{symbols, SymbolsArgs};
pub use validate::{validate, ValidateArgs};

use anyhow::{Context, Result};
use pageforge_editor::{JsonFileStorage, Project};
use std::path::Path;

/// Read a project document, naming the file in any error
pub fn load_project(path: &Path) -> Result<Project> {
    let project = JsonFileStorage::read_file(path).with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::debug!(
        "loaded {} ({} page(s), {} global component(s))",
        project.id,
        project.pages.len(),
        project.global_components.len()
    );
    Ok(project)
}
