use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pageforge_editor::{Editor, EditorConfig, JsonFileStorage, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project file to create
    pub file: PathBuf,

    /// Project display name
    #[arg(short, long, default_value = "Untitled")]
    pub name: String,

    /// Force overwrite an existing project file
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let path = cwd.join(&args.file);

    // Check if project already exists
    if path.exists() && !args.force {
        println!("{} {} already exists", "⚠️".yellow(), path.display().to_string().bright_white());
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Pageforge project...".bright_blue().bold());

    let config = EditorConfig::load(cwd)?;
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);
    if !config_path.exists() {
        fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
        println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    }

    let editor = Editor::blank(&project_id_for(&path), &args.name, config);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    JsonFileStorage::write_file(&path, editor.project())?;

    println!("  {} Created {}", "✓".green(), path.display());
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: pageforge inspect {}", args.file.display());
    println!("  2. Run: pageforge validate {}", args.file.display());

    Ok(())
}

/// Project id from the file name, e.g. `site/home.json` → `home`
pub fn project_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "project".to_string())
}
