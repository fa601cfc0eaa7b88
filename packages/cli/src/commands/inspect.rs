use super::load_project;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pageforge_editor::projection::{flatten, visible_rows};
use pageforge_editor::{FlattenedNode, Page, Project};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Project file
    pub file: PathBuf,

    /// Page id or name (defaults to the current page)
    #[arg(short, long)]
    pub page: Option<String>,

    /// Show rows inside collapsed layers
    #[arg(short, long)]
    pub all: bool,
}

pub fn inspect(args: InspectArgs, cwd: &Path) -> Result<()> {
    let project = load_project(&cwd.join(&args.file))?;
    let page = pick_page(&project, args.page.as_deref())?;

    println!("{} {}", project.name.bold(), format!("({})", project.id).dimmed());
    for p in &project.pages {
        let marker = if p.id == page.id { "▶".green() } else { " ".normal() };
        println!("  {} {} {}", marker, p.name, format!("[{}]", p.id).dimmed());
    }
    println!();

    let rows = if args.all {
        flatten(&page.tree)
    } else {
        visible_rows(&page.tree)
    };
    if rows.is_empty() {
        println!("   {}", "(empty page)".dimmed());
        return Ok(());
    }
    for row in &rows {
        println!("{}", outline_line(row, &project));
    }

    println!();
    println!(
        "   {} rows shown, {} nodes on page",
        rows.len(),
        flatten(&page.tree).len()
    );
    Ok(())
}

fn pick_page<'a>(project: &'a Project, selector: Option<&str>) -> Result<&'a Page> {
    match selector {
        Some(key) => project
            .pages
            .iter()
            .find(|p| p.id == key || p.name == key)
            .ok_or_else(|| anyhow!("No page with id or name {}", key)),
        None => project
            .current_page()
            .or_else(|| project.pages.first())
            .ok_or_else(|| anyhow!("Project has no pages")),
    }
}

fn outline_line(row: &FlattenedNode, project: &Project) -> String {
    let node = &row.node;
    let mut line = format!("   {}{} {}", "  ".repeat(row.depth), node.node_type.cyan(), node.id.dimmed());
    if let Some(name) = &node.name {
        line.push_str(&format!(" \"{}\"", name));
    }
    if node.collapsed {
        line.push_str(&format!(" {}", "▸ collapsed".yellow()));
    }
    if let Some(master_id) = node.instance_of() {
        let label = project
            .global_component(master_id)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| format!("missing {}", master_id));
        line.push_str(&format!(" {}", format!("◆ {}", label).magenta()));
    }
    line
}
