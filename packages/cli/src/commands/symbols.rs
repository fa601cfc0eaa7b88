use super::load_project;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pageforge_editor::symbol_ops::{count_instances, list_masters};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Project file
    pub file: PathBuf,
}

pub fn symbols(args: SymbolsArgs, cwd: &Path) -> Result<()> {
    let project = load_project(&cwd.join(&args.file))?;
    let masters = list_masters(&project);

    if masters.is_empty() {
        println!("   {}", "No global components".dimmed());
        return Ok(());
    }

    println!("{} global component(s) in {}", masters.len(), project.name.bold());
    println!();
    for master in &masters {
        println!(
            "  {} {} {} {}",
            "◆".magenta(),
            master.name.bold(),
            master.node_type.cyan(),
            format!("[{}]", master.id).dimmed()
        );

        let count = count_instances(&project, &master.id);
        if count.total == 0 {
            println!("      {}", "no instances".dimmed());
        }
        for (page_id, n) in &count.per_page {
            let page_name = project.page(page_id).map(|p| p.name.as_str()).unwrap_or(page_id.as_str());
            println!("      {} on {}", n, page_name);
        }
        if count.in_masters > 0 {
            println!("      {} inside other global components", count.in_masters);
        }
    }
    Ok(())
}
