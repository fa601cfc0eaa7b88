use super::load_project;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pageforge_editor::{check_project, DEFAULT_CONFIG_NAME};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project file or directory of project files
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    problems: Vec<String>,
}

pub fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let input = cwd.join(&args.input);
    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        find_project_files(&input)
    } else {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    };

    let reports: Vec<FileReport> = files.iter().map(|file| check_file(file)).collect();
    let total: usize = reports.iter().map(|r| r.problems.len()).sum();

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            if report.problems.is_empty() {
                println!("{} {}", "✓".green(), report.file);
                continue;
            }
            println!("{} {}", "✗".red(), report.file);
            for problem in &report.problems {
                println!("  {} {}", "error".red().bold(), problem);
            }
        }
        println!();
        println!("   Files checked: {}", reports.len());
    }

    if total > 0 {
        return Err(anyhow!("{} problem(s) found", total));
    }
    if args.format != "json" {
        println!("   {} No issues found!", "✓".green());
    }
    Ok(())
}

fn check_file(path: &Path) -> FileReport {
    let problems = match load_project(path) {
        Ok(project) => {
            let mut problems: Vec<String> = check_project(&project).iter().map(ToString::to_string).collect();
            if project.page(&project.current_page_id).is_none() {
                problems.push(format!("current page {} does not exist", project.current_page_id));
            }
            problems
        }
        Err(e) => vec![format!("{:#}", e)],
    };
    FileReport {
        file: path.display().to_string(),
        problems,
    }
}

fn find_project_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && path.extension().map(|e| e == "json").unwrap_or(false)
                && path.file_name().map(|n| n != DEFAULT_CONFIG_NAME).unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}
