mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, inspect, symbols, validate, InitArgs, InspectArgs, SymbolsArgs, ValidateArgs};
use tracing_subscriber::EnvFilter;

/// Pageforge CLI - offline tooling for page builder projects
#[derive(Parser, Debug)]
#[command(name = "pageforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty project file
    Init(InitArgs),

    /// Print the layer outline of a page
    Inspect(InspectArgs),

    /// Check project files for structural problems
    Validate(ValidateArgs),

    /// List global components and their instances
    Symbols(SymbolsArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pageforge_editor=debug,pageforge_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Validate(args) => validate(args, &cwd),
        Command::Symbols(args) => symbols(args, &cwd),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
