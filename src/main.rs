mod boundary;
mod cache;
mod commands;
mod config;
mod diagnostics;
mod error;
mod extract;
mod grammar;
mod locator;
mod pipeline;
mod scenario;
mod source;
mod statements;
mod tokens;
mod types;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docstitch",
    about = "Stitch prose and live source excerpts into HTML pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every scenario into an HTML page
    Build {
        /// Directory holding scenario files (overrides .docstitch.toml)
        #[arg(long)]
        scenarios: Option<PathBuf>,
        /// Directory pages are written to (overrides .docstitch.toml)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Extract one declaration and print its markdown fragments
    Extract {
        /// Source root the path is resolved against
        root: PathBuf,
        /// Dotted path and identifier, e.g. ~.render.mesh::Mesh
        target: String,
        /// Include the whole definition instead of the signature only
        #[arg(long)]
        def: bool,
        /// Base URL for the header link
        #[arg(long, default_value = ".")]
        url: String,
    },
    /// List the declarations a command can include from a file
    List {
        /// Source file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build, then rebuild whenever scenarios or sources change
    Watch {
        /// Directory holding scenario files (overrides .docstitch.toml)
        #[arg(long)]
        scenarios: Option<PathBuf>,
        /// Directory pages are written to (overrides .docstitch.toml)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Log to stderr, filtered by `RUST_LOG`, warnings and errors by default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { scenarios, output } => commands::build(scenarios, output).map(|()| return ExitCode::SUCCESS),
        Commands::Extract { root, target, def, url } => {
            commands::extract(&root, &target, def, &url).map(|()| return ExitCode::SUCCESS)
        },
        Commands::List { file, json } => commands::list(&file, json).map(|()| return ExitCode::SUCCESS),
        Commands::Watch { scenarios, output } => watch::run(scenarios, output),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
