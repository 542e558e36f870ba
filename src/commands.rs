//! CLI commands for docstitch: build, extract, list.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::CachedParser as _;
use crate::config::Config;
use crate::error;
use crate::extract::Extractor;
use crate::locator;
use crate::pipeline;
use crate::scenario;
use crate::source::SourceParser;
use crate::types::ScenarioDescriptor;

/// Render every scenario and report the elapsed time.
///
/// # Errors
///
/// Returns config errors, or the first scenario failure once all scenarios
/// have finished.
pub fn build(scenarios: Option<PathBuf>, output: Option<PathBuf>) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?.with_overrides(scenarios, output);

    let started = Instant::now();
    let written = run_build(&config)?;
    let count = written.len();
    eprintln!("Wrote {count} pages to {}", config.output.display());
    println!("Finished in {:.2} seconds", started.elapsed().as_secs_f64());

    return Ok(());
}

/// Run one command against `root` and print its markdown fragments.
///
/// # Errors
///
/// Returns `Error::CommandFailed` wrapping the parse, lookup, or extraction error.
pub fn extract(root: &Path, target: &str, definition: bool, url: &str) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let verb = if definition { "def" } else { "decl" };
    let descriptor = ScenarioDescriptor {
        body_lines: Vec::new(),
        link_base_url: url.trim_end_matches('/').to_string(),
        source_root: root.to_path_buf(),
    };

    let extractor = Extractor::new(config);
    let fragments = extractor.resolve_command(&format!("@{verb} {target}"), &descriptor)?;
    println!("{}", fragments.join("\n\n"));

    return Ok(());
}

/// List the declarations a command can address in `file`.
///
/// # Errors
///
/// Returns errors from reading, language detection, or parsing.
pub fn list(file: &Path, json: bool) -> Result<(), error::Error> {
    let parser = SourceParser::build(&file.to_path_buf())?;
    let declarations = locator::list_declarations(&parser)?;

    if json {
        let out = serde_json::to_string_pretty(&declarations)?;
        println!("{out}");
        return Ok(());
    }

    for declaration in &declarations {
        println!(
            "{}:{}  {:<8}  {}",
            file.display(),
            declaration.line,
            declaration.kind.label(),
            declaration.name
        );
    }
    return Ok(());
}

/// Discover scenarios and render them all on a fresh multi-threaded runtime
/// with a fresh extractor. Returns the pages written.
///
/// # Errors
///
/// Returns discovery, runtime, or scenario errors.
pub fn run_build(config: &Config) -> Result<Vec<PathBuf>, error::Error> {
    let scenarios = scenario::discover(&config.scenarios)?;
    tracing::debug!(count = scenarios.len(), dir = %config.scenarios.display(), "scenarios found");

    let extractor = Arc::new(Extractor::new(config.clone()));
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    return runtime.block_on(pipeline::run_all(scenarios, extractor, &config.output));
}
