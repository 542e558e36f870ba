//! File watcher: builds on startup, then rebuilds on scenario or source changes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config::Config;
use crate::diagnostics;
use crate::error;
use crate::scenario;

/// Debounce delay between filesystem events and rebuild.
const DEBOUNCE_MS: u64 = 100;

/// The scenarios directory plus every source root named by a readable scenario.
fn collect_watch_dirs(config: &Config) -> BTreeSet<PathBuf> {
    let mut dirs = BTreeSet::new();
    dirs.insert(config.scenarios.clone());

    let Ok(scenarios) = scenario::discover(&config.scenarios) else {
        return dirs;
    };
    for path in scenarios {
        if let Ok(descriptor) = scenario::read_scenario(&path) {
            dirs.insert(descriptor.source_root);
        }
    }
    return dirs;
}

/// Create a filesystem watcher that signals on the given channel. Events that
/// only touch files under `ignored` (the output directory) are dropped.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    ignored: PathBuf,
) -> Result<notify::RecommendedWatcher, error::Error> {
    let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && !event.paths.iter().all(|p| return p.starts_with(&ignored))
        {
            let _ = tx.send(());
        }
    })?;
    return Ok(watcher);
}

/// Entry point for the watch command.
///
/// Runs an initial build, then watches the scenarios directory and every
/// source root and rebuilds with a fresh extractor on changes.
///
/// # Errors
///
/// Returns errors from config loading or watcher setup. Build failures are
/// reported and watching continues.
pub fn run(scenarios: Option<PathBuf>, output: Option<PathBuf>) -> Result<ExitCode, error::Error> {
    let config = Config::load(Path::new("."))?.with_overrides(scenarios, output);

    eprintln!("watch: initial build");
    let mut last_code = run_once(&config);

    let (tx, rx) = crossbeam_channel::unbounded();
    let ignored = std::path::absolute(&config.output)?;
    let mut watcher = create_watcher(tx, ignored)?;

    let watch_dirs = collect_watch_dirs(&config);
    for dir in &watch_dirs {
        if dir.exists() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
        }
    }

    let dir_count = watch_dirs.len();
    eprintln!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, rebuilding...");
        last_code = run_once(&config);
    }

    return Ok(last_code);
}

/// Build once and print the result.
fn run_once(config: &Config) -> ExitCode {
    return match commands::run_build(config) {
        Ok(written) => {
            eprintln!("watch: wrote {} pages", written.len());
            ExitCode::SUCCESS
        },
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watches_scenarios_and_their_roots() {
        let dir = tempfile::tempdir().unwrap();
        let scenarios = dir.path().join("scenarios");
        let engine = dir.path().join("engine");
        std::fs::create_dir_all(&scenarios).unwrap();
        std::fs::create_dir_all(&engine).unwrap();
        std::fs::write(scenarios.join("page"), format!("{}\nhttps://x\n", engine.display())).unwrap();
        std::fs::write(scenarios.join("broken"), "").unwrap();

        let config = Config::default().with_overrides(Some(scenarios.clone()), None);
        let dirs = collect_watch_dirs(&config);
        assert_eq!(dirs, BTreeSet::from([scenarios, engine]));
    }
}
