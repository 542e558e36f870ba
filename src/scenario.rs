use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::types::{InclusionMode, Location, ScenarioDescriptor, Snippet, is_file};

/// Body lines starting with this are commands.
pub const COMMAND_PREFIX: &str = "@";

/// Stands for the configured home directory in command paths.
const HOME_ALIAS: &str = "~";

/// Separates the file path from the identifier in a command target.
const IDENTIFIER_SEPARATOR: &str = "::";

/// `@<verb> <target>`, whitespace after `@` tolerated.
///
/// Panics on first use if the hardcoded pattern is invalid (compile-time invariant).
static COMMAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^@\s*(?<verb>\S+)(?:\s+(?<target>\S+))?\s*$").expect("valid regex");
});

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Declaration name after `::`.
    pub identifier: String,
    /// Inclusion mode from the verb.
    pub mode: InclusionMode,
    /// Dotted path before `::`, e.g. `~.render.mesh`.
    pub path: String,
}

/// Split body lines into prose and command snippets, keeping their order.
pub fn classify(lines: &[String]) -> Vec<Snippet> {
    return lines
        .iter()
        .map(|line| {
            if line.starts_with(COMMAND_PREFIX) {
                return Snippet::Command(line.clone());
            }
            return Snippet::Prose(line.clone());
        })
        .collect();
}

/// List scenario files in `dir` (not recursive), sorted by name.
///
/// # Errors
///
/// Returns `Error::ScenarioNotFound` if `dir` is not a directory, or
/// `Error::Io` if it cannot be read.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(Error::ScenarioNotFound { path: dir.to_path_buf() });
    }

    let mut scenarios = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| return Error::Io(e.into()))?;
        if entry.file_type().is_file() {
            scenarios.push(entry.into_path());
        }
    }
    return Ok(scenarios);
}

/// Map a command verb to its inclusion mode.
///
/// # Errors
///
/// Returns `Error::UnknownCommand` for anything but `decl` and `def`.
fn mode_for_verb(verb: &str) -> Result<InclusionMode, Error> {
    return match verb {
        "decl" => Ok(InclusionMode::Declaration),
        "def" => Ok(InclusionMode::Definition),
        _ => Err(Error::UnknownCommand { verb: verb.to_string() }),
    };
}

/// Parse `@<verb> <dotted-path>::<identifier>`.
///
/// # Errors
///
/// Returns `Error::UnknownCommand` for an unsupported verb, or
/// `Error::MalformedCommand` if the line does not follow the syntax.
pub fn parse_command(raw: &str) -> Result<Command, Error> {
    let malformed = |reason: &str| {
        return Error::MalformedCommand {
            command: raw.to_string(),
            reason: reason.to_string(),
        };
    };

    let captures = COMMAND_PATTERN
        .captures(raw.trim())
        .ok_or_else(|| return malformed("expected `@<verb> <path>::<identifier>`"))?;
    let verb = captures.name("verb").map_or("", |m| return m.as_str());
    let mode = mode_for_verb(verb)?;

    let target = captures
        .name("target")
        .ok_or_else(|| return malformed("missing target"))?
        .as_str();
    let Some((path, identifier)) = target.split_once(IDENTIFIER_SEPARATOR) else {
        return Err(malformed("target has no `::<identifier>`"));
    };
    if path.is_empty() || identifier.is_empty() {
        return Err(malformed("empty path or identifier"));
    }

    return Ok(Command {
        identifier: identifier.to_string(),
        mode,
        path: path.to_string(),
    });
}

/// Parse scenario content: root line, link line, blank lines, body.
///
/// # Errors
///
/// Returns `Error::MalformedScenario` if the root or link line is missing.
pub fn parse_scenario(path: &Path, content: &str) -> Result<ScenarioDescriptor, Error> {
    let malformed = |reason: &str| {
        return Error::MalformedScenario {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
    };

    let mut lines = content.lines();
    let root = lines
        .next()
        .map(str::trim)
        .filter(|l| return !l.is_empty())
        .ok_or_else(|| return malformed("first line must name the source root"))?;
    let url = lines
        .next()
        .map(str::trim)
        .filter(|l| return !l.is_empty())
        .ok_or_else(|| return malformed("second line must be the base link URL"))?;

    let body_lines = lines
        .skip_while(|l| return l.trim().is_empty())
        .map(String::from)
        .collect();

    return Ok(ScenarioDescriptor {
        body_lines,
        link_base_url: url.trim_end_matches('/').to_string(),
        source_root: PathBuf::from(root),
    });
}

/// Read a scenario file and check that its source root exists.
///
/// # Errors
///
/// Returns `Error::ScenarioNotFound`, `Error::MalformedScenario`, or
/// `Error::SourceRootNotFound`.
pub fn read_scenario(path: &Path) -> Result<ScenarioDescriptor, Error> {
    if !is_file(path) {
        return Err(Error::ScenarioNotFound { path: path.to_path_buf() });
    }
    let content = std::fs::read_to_string(path)?;
    let descriptor = parse_scenario(path, &content)?;

    if !descriptor.source_root.exists() {
        return Err(Error::SourceRootNotFound { path: descriptor.source_root });
    }
    return Ok(descriptor);
}

/// Turn a command's dotted path into a file under the source root.
///
/// `.` separates directories, `~` stands for the configured home directory,
/// and the configured extension is appended: `~.render.mesh` becomes
/// `src/render/mesh.rs`.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the file does not exist; nothing is parsed.
pub fn resolve_location(
    source_root: &Path,
    link_base_url: &str,
    command: &Command,
    config: &Config,
) -> Result<Location, Error> {
    let no_dots = command.path.replace('.', "/");
    let with_home = if config.home.is_empty() {
        no_dots.trim_start_matches(HOME_ALIAS).trim_start_matches('/').to_string()
    } else {
        no_dots.replace(HOME_ALIAS, config.home.trim_end_matches('/'))
    };
    let file = PathBuf::from(format!("{with_home}.{}", config.extension));

    let location = Location {
        file,
        identifier: command.identifier.clone(),
        link_base_url: link_base_url.to_string(),
        source_root: source_root.to_path_buf(),
    };
    if !is_file(&location.source_path()) {
        return Err(Error::FileNotFound { path: location.source_path() });
    }
    return Ok(location);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_commands_by_prefix() {
        let lines = vec!["intro".to_string(), "@decl ~.lib::bar".to_string(), String::new()];
        assert_eq!(
            classify(&lines),
            vec![
                Snippet::Prose("intro".to_string()),
                Snippet::Command("@decl ~.lib::bar".to_string()),
                Snippet::Prose(String::new()),
            ]
        );
    }

    #[test]
    fn parses_both_verbs() {
        let decl = parse_command("@decl ~.render.mesh::Mesh").unwrap();
        assert_eq!(decl.mode, InclusionMode::Declaration);
        assert_eq!(decl.path, "~.render.mesh");
        assert_eq!(decl.identifier, "Mesh");

        let def = parse_command("@ def ~.lib::main  ").unwrap();
        assert_eq!(def.mode, InclusionMode::Definition);
    }

    #[test]
    fn unknown_verb_is_not_implemented() {
        let err = parse_command("@include ~.lib::main").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand { verb } if verb == "include"));
    }

    #[test]
    fn missing_identifier_is_malformed() {
        assert!(matches!(parse_command("@decl ~.lib"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_command("@decl"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_command("@decl a b::c"), Err(Error::MalformedCommand { .. })));
    }

    #[test]
    fn scenario_skips_blank_lines_after_header() {
        let content = "../engine\nhttps://example.com/engine/\n\n\nFirst line\n\n@decl ~.lib::run\n";
        let scenario = parse_scenario(Path::new("page"), content).unwrap();
        assert_eq!(scenario.source_root, PathBuf::from("../engine"));
        assert_eq!(scenario.link_base_url, "https://example.com/engine");
        assert_eq!(scenario.body_lines, vec!["First line", "", "@decl ~.lib::run"]);
    }

    #[test]
    fn scenario_without_url_is_malformed() {
        let err = parse_scenario(Path::new("page"), "../engine\n").unwrap_err();
        assert!(matches!(err, Error::MalformedScenario { .. }));
    }

    #[test]
    fn location_maps_dots_and_home() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/render")).unwrap();
        std::fs::write(dir.path().join("src/render/mesh.rs"), "pub struct Mesh;").unwrap();

        let command = parse_command("@decl ~.render.mesh::Mesh").unwrap();
        let location = resolve_location(dir.path(), "https://x", &command, &Config::default()).unwrap();
        assert_eq!(location.file, PathBuf::from("src/render/mesh.rs"));
        assert_eq!(location.identifier, "Mesh");
        assert_eq!(location.unix_path(), "src/render/mesh.rs");
    }

    #[test]
    fn location_for_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let command = parse_command("@decl ~.nowhere::Thing").unwrap();
        let err = resolve_location(dir.path(), "https://x", &command, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { path } if path.ends_with("src/nowhere.rs")));
    }

    #[test]
    fn discovers_scenarios_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let found = discover(dir.path()).unwrap();
        let names: Vec<_> = found.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
