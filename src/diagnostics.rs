use std::fmt::Write as _;
use std::path::Path;

use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Command verbs a scenario may use, with what they include.
const VERBS: &[(&str, &str)] = &[
    ("decl", "leading comments and the signature, without the body"),
    ("def", "leading comments and the whole definition"),
];

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// something to do about it, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::CommandFailed { command, source } => render_command_failed(command, source),
        Error::DeclarationNotFound { available, file, identifier } => {
            render_declaration_not_found(file, identifier, available)
        },
        Error::MalformedCommand { command, reason } => render_malformed_command(command, reason),
        Error::MalformedScenario { path, reason } => render_malformed_scenario(path, reason),
        Error::UnknownCommand { verb } => render_unknown_command(verb),
        Error::UnsupportedLanguage { ext } => render_unsupported_language(ext),
        _ => render_generic(e),
    };
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::BodyNotFound { file, identifier } => format!("\
# Error: Object Body Not Found

`{identifier}` in `{}` is initialized with an object, but no opening brace was found.
", file.display()),

        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.

## Fix

Check the command's dotted path, and the `home` and `extension` keys in `.docstitch.toml`.
", path.display()),

        Error::Io(e) => format!("\
# Error: I/O

{e}
"),

        Error::ParseFailed { file, reason } => format!("\
# Error: Parse Failed

Could not parse `{}`: {reason}
", file.display()),

        Error::RenderFailed { reason } => format!("\
# Error: Render Failed

A markdown fragment could not be rendered: {reason}
"),

        Error::ScenarioNotFound { path } => format!("\
# Error: Scenario Not Found

`{}` is not a scenario file or directory.

## Fix

Pass `--scenarios <dir>` or set `scenarios` in `.docstitch.toml`.
", path.display()),

        Error::SourceRootNotFound { path } => format!("\
# Error: Source Root Not Found

`{}` does not exist.

## Fix

The first line of a scenario names the source root, relative to the working directory.
", path.display()),

        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),

        Error::UnresolvedCommand { command } => format!("\
# Error: Unresolved Command

`{command}` reached the renderer before it was resolved.
"),

        _ => format!("\
# Error

{e}
"),
    };
}

fn render_command_failed(command: &str, source: &Error) -> String {
    let mut out = format!("\
# Error: Command Failed

    {command}

## Cause

");
    for line in render_error(source).lines() {
        let demoted = if line.starts_with('#') { format!("#{line}") } else { line.to_string() };
        let _ = writeln!(out, "{demoted}");
    }
    return out;
}

fn render_declaration_not_found(file: &Path, identifier: &str, available: &[String]) -> String {
    let mut out = format!("\
# Error: Declaration Not Found

No declaration named `{identifier}` in `{}`.
", file.display());

    if let Some(suggestion) = find_closest_suggestion(identifier, available) {
        let _ = write!(out, "\n## Did you mean `{suggestion}`?\n");
    } else if !available.is_empty() {
        out.push_str("\n## Available declarations\n\n");
        for name in available {
            let _ = writeln!(out, "- `{name}`");
        }
    }

    let _ = write!(out, "\n## Fix\n\nList what can be included:\n\n    docstitch list {}\n", file.display());
    return out;
}

/// Find a declaration whose name differs from `identifier` only in case.
pub(crate) fn find_closest_suggestion(identifier: &str, available: &[String]) -> Option<String> {
    return available
        .iter()
        .find(|name| return name.eq_ignore_ascii_case(identifier) && *name != identifier)
        .cloned();
}

fn render_malformed_command(command: &str, reason: &str) -> String {
    return format!("\
# Error: Malformed Command

`{command}`: {reason}

## Fix

Commands look like:

    @decl ~.render.mesh::Mesh
");
}

fn render_malformed_scenario(path: &Path, reason: &str) -> String {
    return format!("\
# Error: Malformed Scenario

`{}`: {reason}

## Fix

A scenario starts with the source root, then the base link URL:

    ../engine
    https://github.com/acme/engine/blob/main

    Prose and commands follow.
", path.display());
}

fn render_unknown_command(verb: &str) -> String {
    let mut out = format!("\
# Error: Unknown Command

`@{verb}` is not implemented.

## Supported commands

");
    for (name, includes) in VERBS {
        let _ = writeln!(out, "- `@{name}`: {includes}");
    }
    return out;
}

fn render_unsupported_language(ext: &str) -> String {
    return format!("\
# Error: Unsupported Language

No tree-sitter grammar for `.{ext}` files.

## Supported extensions

- `.rs`: Rust
- `.ts`, `.tsx`: TypeScript
- `.js`, `.jsx`: JavaScript
- `.go`: Go
- `.kt`, `.kts`: Kotlin
");
}
