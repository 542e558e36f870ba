/// Core domain types for docstitch scenarios, locations, declarations and segments.
use std::path::{Path, PathBuf};

use serde::Serialize;

/// First two lines plus body of a scenario file. Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct ScenarioDescriptor {
    /// Body lines in document order, leading blank lines removed.
    pub body_lines: Vec<String>,
    /// Base URL the header links point into.
    pub link_base_url: String,
    /// Root of the source tree commands are resolved against.
    pub source_root: PathBuf,
}

/// One piece of a scenario body as it moves through the pipeline.
/// A body starts as `Prose | Command`, is `Prose` only after command
/// resolution and `Html` only after rendering. Vector order is reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snippet {
    /// A raw `@` line, not yet resolved.
    Command(String),
    /// Rendered markup for one fragment.
    Html(String),
    /// Markdown text passed to the renderer verbatim.
    Prose(String),
}

/// A command target resolved against a scenario's source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Source file relative to `source_root`, e.g. `src/render/mesh.rs`.
    pub file: PathBuf,
    /// Bare declaration name.
    pub identifier: String,
    /// Base URL for header links.
    pub link_base_url: String,
    /// Root of the source tree.
    pub source_root: PathBuf,
}

impl Location {
    /// Absolute (or root-relative) path of the file on disk.
    pub fn source_path(&self) -> PathBuf {
        return self.source_root.join(&self.file);
    }

    /// The file path with `/` separators, as used in links.
    pub fn unix_path(&self) -> String {
        return self.file.to_string_lossy().replace('\\', "/");
    }
}

/// The three declaration kinds the locator visits. Every consumer matches
/// this exhaustively, so a new kind has to be handled everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    /// Struct, enum, trait, class, interface, module or named type.
    Class,
    /// Function or method, with or without a body.
    Function,
    /// Constant, static, variable or field binding.
    Property,
}

impl DeclarationKind {
    /// Lowercase name, as printed by `docstitch list`.
    pub const fn label(self) -> &'static str {
        return match self {
            Self::Class => "class",
            Self::Function => "function",
            Self::Property => "property",
        };
    }
}

/// A located declaration, expressed as indices into its file's token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// First token of the body (class/function only).
    pub body_start_token: Option<usize>,
    /// Which kind of declaration this is.
    pub kind: DeclarationKind,
    /// One-based line of the declaration's first token.
    pub line: usize,
    /// Matched name.
    pub name: String,
    /// First token of the anonymous object literal a property is initialized
    /// with, if it is.
    pub object_initializer: Option<usize>,
    /// First token of the declaration, including attributes and wrappers.
    pub start_token: usize,
    /// Last token of the declaration.
    pub stop_token: usize,
}

/// A declaration as reported by `docstitch list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclarationSummary {
    /// Declaration kind.
    pub kind: DeclarationKind,
    /// One-based line.
    pub line: usize,
    /// Declaration name.
    pub name: String,
}

/// How much of a declaration a command includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionMode {
    /// `@decl`: the signature without its body.
    Declaration,
    /// `@def`: the whole definition including the body.
    Definition,
}

/// A classified run of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `/* ... */` comment, delimiters stripped.
    BlockComment(String),
    /// Code to show verbatim.
    Code(String),
    /// `// ...` comment, marker stripped.
    LineComment(String),
}

impl Segment {
    /// Markdown for this segment: comments become prose, code becomes a fenced block.
    pub fn to_markdown(&self, fence: &str) -> String {
        return match self {
            Self::BlockComment(text) | Self::LineComment(text) => text.clone(),
            Self::Code(code) => format!("```{fence}\n{code}\n```"),
        };
    }
}

/// Display a path relative to the home prefix, the way header links show it.
pub fn visible_path(unix_path: &str, home: &str) -> String {
    let home = home.trim_end_matches('/');
    let stripped = if home.is_empty() {
        unix_path
    } else {
        unix_path.strip_prefix(home).unwrap_or(unix_path)
    };
    return stripped.trim_start_matches('/').to_string();
}

/// True when `path` names an existing regular file.
pub fn is_file(path: &Path) -> bool {
    return path.metadata().is_ok_and(|m| return m.is_file());
}
