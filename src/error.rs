/// Crate-level error types for docstitch diagnostics.
use std::path::PathBuf;

/// All errors in docstitch carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, command, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An object-initializer property has no opening brace between its start and stop tokens.
    #[error("object body not found for `{identifier}` in {}", file.display())]
    BodyNotFound {
        /// File containing the property.
        file: PathBuf,
        /// Identifier of the property.
        identifier: String,
    },

    /// A scenario command could not be resolved or extracted.
    #[error("failed to handle command `{command}`: {source}")]
    CommandFailed {
        /// Raw command line as written in the scenario.
        command: String,
        /// The underlying failure.
        source: Box<Error>,
    },

    /// No declaration in the file carries the requested identifier.
    #[error("declaration not found: `{identifier}` in {}", file.display())]
    DeclarationNotFound {
        /// Every addressable declaration name found in the file.
        available: Vec<String>,
        /// File that was searched.
        file: PathBuf,
        /// Identifier that was not found.
        identifier: String,
    },

    /// A referenced source file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json serialize: {0}")]
    JsonSer(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A command line does not follow `@<verb> <path>::<identifier>`.
    #[error("malformed command `{command}`: {reason}")]
    MalformedCommand {
        /// Raw command line.
        command: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A scenario file is missing its root or link lines.
    #[error("malformed scenario {}: {reason}", path.display())]
    MalformedScenario {
        /// Scenario file path.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// Tree-sitter failed to parse a source file.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A markdown fragment could not be turned into HTML.
    #[error("render failed: {reason}")]
    RenderFailed {
        /// Message from the markdown parser.
        reason: String,
    },

    /// A scenario file does not exist or is not a regular file.
    #[error("scenario not found: {}", path.display())]
    ScenarioNotFound {
        /// Path to the missing scenario.
        path: PathBuf,
    },

    /// The source root named on a scenario's first line does not exist.
    #[error("source root not found: {}", path.display())]
    SourceRootNotFound {
        /// Path to the missing root.
        path: PathBuf,
    },

    /// A spawned task panicked or was cancelled before producing a result.
    #[error("task failed: {0}")]
    TaskFailed(
        /// The wrapped join error.
        #[from]
        tokio::task::JoinError,
    ),

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A command verb other than `decl` or `def`.
    #[error("unknown command `{verb}` (expected `decl` or `def`)")]
    UnknownCommand {
        /// The verb as written.
        verb: String,
    },

    /// A command snippet reached the renderer without being resolved first.
    #[error("unresolved command reached the renderer: `{command}`")]
    UnresolvedCommand {
        /// Raw command line.
        command: String,
    },

    /// No tree-sitter grammar registered for this file extension.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },

    /// The filesystem watcher could not be set up.
    #[error("watch: {0}")]
    Watch(
        /// The wrapped notify error.
        #[from]
        notify::Error,
    ),
}
