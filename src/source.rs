/// Cached tree-sitter parser for one source file.
use std::path::{Path, PathBuf};

use tree_sitter::{Parser, Tree};

use crate::cache::CachedParser;
use crate::error::Error;
use crate::grammar::SourceLanguage;
use crate::tokens::TokenStream;

/// Maximum source file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// A parsed source file: its tree, its token stream and the parser that built them.
pub struct SourceParser {
    /// Detected language.
    language: SourceLanguage,
    /// Tree-sitter parser, kept so its state can be reset between uses.
    parser: Parser,
    /// File the tree was built from.
    path: PathBuf,
    /// Flat tokens over the file.
    tokens: TokenStream,
    /// Syntax tree of the whole file.
    tree: Tree,
}

impl SourceParser {
    /// Parse `source` as the contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedLanguage` for unknown extensions or
    /// `Error::ParseFailed` if tree-sitter cannot parse the source.
    pub fn from_source(path: &Path, source: String) -> Result<Self, Error> {
        let language = SourceLanguage::for_path(path)?;

        let mut parser = Parser::new();
        parser.set_language(&language.grammar()).map_err(|e| {
            return Error::ParseFailed {
                file: path.to_path_buf(),
                reason: e.to_string(),
            };
        })?;

        let tree = parser.parse(&source, None).ok_or_else(|| {
            return Error::ParseFailed {
                file: path.to_path_buf(),
                reason: "tree-sitter returned None".to_string(),
            };
        })?;

        if tree.root_node().has_error() {
            tracing::warn!(file = %path.display(), "source has syntax errors, boundaries may be off");
        }

        let tokens = TokenStream::from_tree(source, tree.root_node());
        return Ok(Self {
            language,
            parser,
            path: path.to_path_buf(),
            tokens,
            tree,
        });
    }

    /// Language of the file.
    pub const fn language(&self) -> SourceLanguage {
        return self.language;
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        return &self.path;
    }

    /// Token stream of the file.
    pub const fn tokens(&self) -> &TokenStream {
        return &self.tokens;
    }

    /// Syntax tree of the file.
    pub const fn tree(&self) -> &Tree {
        return &self.tree;
    }
}

impl CachedParser for SourceParser {
    type Key = PathBuf;

    fn build(key: &PathBuf) -> Result<Self, Error> {
        let size = match std::fs::metadata(key) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound { path: key.clone() });
            },
            Err(e) => return Err(Error::Io(e)),
        };
        if size > MAX_FILE_SIZE {
            return Err(Error::ParseFailed {
                file: key.clone(),
                reason: format!("file too large ({size} bytes, max {MAX_FILE_SIZE})"),
            });
        }

        let source = std::fs::read_to_string(key)?;
        return Self::from_source(key, source);
    }

    fn reset(&mut self) {
        self.parser.reset();
    }
}
