//! Turns one command into markdown fragments.
//!
//! An `Extractor` owns the two parser caches for a run: one tree-sitter parser
//! per source file and one statement lexer per extracted text. It is built once
//! per build, shared by reference with every command task, and dropped when the
//! build finishes. Nothing is evicted in between.

use crate::boundary::extraction_range;
use crate::cache::ParserCache;
use crate::config::Config;
use crate::error::Error;
use crate::locator::locate;
use crate::scenario::{parse_command, resolve_location};
use crate::source::SourceParser;
use crate::statements::StatementLexer;
use crate::types::{InclusionMode, Location, ScenarioDescriptor, visible_path};

/// Heading level of the link placed above every excerpt.
const HEADER_PREFIX: &str = "#####";

/// Declaration extraction over cached parsers.
pub struct Extractor {
    /// Project configuration used to resolve command paths.
    config: Config,
    /// One parsed tree per source file.
    sources: ParserCache<SourceParser>,
    /// One statement lexer per extracted text.
    statements: ParserCache<StatementLexer>,
}

impl Extractor {
    /// Create an extractor with empty caches.
    pub fn new(config: Config) -> Self {
        return Self {
            config,
            sources: ParserCache::default(),
            statements: ParserCache::default(),
        };
    }

    /// Extract the declaration at `location` as markdown fragments: a header
    /// link to the declaration, then its comments as prose and its code as
    /// fenced blocks, in source order.
    ///
    /// # Errors
    ///
    /// Returns parse, lookup, or boundary errors for the target file.
    pub fn include(&self, location: &Location, mode: InclusionMode) -> Result<Vec<String>, Error> {
        let (text, fence, line) = self.sources.with_parser(&location.source_path(), |parser| {
            let declaration = locate(parser, &location.identifier)?;
            let range = extraction_range(parser.tokens(), &declaration, mode, parser.path())?;
            return Ok((
                parser.tokens().slice_text(&range),
                parser.language().fence(),
                declaration.line,
            ));
        })?;

        let segments = self.statements.with_parser(&text, |lexer| return Ok(lexer.segments()))?;

        let mut fragments = Vec::with_capacity(segments.len().saturating_add(1));
        fragments.push(self.header_link(location, line));
        fragments.extend(segments.iter().map(|s| return s.to_markdown(fence)));
        return Ok(fragments);
    }

    /// `##### [render/mesh.rs::Mesh](https://host/repo/src/render/mesh.rs#L12)`
    fn header_link(&self, location: &Location, line: usize) -> String {
        let unix_path = location.unix_path();
        let visible = visible_path(&unix_path, &self.config.home);
        return format!(
            "{HEADER_PREFIX} [{visible}::{}]({}/{unix_path}#L{line})",
            location.identifier, location.link_base_url,
        );
    }

    /// Parse, resolve and extract one raw command line from `scenario`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CommandFailed` naming the command, wrapping the cause.
    pub fn resolve_command(
        &self,
        raw: &str,
        scenario: &ScenarioDescriptor,
    ) -> Result<Vec<String>, Error> {
        let attempt = || {
            let command = parse_command(raw)?;
            let location = resolve_location(
                &scenario.source_root,
                &scenario.link_base_url,
                &command,
                &self.config,
            )?;
            return self.include(&location, command.mode);
        };

        return attempt().map_err(|source| {
            return Error::CommandFailed {
                command: raw.to_string(),
                source: Box::new(source),
            };
        });
    }
}
