//! Second-stage lexer that splits extracted text into comments and code.
//!
//! The source grammar's tokens are too fine-grained to tell documentation from
//! code, so the extracted text is re-lexed with a grammar that only knows
//! comment delimiters. Runs of anything else become code.

use std::ops::Range;

use logos::Logos;

use crate::cache::CachedParser;
use crate::error::Error;
use crate::types::Segment;

/// Marker that keeps editorial notes out of the rendered page.
const TODO_MARKER: &str = "todo:";

/// Raw tokens of the statement grammar.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawStatement {
    /// Anything that is not a slash. Consecutive runs merge into one code segment.
    #[regex(r"[^/]+")]
    Any,
    /// `/* ... */`, nested pairs included.
    #[token("/*", delimited_comment)]
    DelimitedComment,
    /// `// ...` up to, not including, the line break.
    #[regex(r"//[^\r\n]*", allow_greedy = true)]
    LineComment,
    /// A slash that does not open a comment.
    #[token("/")]
    Slash,
}

/// Extend a `/*` match to its balanced `*/`. An unterminated comment is a
/// lexing error and ends up as code.
fn delimited_comment(lex: &mut logos::Lexer<RawStatement>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth: usize = 1;
    let mut at: usize = 0;
    while let Some(pair) = rest.get(at..at.saturating_add(2)) {
        if pair == b"/*" {
            depth = depth.saturating_add(1);
            at = at.saturating_add(2);
        } else if pair == b"*/" {
            depth = depth.saturating_sub(1);
            at = at.saturating_add(2);
            if depth == 0 {
                lex.bump(at);
                return true;
            }
        } else {
            at = at.saturating_add(1);
        }
    }
    return false;
}

/// Lexed statement text with a cursor, cached per extracted text.
pub struct StatementLexer {
    /// Position of the next raw token to read.
    cursor: usize,
    /// The text being segmented.
    text: String,
    /// Raw tokens and their byte spans. Lexing errors are kept as code.
    tokens: Vec<(Option<RawStatement>, Range<usize>)>,
}

impl StatementLexer {
    /// Lex `text`.
    pub fn new(text: String) -> Self {
        let tokens = RawStatement::lexer(&text)
            .spanned()
            .map(|(token, span)| return (token.ok(), span))
            .collect();
        return Self { cursor: 0, text, tokens };
    }

    /// Read raw segments from the cursor to the end: comments as they are,
    /// maximal runs of everything else as code.
    fn raw_segments(&mut self) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut code: Option<Range<usize>> = None;

        while let Some((token, span)) = self.tokens.get(self.cursor) {
            self.cursor = self.cursor.saturating_add(1);
            let text = self.text.get(span.clone()).unwrap_or("").to_string();
            match token {
                Some(RawStatement::DelimitedComment) => {
                    self.flush_code(&mut code, &mut segments);
                    segments.push(Segment::BlockComment(text));
                },
                Some(RawStatement::LineComment) => {
                    self.flush_code(&mut code, &mut segments);
                    segments.push(Segment::LineComment(text));
                },
                Some(RawStatement::Any | RawStatement::Slash) | None => {
                    code = Some(code.map_or(span.clone(), |run| return run.start..span.end));
                },
            }
        }
        self.flush_code(&mut code, &mut segments);
        return segments;
    }

    /// Segments in source order, cleaned for rendering. Blank segments and
    /// segments containing a to-do marker are dropped.
    pub fn segments(&mut self) -> Vec<Segment> {
        return self.raw_segments().into_iter().filter_map(clean_segment).collect();
    }

    /// Emit the pending code run, if any.
    fn flush_code(&self, code: &mut Option<Range<usize>>, segments: &mut Vec<Segment>) {
        if let Some(run) = code.take() {
            segments.push(Segment::Code(self.text.get(run).unwrap_or("").to_string()));
        }
    }
}

impl CachedParser for StatementLexer {
    type Key = String;

    fn build(key: &String) -> Result<Self, Error> {
        return Ok(Self::new(key.clone()));
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Drop blank and to-do segments, strip comment delimiters and tidy code.
fn clean_segment(segment: Segment) -> Option<Segment> {
    let raw = match &segment {
        Segment::BlockComment(text) | Segment::Code(text) | Segment::LineComment(text) => text,
    };
    if raw.trim().is_empty() || raw.to_lowercase().contains(TODO_MARKER) {
        return None;
    }

    let cleaned = match segment {
        Segment::BlockComment(text) => Segment::BlockComment(strip_block_comment(&text)),
        Segment::Code(text) => Segment::Code(strip_code(&text)),
        Segment::LineComment(text) => Segment::LineComment(strip_line_comment(&text)),
    };
    return Some(cleaned);
}

/// `/* a */`, `/** a */` and `/*! a */` become `a`; a leading `*` on each
/// continuation line is removed.
fn strip_block_comment(text: &str) -> String {
    let inner = text.strip_prefix("/*").unwrap_or(text);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);
    let inner = inner
        .strip_prefix('*')
        .or_else(|| return inner.strip_prefix('!'))
        .unwrap_or(inner);

    let lines: Vec<&str> = inner
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            return trimmed
                .strip_prefix("* ")
                .or_else(|| return trimmed.strip_prefix('*'))
                .unwrap_or(trimmed);
        })
        .collect();
    return lines.join("\n").trim().to_string();
}

/// Drop leading blank lines, keeping the first code line's indentation, and
/// trailing whitespace.
fn strip_code(text: &str) -> String {
    let first_content = text.find(|c: char| return !c.is_whitespace()).unwrap_or(0);
    let line_start = text
        .get(..first_content)
        .and_then(|lead| return lead.rfind('\n'))
        .map_or(0, |newline| return newline.saturating_add(1));
    return text.get(line_start..).unwrap_or(text).trim_end().to_string();
}

/// `// a`, `/// a` and `//! a` become `a`.
fn strip_line_comment(text: &str) -> String {
    let inner = text.strip_prefix("//").unwrap_or(text);
    let inner = inner
        .strip_prefix('/')
        .or_else(|| return inner.strip_prefix('!'))
        .unwrap_or(inner);
    return inner.trim().to_string();
}
