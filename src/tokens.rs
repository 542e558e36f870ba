//! Flat token stream over a tree-sitter tree.
//!
//! Tree-sitter only materializes grammar leaves, so the bytes between leaves
//! (whitespace) are synthesized as tokens of their own. Comments and whitespace
//! sit on the hidden channel, everything else on the default channel. Tokens are
//! contiguous: concatenating any run of them reproduces the source exactly.

use std::ops::{Range, RangeInclusive};

use tree_sitter::Node;

/// Which channel a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Significant tokens: keywords, identifiers, punctuation, literals.
    Default,
    /// Trivia: comments and whitespace.
    Hidden,
}

/// One token of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Channel of the token.
    pub channel: Channel,
    /// Grammar node kind, or `whitespace` / `text` for synthesized tokens.
    pub kind: &'static str,
    /// One-based line of the first byte.
    pub line: usize,
    /// Byte range in the source.
    pub span: Range<usize>,
}

/// Tokens of one source file, in source order.
#[derive(Debug)]
pub struct TokenStream {
    /// Full source text.
    source: String,
    /// Contiguous tokens covering `source`.
    tokens: Vec<Token>,
}

/// Recursively collect leaf nodes. Comment nodes are taken whole even when the
/// grammar gives them children (doc comment markers).
fn collect_leaves<'a>(node: Node<'a>, leaves: &mut Vec<Node<'a>>) {
    if node.child_count() == 0 || node.kind().contains("comment") {
        if node.end_byte() > node.start_byte() {
            leaves.push(node);
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_leaves(child, leaves);
    }
}

impl TokenStream {
    /// Build the stream for `source` from its parse tree.
    pub fn from_tree(source: String, root: Node<'_>) -> Self {
        let mut leaves = Vec::new();
        collect_leaves(root, &mut leaves);

        let mut builder = StreamBuilder::new(&source);
        for leaf in leaves {
            let channel = if leaf.kind().contains("comment") {
                Channel::Hidden
            } else {
                Channel::Default
            };
            builder.push_leaf(leaf.kind(), leaf.start_byte()..leaf.end_byte(), channel);
        }
        let tokens = builder.finish();

        return Self { source, tokens };
    }

    /// Token at `index`.
    pub fn get(&self, index: usize) -> Option<&Token> {
        return self.tokens.get(index);
    }

    /// Whether a token is trivia for boundary purposes: hidden, or blank text.
    pub fn is_trivia(&self, index: usize) -> bool {
        return self.get(index).is_none_or(|token| {
            return token.channel == Channel::Hidden || self.token_text(token).trim().is_empty();
        });
    }

    /// Index of the last token that ends at or before `byte`.
    pub fn last_token_ending_at(&self, byte: usize) -> Option<usize> {
        let count = self.tokens.partition_point(|t| return t.span.end <= byte);
        return count.checked_sub(1);
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        return self.tokens.len();
    }

    /// Concatenated text of the tokens in `range`.
    pub fn slice_text(&self, range: &RangeInclusive<usize>) -> String {
        let (Some(first), Some(last)) = (self.get(*range.start()), self.get(*range.end())) else {
            return String::new();
        };
        return self
            .source
            .get(first.span.start..last.span.end)
            .unwrap_or("")
            .to_string();
    }

    /// Index of the first token that starts at or after `byte`.
    pub fn token_at(&self, byte: usize) -> Option<usize> {
        let index = self.tokens.partition_point(|t| return t.span.start < byte);
        return (index < self.len()).then_some(index);
    }

    /// The whole source text.
    pub fn source(&self) -> &str {
        return &self.source;
    }

    /// Source text of one token.
    pub fn token_text(&self, token: &Token) -> &str {
        return self.source.get(token.span.clone()).unwrap_or("");
    }

    /// Text of the token at `index`, empty when out of range.
    #[cfg(test)]
    pub fn text(&self, index: usize) -> &str {
        return self.get(index).map_or("", |t| return self.token_text(t));
    }
}

/// Accumulates tokens while filling the gaps between leaves.
struct StreamBuilder<'a> {
    /// Byte offset up to which tokens have been emitted.
    cursor: usize,
    /// Line of the byte at `cursor`.
    line: usize,
    /// Source being tokenized.
    source: &'a str,
    /// Tokens emitted so far.
    tokens: Vec<Token>,
}

impl<'a> StreamBuilder<'a> {
    /// Emit the final gap and return the tokens.
    fn finish(mut self) -> Vec<Token> {
        self.push_gap(self.source.len());
        return self.tokens;
    }

    /// Start at the beginning of `source`.
    const fn new(source: &'a str) -> Self {
        return Self { cursor: 0, line: 1, source, tokens: Vec::new() };
    }

    /// Emit a token for `span` and advance the line counter past it.
    fn push(&mut self, kind: &'static str, span: Range<usize>, channel: Channel) {
        let newlines = self
            .source
            .get(span.clone())
            .map_or(0, |text| return text.matches('\n').count());
        self.tokens.push(Token { channel, kind, line: self.line, span: span.clone() });
        self.line = self.line.saturating_add(newlines);
        self.cursor = span.end;
    }

    /// Emit whatever lies between the cursor and `until` as a synthesized token.
    fn push_gap(&mut self, until: usize) {
        if until <= self.cursor {
            return;
        }
        let span = self.cursor..until;
        let blank = self.source.get(span.clone()).is_some_and(|t| return t.trim().is_empty());
        if blank {
            self.push("whitespace", span, Channel::Hidden);
        } else {
            self.push("text", span, Channel::Default);
        }
    }

    /// Emit a grammar leaf, preceded by the gap before it. Overlapping leaves are clipped.
    fn push_leaf(&mut self, kind: &'static str, span: Range<usize>, channel: Channel) {
        if span.end <= self.cursor {
            return;
        }
        self.push_gap(span.start);
        let start = span.start.max(self.cursor);
        self.push(kind, start..span.end, channel);
    }
}
