use tree_sitter::Node;

use crate::error::Error;
use crate::grammar::{DeclarationRule, NameRule, SourceLanguage};
use crate::source::SourceParser;
use crate::tokens::TokenStream;
use crate::types::{Declaration, DeclarationKind, DeclarationSummary};

/// A raw declaration found while walking the CST.
struct Found<'tree> {
    /// Node that carries the name: the declaration itself or a declarator child.
    carrier: Node<'tree>,
    /// Declaration kind from the grammar rule.
    kind: DeclarationKind,
    /// Declared name.
    name: String,
    /// The declaration node.
    node: Node<'tree>,
}

/// Walk the whole tree in pre-order and collect every named declaration.
fn collect_declarations<'tree>(
    root: Node<'tree>,
    source: &str,
    language: SourceLanguage,
) -> Vec<Found<'tree>> {
    let mut declarations = Vec::new();
    visit(root, source, language, &mut declarations);
    return declarations;
}

/// Pre-order visit: a node is recorded before any declaration nested inside it.
fn visit<'tree>(
    node: Node<'tree>,
    source: &str,
    language: SourceLanguage,
    declarations: &mut Vec<Found<'tree>>,
) {
    if let Some(rule) = language.rule_for(node.kind()) {
        for (name, carrier) in declaration_names(node, rule, source) {
            declarations.push(Found { carrier, kind: rule.kind, name, node });
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, source, language, declarations);
    }
}

/// Node kinds that hold a bare name when the grammar gives it no field.
const IDENTIFIER_KINDS: &[&str] = &["identifier", "simple_identifier", "type_identifier"];

/// Read the names a declaration node binds, with the node carrying each name.
fn declaration_names<'tree>(
    node: Node<'tree>,
    rule: &DeclarationRule,
    source: &str,
) -> Vec<(String, Node<'tree>)> {
    match rule.name {
        NameRule::Field(field) => {
            return name_of(node, field, source)
                .map(|name| return vec![(name, node)])
                .unwrap_or_default();
        },
        NameRule::Nested { child_kind, field } => {
            let mut cursor = node.walk();
            return node
                .children(&mut cursor)
                .filter(|c| return c.kind() == child_kind)
                .filter_map(|c| return name_of(c, field, source).map(|name| return (name, c)))
                .collect();
        },
    }
}

/// Text of `node`'s `field`, or of its first identifier child when the
/// grammar leaves the name unlabeled (Kotlin variable declarations).
fn name_of(node: Node<'_>, field: &str, source: &str) -> Option<String> {
    let named = node.child_by_field_name(field).or_else(|| {
        let mut cursor = node.walk();
        return node
            .children(&mut cursor)
            .find(|c| return IDENTIFIER_KINDS.contains(&c.kind()));
    })?;
    return named.utf8_text(source.as_bytes()).ok().map(String::from);
}

/// First node of one of `kinds` below `node`, in pre-order.
fn find_descendant<'tree>(node: Node<'tree>, kinds: &[&str]) -> Option<Node<'tree>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, kinds) {
            return Some(found);
        }
    }
    return None;
}

/// The node a declaration's extent is measured on: itself, or the wrapper
/// (an `export` statement) it is the payload of.
fn outer_node(node: Node<'_>, language: SourceLanguage) -> Node<'_> {
    let mut outer = node;
    while let Some(parent) = outer.parent()
        && language.wrapper_kinds().contains(&parent.kind())
    {
        outer = parent;
    }
    return outer;
}

/// Start byte including attribute siblings directly above the declaration.
/// Comments between attributes do not break the run.
fn decorated_start(outer: Node<'_>, language: SourceLanguage) -> usize {
    let decorations = language.decoration_kinds();
    let mut start = outer.start_byte();
    let mut sibling = outer.prev_sibling();

    while let Some(node) = sibling {
        if decorations.contains(&node.kind()) {
            start = node.start_byte();
        } else if !node.kind().contains("comment") {
            break;
        }
        sibling = node.prev_sibling();
    }
    return start;
}

/// Body of a class or function: the `body` field, or a language-specific body node.
fn body_node(node: Node<'_>, language: SourceLanguage) -> Option<Node<'_>> {
    return node
        .child_by_field_name("body")
        .or_else(|| return find_descendant(node, language.body_kinds()));
}

/// Where a body opens: its own `{` child when the body node starts earlier
/// (a Go `interface` keyword), else the body's first byte.
fn body_start_byte(body: Node<'_>) -> usize {
    let mut cursor = body.walk();
    return body
        .children(&mut cursor)
        .find(|c| return c.kind() == "{")
        .map_or(body.start_byte(), |brace| return brace.start_byte());
}

/// The anonymous object a property is initialized with. The value is the
/// carrier's `value` field, or whatever follows the declaration's `=`; any
/// wrapper nodes starting at the same byte are looked through.
fn object_value<'tree>(found: &Found<'tree>, language: SourceLanguage) -> Option<Node<'tree>> {
    let value = found.carrier.child_by_field_name("value").or_else(|| {
        let mut cursor = found.node.walk();
        let assign = found.node.children(&mut cursor).find(|c| return c.kind() == "=")?;
        return assign.next_named_sibling();
    })?;

    let kinds = language.object_initializer_kinds();
    let mut current = value;
    while !kinds.contains(&current.kind()) {
        current = current
            .named_child(0)
            .filter(|c| return c.start_byte() == value.start_byte())?;
    }
    return Some(current);
}

/// Convert a found node into token indices.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the node falls outside the token stream.
fn to_declaration(
    found: &Found<'_>,
    tokens: &TokenStream,
    language: SourceLanguage,
    parser: &SourceParser,
) -> Result<Declaration, Error> {
    let outside = || {
        return Error::ParseFailed {
            file: parser.path().to_path_buf(),
            reason: format!("declaration `{}` lies outside the token stream", found.name),
        };
    };

    let outer = outer_node(found.node, language);
    let start_token = tokens.token_at(decorated_start(outer, language)).ok_or_else(outside)?;
    let stop_token = tokens.last_token_ending_at(outer.end_byte()).ok_or_else(outside)?;
    let line = tokens.get(start_token).map_or(1, |t| return t.line);

    let (body_start_token, object_initializer) = match found.kind {
        DeclarationKind::Class | DeclarationKind::Function => {
            let body = body_node(found.node, language)
                .and_then(|b| return tokens.token_at(body_start_byte(b)));
            (body, None)
        },
        DeclarationKind::Property => {
            let object = object_value(found, language).and_then(|v| return tokens.token_at(v.start_byte()));
            (None, object)
        },
    };

    return Ok(Declaration {
        body_start_token,
        kind: found.kind,
        line,
        name: found.name.clone(),
        object_initializer,
        start_token,
        stop_token,
    });
}

/// List every addressable declaration in a parsed file, in pre-order.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if a declaration falls outside the token stream.
pub fn list_declarations(parser: &SourceParser) -> Result<Vec<DeclarationSummary>, Error> {
    let tokens = parser.tokens();
    let language = parser.language();
    let found = collect_declarations(parser.tree().root_node(), tokens.source(), language);

    return found
        .iter()
        .map(|f| {
            let declaration = to_declaration(f, tokens, language, parser)?;
            return Ok(DeclarationSummary {
                kind: declaration.kind,
                line: declaration.line,
                name: declaration.name,
            });
        })
        .collect();
}

/// Find the declaration named `identifier`.
///
/// Matching is by bare name only: nesting and signatures are ignored. When
/// several declarations share the name, the first in pre-order wins.
///
/// # Errors
///
/// Returns `Error::DeclarationNotFound` if nothing matches, with every
/// declaration name in the file as `available`.
pub fn locate(parser: &SourceParser, identifier: &str) -> Result<Declaration, Error> {
    let tokens = parser.tokens();
    let language = parser.language();
    let found = collect_declarations(parser.tree().root_node(), tokens.source(), language);

    let mut matches = found.iter().filter(|f| return f.name == identifier);
    let Some(first) = matches.next() else {
        let mut available: Vec<String> = found.iter().map(|f| return f.name.clone()).collect();
        available.dedup();
        return Err(Error::DeclarationNotFound {
            available,
            file: parser.path().to_path_buf(),
            identifier: identifier.to_string(),
        });
    };

    let others = matches.count();
    if others > 0 {
        tracing::warn!(
            file = %parser.path().display(),
            identifier,
            matches = others.saturating_add(1),
            "ambiguous identifier, using the first declaration"
        );
    }

    return to_declaration(first, tokens, language, parser);
}
