/// Tree-sitter grammar resolution and declaration node rules by file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;
use crate::types::DeclarationKind;

/// How the name of a declaration node is found.
#[derive(Debug, Clone, Copy)]
pub enum NameRule {
    /// The node's own field (e.g. `name` on a Rust `function_item`).
    Field(&'static str),
    /// A field on any direct child of the given kind. A node with several
    /// such children (e.g. `const a = 1, b = 2`) is addressable by each name.
    Nested {
        /// Kind of the child that binds the name.
        child_kind: &'static str,
        /// Field on that child holding the name.
        field: &'static str,
    },
}

/// One grammar node kind that counts as a declaration.
#[derive(Debug, Clone, Copy)]
pub struct DeclarationRule {
    /// Which of the three declaration kinds this node is.
    pub kind: DeclarationKind,
    /// Tree-sitter node kind.
    pub node_kind: &'static str,
    /// How to read the declaration's name.
    pub name: NameRule,
}

/// A source language the locator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// Go.
    Go,
    /// JavaScript, parsed with the TypeScript grammar.
    JavaScript,
    /// JSX, parsed with the TSX grammar.
    Jsx,
    /// Kotlin and Kotlin script.
    Kotlin,
    /// Rust.
    Rust,
    /// TSX.
    Tsx,
    /// TypeScript.
    TypeScript,
}

/// Kotlin declarations.
const KOTLIN_RULES: &[DeclarationRule] = &[
    rule(DeclarationKind::Class, "class_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Class, "object_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Function, "function_declaration", NameRule::Field("name")),
    rule(
        DeclarationKind::Property,
        "property_declaration",
        NameRule::Nested { child_kind: "variable_declaration", field: "name" },
    ),
];

/// Rust declarations.
const RUST_RULES: &[DeclarationRule] = &[
    rule(DeclarationKind::Class, "enum_item", NameRule::Field("name")),
    rule(DeclarationKind::Class, "mod_item", NameRule::Field("name")),
    rule(DeclarationKind::Class, "struct_item", NameRule::Field("name")),
    rule(DeclarationKind::Class, "trait_item", NameRule::Field("name")),
    rule(DeclarationKind::Class, "union_item", NameRule::Field("name")),
    rule(DeclarationKind::Function, "function_item", NameRule::Field("name")),
    rule(DeclarationKind::Function, "function_signature_item", NameRule::Field("name")),
    rule(DeclarationKind::Property, "const_item", NameRule::Field("name")),
    rule(DeclarationKind::Property, "static_item", NameRule::Field("name")),
];

/// TypeScript, TSX and JavaScript declarations.
const TS_RULES: &[DeclarationRule] = &[
    rule(DeclarationKind::Class, "abstract_class_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Class, "class_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Class, "enum_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Class, "interface_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Function, "function_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Function, "generator_function_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Function, "method_definition", NameRule::Field("name")),
    rule(
        DeclarationKind::Property,
        "lexical_declaration",
        NameRule::Nested { child_kind: "variable_declarator", field: "name" },
    ),
    rule(DeclarationKind::Property, "public_field_definition", NameRule::Field("name")),
    rule(
        DeclarationKind::Property,
        "variable_declaration",
        NameRule::Nested { child_kind: "variable_declarator", field: "name" },
    ),
];

/// Go declarations.
const GO_RULES: &[DeclarationRule] = &[
    rule(
        DeclarationKind::Class,
        "type_declaration",
        NameRule::Nested { child_kind: "type_spec", field: "name" },
    ),
    rule(DeclarationKind::Function, "function_declaration", NameRule::Field("name")),
    rule(DeclarationKind::Function, "method_declaration", NameRule::Field("name")),
    rule(
        DeclarationKind::Property,
        "const_declaration",
        NameRule::Nested { child_kind: "const_spec", field: "name" },
    ),
    rule(
        DeclarationKind::Property,
        "var_declaration",
        NameRule::Nested { child_kind: "var_spec", field: "name" },
    ),
];

/// Shorthand constructor for the rule tables.
const fn rule(kind: DeclarationKind, node_kind: &'static str, name: NameRule) -> DeclarationRule {
    return DeclarationRule { kind, node_kind, name };
}

impl SourceLanguage {
    /// Nodes that may hold a class or function body when the grammar has no `body` field.
    pub const fn body_kinds(self) -> &'static [&'static str] {
        return match self {
            Self::Go => &["field_declaration_list", "interface_type"],
            Self::Kotlin => &["class_body", "enum_class_body", "function_body"],
            Self::JavaScript | Self::Jsx | Self::Rust | Self::Tsx | Self::TypeScript => &[],
        };
    }

    /// Sibling nodes directly above a declaration that belong to it (Rust attributes).
    pub const fn decoration_kinds(self) -> &'static [&'static str] {
        return match self {
            Self::Rust => &["attribute_item"],
            Self::Go | Self::JavaScript | Self::Jsx | Self::Kotlin | Self::Tsx | Self::TypeScript => &[],
        };
    }

    /// Every node kind that is a declaration, with its kind and naming rule.
    pub const fn declaration_rules(self) -> &'static [DeclarationRule] {
        return match self {
            Self::Go => GO_RULES,
            Self::JavaScript | Self::Jsx | Self::Tsx | Self::TypeScript => TS_RULES,
            Self::Kotlin => KOTLIN_RULES,
            Self::Rust => RUST_RULES,
        };
    }

    /// Label used on fenced code blocks.
    pub const fn fence(self) -> &'static str {
        return match self {
            Self::Go => "go",
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::Kotlin => "kotlin",
            Self::Rust => "rust",
            Self::Tsx => "tsx",
            Self::TypeScript => "typescript",
        };
    }

    /// Map a file extension to its language.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedLanguage` for unknown extensions.
    pub fn for_path(path: &Path) -> Result<Self, Error> {
        let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

        return match ext {
            "go" => Ok(Self::Go),
            "js" | "mjs" | "cjs" => Ok(Self::JavaScript),
            "jsx" => Ok(Self::Jsx),
            "kt" | "kts" => Ok(Self::Kotlin),
            "rs" => Ok(Self::Rust),
            "ts" | "mts" | "cts" => Ok(Self::TypeScript),
            "tsx" => Ok(Self::Tsx),
            _ => Err(Error::UnsupportedLanguage {
                ext: ext.to_string(),
            }),
        };
    }

    /// The tree-sitter grammar for this language.
    pub fn grammar(self) -> Language {
        return match self {
            Self::Go => tree_sitter_go::LANGUAGE.into(),
            Self::JavaScript | Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Jsx | Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Kotlin => tree_sitter_kotlin_ng::LANGUAGE.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
        };
    }

    /// Initializer values that make a property an anonymous object initializer.
    pub const fn object_initializer_kinds(self) -> &'static [&'static str] {
        return match self {
            Self::JavaScript | Self::Jsx | Self::Tsx | Self::TypeScript => &["object"],
            Self::Kotlin => &["object_literal"],
            Self::Go | Self::Rust => &[],
        };
    }

    /// Find the declaration rule for a node kind, if it is one.
    pub fn rule_for(self, node_kind: &str) -> Option<&'static DeclarationRule> {
        return self
            .declaration_rules()
            .iter()
            .find(|r| return r.node_kind == node_kind);
    }

    /// Parent nodes that wrap a declaration and belong to it (`export` statements).
    pub const fn wrapper_kinds(self) -> &'static [&'static str] {
        return match self {
            Self::JavaScript | Self::Jsx | Self::Tsx | Self::TypeScript => &["export_statement"],
            Self::Go | Self::Kotlin | Self::Rust => &[],
        };
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::SourceLanguage;
    use crate::error::Error;
    use crate::types::DeclarationKind;

    #[test]
    fn detects_languages_by_extension() {
        assert_eq!(SourceLanguage::for_path(Path::new("src/lib.rs")).unwrap(), SourceLanguage::Rust);
        assert_eq!(SourceLanguage::for_path(Path::new("web/app.tsx")).unwrap(), SourceLanguage::Tsx);
        assert_eq!(SourceLanguage::for_path(Path::new("cmd/main.go")).unwrap(), SourceLanguage::Go);
        assert_eq!(
            SourceLanguage::for_path(Path::new("src/main/kotlin/App.kt")).unwrap(),
            SourceLanguage::Kotlin
        );
        assert_eq!(SourceLanguage::for_path(Path::new("build.gradle.kts")).unwrap(), SourceLanguage::Kotlin);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = SourceLanguage::for_path(Path::new("main.py")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage { ext } if ext == "py"));
    }

    #[test]
    fn kotlin_declarations_map_to_kinds() {
        let lang = SourceLanguage::Kotlin;
        assert_eq!(lang.rule_for("object_declaration").unwrap().kind, DeclarationKind::Class);
        assert_eq!(lang.rule_for("function_declaration").unwrap().kind, DeclarationKind::Function);
        assert_eq!(lang.rule_for("property_declaration").unwrap().kind, DeclarationKind::Property);
        assert_eq!(lang.fence(), "kotlin");
    }

    #[test]
    fn rust_items_map_to_declaration_kinds() {
        let lang = SourceLanguage::Rust;
        assert_eq!(lang.rule_for("struct_item").unwrap().kind, DeclarationKind::Class);
        assert_eq!(lang.rule_for("function_item").unwrap().kind, DeclarationKind::Function);
        assert_eq!(lang.rule_for("static_item").unwrap().kind, DeclarationKind::Property);
        assert!(lang.rule_for("impl_item").is_none());
    }
}
