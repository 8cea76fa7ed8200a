//! Tree producer backed by tree-sitter.
//!
//! The grammar is the Java-family grammar the parser stack pins; Groovy's
//! declaration-level constructs (classes, methods, fields, imports, variable
//! declarations) are syntax-compatible with it. A dedicated Groovy grammar
//! can replace this adapter behind [`TreeProducer`] without touching any
//! consumer.

use std::path::Path;

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::error::{NavError, Result};
use crate::position::{tree_span_from_editor, EditorPosition, TreeSpan};
use crate::syntax::{
    Diagnostic, NodeClass, NodeId, ParsedUnit, Severity, SyntaxNodeData, SyntaxTreeBuilder,
    TreeProducer,
};

pub struct GrammarTreeProducer {
    language: tree_sitter::Language,
}

impl GrammarTreeProducer {
    pub fn groovy() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }
}

impl TreeProducer for GrammarTreeProducer {
    fn parse(&self, uri: &str, content: &str) -> Result<ParsedUnit> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| NavError::Parser(format!("failed to set grammar: {e}")))?;

        let script_name = script_name_for(uri);
        let tree = match parser.parse(content, None) {
            Some(tree) => tree,
            None => {
                return Ok(ParsedUnit::empty(
                    &script_name,
                    vec![Diagnostic {
                        severity: Severity::Error,
                        position: EditorPosition::new(0, 0),
                        message: format!("parser produced no tree for {uri}"),
                    }],
                ));
            }
        };

        let mut conversion = Conversion {
            source: content.as_bytes(),
            builder: SyntaxTreeBuilder::new(),
            diagnostics: Vec::new(),
        };
        let root = conversion.convert(tree.root_node(), true, &script_name);

        // The script wrapper is a class in the producer's model; it joins the
        // unit's class list only when the file really is a script, i.e. it
        // has loose top-level statements.
        let top_level = conversion.builder.node(root).children.clone();
        let is_script = top_level.iter().any(|&c| {
            let child = conversion.builder.node(c);
            matches!(child.class, NodeClass::VariableDecl | NodeClass::Other)
                && !matches!(
                    child.kind.as_str(),
                    "package_declaration" | "line_comment" | "block_comment"
                )
        });
        if is_script {
            conversion.builder.mark_class(root);
        }

        let diagnostics = conversion.diagnostics;
        debug!(
            uri,
            diagnostics = diagnostics.len(),
            "parsed compilation unit"
        );
        Ok(ParsedUnit {
            tree: conversion.builder.finish(root),
            diagnostics,
        })
    }
}

fn script_name_for(uri: &str) -> String {
    Path::new(uri)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("script")
        .to_string()
}

struct Conversion<'a> {
    source: &'a [u8],
    builder: SyntaxTreeBuilder,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Conversion<'a> {
    fn convert(&mut self, node: Node<'a>, is_root: bool, script_name: &str) -> NodeId {
        self.collect_diagnostic(node);

        let class = if is_root {
            NodeClass::Script
        } else {
            classify(node.kind())
        };
        let (name, qualified, multi_target) = match class {
            NodeClass::Script => (Some(script_name.to_string()), None, false),
            NodeClass::ClassDecl | NodeClass::MethodDecl => (self.field_name(node), None, false),
            NodeClass::FieldDecl | NodeClass::VariableDecl => self.declarator_name(node),
            NodeClass::Import => self.import_name(node),
            NodeClass::Identifier | NodeClass::TypeRef => (self.text(node), None, false),
            NodeClass::Other => (None, None, false),
        };

        // The script wrapper is synthetic: it has no declaration of its own
        // in the source, so it carries no real position and is never indexed.
        let span = if is_root {
            TreeSpan::SYNTHETIC
        } else {
            span_of(node)
        };

        let id = self.builder.push(SyntaxNodeData {
            kind: node.kind().to_string(),
            class,
            name,
            qualified,
            multi_target,
            span,
            children: Vec::new(),
        });
        if class == NodeClass::ClassDecl {
            self.builder.mark_class(id);
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        for child in children {
            let child_id = self.convert(child, false, script_name);
            self.builder.add_child(id, child_id);
        }
        id
    }

    fn collect_diagnostic(&mut self, node: Node<'a>) {
        if node.is_error() {
            let start = node.start_position();
            self.diagnostics.push(Diagnostic {
                severity: Severity::Error,
                position: EditorPosition::new(start.row as u32, start.column as u32),
                message: format!("syntax error near '{}'", self.snippet(node)),
            });
        } else if node.is_missing() {
            let start = node.start_position();
            self.diagnostics.push(Diagnostic {
                severity: Severity::Error,
                position: EditorPosition::new(start.row as u32, start.column as u32),
                message: format!("missing '{}'", node.kind()),
            });
        }
    }

    fn snippet(&self, node: Node<'a>) -> String {
        let text = self.text(node).unwrap_or_default();
        text.chars().take(24).collect()
    }

    fn text(&self, node: Node<'a>) -> Option<String> {
        node.utf8_text(self.source).ok().map(|s| s.to_string())
    }

    fn field_name(&self, node: Node<'a>) -> Option<String> {
        node.child_by_field_name("name")
            .and_then(|n| self.text(n))
    }

    /// Left-hand target of a declaration. Declarations with more than one
    /// target are reported as multi-target and left nameless; the symbol
    /// table skips them.
    fn declarator_name(&self, node: Node<'a>) -> (Option<String>, Option<String>, bool) {
        let mut cursor = node.walk();
        let declarators: Vec<Node<'a>> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        match declarators.as_slice() {
            [single] => (
                single
                    .child_by_field_name("name")
                    .and_then(|n| self.text(n)),
                None,
                false,
            ),
            [] => (None, None, false),
            _ => (None, None, true),
        }
    }

    /// Imports declare the last segment of the imported path; wildcard
    /// imports declare nothing.
    fn import_name(&self, node: Node<'a>) -> (Option<String>, Option<String>, bool) {
        let mut cursor = node.walk();
        let mut wildcard = false;
        let mut target: Option<String> = None;
        for child in node.children(&mut cursor) {
            match child.kind() {
                "asterisk" => wildcard = true,
                "scoped_identifier" | "identifier" => target = self.text(child),
                _ => {}
            }
        }
        let qualified = target.clone();
        if wildcard {
            return (None, qualified, false);
        }
        let name = target.and_then(|t| t.rsplit('.').next().map(|s| s.to_string()));
        (name, qualified, false)
    }
}

fn classify(kind: &str) -> NodeClass {
    match kind {
        "class_declaration"
        | "interface_declaration"
        | "enum_declaration"
        | "record_declaration"
        | "annotation_type_declaration" => NodeClass::ClassDecl,
        "method_declaration" | "constructor_declaration" => NodeClass::MethodDecl,
        "field_declaration" => NodeClass::FieldDecl,
        "local_variable_declaration" => NodeClass::VariableDecl,
        "import_declaration" => NodeClass::Import,
        "identifier" => NodeClass::Identifier,
        "type_identifier" | "scoped_type_identifier" => NodeClass::TypeRef,
        _ => NodeClass::Other,
    }
}

fn span_of(node: Node<'_>) -> TreeSpan {
    let start = node.start_position();
    let end = node.end_position();
    tree_span_from_editor(
        EditorPosition::new(start.row as u32, start.column as u32),
        EditorPosition::new(end.row as u32, end.column as u32),
    )
}
