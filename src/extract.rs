//! Declaration extraction from a parsed PHP file.
//!
//! Only the top-level statement list is visited, plus the bodies of braced
//! namespace blocks. Declarations inside functions, conditionals or
//! expressions (anonymous classes included) are never reported.

use std::path::Path;
use tree_sitter::Node;

use crate::declaration::{Declaration, qualify};
use crate::kind::{DeclarationKind, KindMask};
use crate::parse::{ParsedSource, node_text};

#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    mask: KindMask,
}

impl Extractor {
    pub fn new(mask: KindMask) -> Self {
        Self { mask }
    }

    /// Returns the file's declarations in source order.
    pub fn extract(&self, file: &Path, parsed: &ParsedSource) -> Vec<Declaration> {
        let mut walk = FileWalk {
            mask: self.mask,
            file,
            source: &parsed.source,
            namespace: None,
            found: Vec::new(),
        };
        walk.statements(parsed.tree.root_node());
        walk.found
    }
}

struct FileWalk<'a> {
    mask: KindMask,
    file: &'a Path,
    source: &'a [u8],
    namespace: Option<String>,
    found: Vec<Declaration>,
}

impl FileWalk<'_> {
    fn statements(&mut self, parent: Node) {
        let mut cursor = parent.walk();
        for child in parent.named_children(&mut cursor) {
            if child.kind() == "namespace_definition" {
                self.namespace_definition(child);
            } else if let Some(kind) = DeclarationKind::from_node_kind(child.kind()) {
                self.declaration(child, kind);
            }
        }
    }

    fn namespace_definition(&mut self, node: Node) {
        let name = node
            .child_by_field_name("name")
            .or_else(|| first_child_of_kind(node, "namespace_name"))
            .map(|n| strip_whitespace(&node_text(&n, self.source)))
            .filter(|n| !n.is_empty());

        // Last namespace seen wins, including for statements after a block.
        self.namespace = name;

        if let Some(body) = node.child_by_field_name("body") {
            self.statements(body);
        }
    }

    fn declaration(&mut self, node: Node, kind: DeclarationKind) {
        if !self.mask.includes(kind) {
            return;
        }
        let Some(name_node) = node
            .child_by_field_name("name")
            .or_else(|| first_child_of_kind(node, "name"))
        else {
            return;
        };
        let local = strip_whitespace(&node_text(&name_node, self.source));
        if local.is_empty() {
            return;
        }

        let name = qualify(self.namespace.as_deref(), &local);
        self.found.push(Declaration::new(
            name,
            kind,
            self.file,
            node.start_position().row + 1,
        ));
    }
}

fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == kind {
            return Some(child);
        }
    }
    None
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
