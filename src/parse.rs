use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{ParseCause, ParseError, Result};

/// A parsed source file. The tree borrows nothing, so both travel together.
pub struct ParsedSource {
    pub source: Vec<u8>,
    pub tree: Tree,
}

/// tree-sitter PHP parser, reused across files of one scan.
pub struct SourceParser {
    parser: Parser,
}

impl SourceParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_php::LANGUAGE_PHP.into())?;
        Ok(Self { parser })
    }

    /// Parses `source`, rejecting trees that contain error or missing nodes.
    pub fn parse(&mut self, source: &[u8]) -> std::result::Result<Tree, ParseCause> {
        let tree = self.parser.parse(source, None).ok_or(ParseCause::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error(root)
                .map(|n| {
                    let pos = n.start_position();
                    (pos.row + 1, pos.column + 1)
                })
                .unwrap_or((1, 1));
            return Err(ParseCause::Syntax { line, column });
        }
        Ok(tree)
    }

    pub fn parse_file(&mut self, path: &Path) -> std::result::Result<ParsedSource, ParseError> {
        let failed = |cause| ParseError {
            file: path.to_path_buf(),
            cause,
        };

        let source = std::fs::read(path).map_err(|e| failed(ParseCause::Read(e)))?;
        let tree = self.parse(&source).map_err(failed)?;
        Ok(ParsedSource { source, tree })
    }
}

fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error()
            && let Some(found) = first_error(child)
        {
            return Some(found);
        }
    }
    None
}

pub(crate) fn node_text<'a>(node: &Node, source: &'a [u8]) -> std::borrow::Cow<'a, str> {
    String::from_utf8_lossy(&source[node.byte_range()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_php() {
        let mut parser = SourceParser::new().unwrap();
        let tree = parser
            .parse(b"<?php\nnamespace App;\n\nfinal class Kernel {}\n")
            .unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn reports_location_of_first_syntax_error() {
        let mut parser = SourceParser::new().unwrap();
        let err = parser
            .parse(b"<?php\nclass Ok {}\nclass Broken {\n    public function (\n")
            .unwrap_err();
        match err {
            ParseCause::Syntax { line, .. } => assert!(line >= 3, "line was {line}"),
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[test]
    fn plain_text_without_php_tag_is_valid() {
        let mut parser = SourceParser::new().unwrap();
        assert!(parser.parse(b"just some html\n").is_ok());
    }

    #[test]
    fn unreadable_file_is_a_parse_error() {
        let mut parser = SourceParser::new().unwrap();
        let err = parser
            .parse_file(Path::new("/definitely/not/here.php"))
            .err()
            .unwrap();
        assert!(matches!(err.cause, ParseCause::Read(_)));
        assert_eq!(err.file, Path::new("/definitely/not/here.php"));
    }
}
