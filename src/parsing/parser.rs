//! Parser adapter over tree-sitter
//!
//! Turns file bytes into a [`SyntaxTree`]. Comments are blanked out before
//! parsing so the tree only sees code, while every byte offset, line and
//! column still refers to the file on disk.

use super::Language;
use super::text::strip_comments;
use crate::error::{ParseError, ParseResult};
use tree_sitter::{Node, Parser, Tree};

/// A parsed file: the tree plus the text it was parsed from.
///
/// Holds no borrowed nodes, so it can be moved between threads. Nodes
/// obtained from [`SyntaxTree::root`] borrow the tree and are not `Send`.
pub struct SyntaxTree {
    tree: Tree,
    /// Comment-stripped text; node byte ranges index into this
    source: String,
    /// The file as read, used for UTF-16 position conversion
    original: String,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Text of `node` in the comment-stripped source
    pub fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("bytes", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

/// Reusable tree-sitter parser for one language
pub struct SyntaxParser {
    parser: Parser,
    language: Language,
}

impl std::fmt::Debug for SyntaxParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxParser")
            .field("language", &self.language.name())
            .finish()
    }
}

impl SyntaxParser {
    pub fn new(language: Language) -> ParseResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| ParseError::ParserInit {
                language: language.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { parser, language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse raw file bytes.
    ///
    /// Fails on invalid UTF-8, and on syntax errors that leave no top-level
    /// type declaration intact, reporting the first error node's zero-based
    /// position. Broken declarations next to intact ones are left for the
    /// extractor to skip.
    pub fn parse(&mut self, bytes: &[u8]) -> ParseResult<SyntaxTree> {
        let original = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
        self.parse_str(original)
    }

    pub fn parse_str(&mut self, original: &str) -> ParseResult<SyntaxTree> {
        let source = strip_comments(original);
        let tree = self.parser.parse(&source, None).ok_or(ParseError::NoTree)?;

        let root = tree.root_node();
        if root.has_error() && !has_intact_declaration(root, self.language.declaration_kinds()) {
            let error_node = first_error(root).unwrap_or(root);
            let point = error_node.start_position();
            let reason = if error_node.is_missing() {
                format!("missing {}", error_node.kind())
            } else {
                format!("unexpected {}", error_node.kind())
            };
            return Err(ParseError::Syntax {
                line: point.row as u32,
                column: point.column as u32,
                reason,
            });
        }

        Ok(SyntaxTree {
            tree,
            source,
            original: original.to_string(),
        })
    }
}

/// Some top-level type declaration parsed without errors
fn has_intact_declaration(root: Node<'_>, kinds: &[&str]) -> bool {
    let mut cursor = root.walk();
    root.named_children(&mut cursor)
        .any(|child| kinds.contains(&child.kind()) && !child.has_error())
}

/// Depth-first search for the first ERROR or MISSING node
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}
