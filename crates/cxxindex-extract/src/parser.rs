//! Tree-sitter C++ parser ownership and file parsing.
//!
//! Syntax errors never fail a parse: tree-sitter produces a tree with
//! error nodes and downstream traversal extracts whatever is intact.

use std::path::Path;

use cxxindex_core::IndexError;
use tree_sitter::{Node, Parser, Tree};

/// Owns a reusable tree-sitter parser configured for C++.
///
/// Single-thread-owned; callers running files in parallel hold one
/// `CppParser` per worker.
pub struct CppParser {
    parser: Parser,
}

impl CppParser {
    /// Create a parser configured with the C++ grammar.
    ///
    /// The only failure mode is a grammar/ABI version mismatch.
    pub fn new() -> Result<Self, IndexError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|e| IndexError::Parser(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parse raw bytes of C++ source.
    ///
    /// Ill-formed input still yields a tree; its error regions are marked
    /// with error nodes rather than failing the call.
    pub fn parse_bytes(&mut self, source: &[u8]) -> Result<Tree, IndexError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| IndexError::Parser("parser produced no tree".to_string()))?;
        if tree.root_node().has_error() {
            tracing::warn!("Parsed tree contains syntax errors");
        }
        Ok(tree)
    }

    /// Read a file in binary mode and parse it.
    ///
    /// Fails only on file-system errors; syntax errors are tolerated as in
    /// [`CppParser::parse_bytes`].
    pub fn parse_file(&mut self, path: &Path) -> Result<(Tree, Vec<u8>), IndexError> {
        let source = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IndexError::FileNotFound(path.to_path_buf())
            } else {
                IndexError::Io(e)
            }
        })?;
        let tree = self.parse_bytes(&source)?;
        if tree.root_node().has_error() {
            tracing::warn!("File {} contains syntax errors", path.display());
        }
        Ok((tree, source))
    }
}

/// Count error and missing nodes in a parsed tree.
///
/// Feeds the `parse_errors` counter in extraction statistics.
pub fn count_error_nodes(tree: &Tree) -> usize {
    fn walk(node: Node) -> usize {
        let mut count = usize::from(node.is_error() || node.is_missing());
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            count += walk(child);
        }
        count
    }
    walk(tree.root_node())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_source() {
        let mut parser = CppParser::new().unwrap();
        let tree = parser.parse_bytes(b"int main() { return 0; }").unwrap();
        assert_eq!(tree.root_node().kind(), "translation_unit");
        assert!(!tree.root_node().has_error());
        assert_eq!(count_error_nodes(&tree), 0);
    }

    #[test]
    fn parse_broken_source_yields_error_nodes_not_failure() {
        let mut parser = CppParser::new().unwrap();
        let tree = parser.parse_bytes(b"void broken( {").unwrap();
        assert!(tree.root_node().has_error());
        assert!(count_error_nodes(&tree) > 0);
    }

    #[test]
    fn parse_empty_source() {
        let mut parser = CppParser::new().unwrap();
        let tree = parser.parse_bytes(b"").unwrap();
        assert_eq!(tree.root_node().kind(), "translation_unit");
        assert_eq!(tree.root_node().named_child_count(), 0);
    }

    #[test]
    fn parser_is_reusable_across_files() {
        let mut parser = CppParser::new().unwrap();
        let first = parser.parse_bytes(b"void a() {}").unwrap();
        let second = parser.parse_bytes(b"void b() {}").unwrap();
        assert!(!first.root_node().has_error());
        assert!(!second.root_node().has_error());
    }

    #[test]
    fn parse_file_missing_is_file_not_found() {
        let mut parser = CppParser::new().unwrap();
        let result = parser.parse_file(Path::new("/nonexistent/cxxindex/file.cpp"));
        assert!(matches!(result, Err(IndexError::FileNotFound(_))));
    }

    #[test]
    fn parse_file_reads_bytes_back() {
        let dir = std::env::temp_dir().join("cxxindex_parser_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ok.cpp");
        std::fs::write(&path, b"void ok() {}").unwrap();

        let mut parser = CppParser::new().unwrap();
        let (tree, source) = parser.parse_file(&path).unwrap();
        assert_eq!(source, b"void ok() {}");
        assert!(!tree.root_node().has_error());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
