//! Doc-comment classification and positional aggregation.
//!
//! Attribution is positional, not structural: a comment belongs to the
//! entity it immediately precedes in the token stream, with at most one
//! line of gap. A blank line breaks the association.

use cxxindex_core::ExtractOptions;
use tree_sitter::Node;

/// Comment prefixes that mark Doxygen-style documentation.
pub const DOC_COMMENT_PREFIXES: [&str; 4] = ["/**", "///", "//!", "/*!"];

const COMMENT_NODE: &str = "comment";

/// Whether a comment's source text is a documentation comment.
pub fn is_doc_comment(comment_text: &str) -> bool {
    let stripped = comment_text.trim_start();
    DOC_COMMENT_PREFIXES
        .iter()
        .any(|prefix| stripped.starts_with(prefix))
}

/// Collect the raw texts of all comments immediately preceding `node`,
/// in source order.
///
/// Walks named previous siblings backward; stops at the first non-comment
/// sibling or a blank-line gap. Plain (non-doc) comments in the adjacent
/// run are collected too: interleaved `// TODO` lines are part of the same
/// block, and an all-plain block is still informal documentation.
pub fn collect_preceding_comments(node: Node, source: &[u8]) -> Vec<String> {
    let mut collected = Vec::new();
    let mut expected_row = node.start_position().row;
    let mut sibling = node.prev_named_sibling();

    while let Some(prev) = sibling {
        if prev.kind() != COMMENT_NODE {
            break;
        }
        let gap = expected_row.saturating_sub(prev.end_position().row);
        if gap > 1 {
            break;
        }
        collected.push(String::from_utf8_lossy(&source[prev.byte_range()]).into_owned());
        expected_row = prev.start_position().row;
        sibling = prev.prev_named_sibling();
    }

    collected.reverse();
    collected
}

/// Strip comment delimiters from one comment's text.
///
/// Removes line markers (`///`, `//!`, `//`), block openers (`/**`, `/*!`,
/// `/*`) on the first line, the trailing `*/`, and leading continuation
/// `*` on inner lines. Blank lines are dropped.
pub fn clean_comment_text(comment_text: &str) -> String {
    let mut cleaned = Vec::new();

    for (idx, line) in comment_text.lines().enumerate() {
        let mut text = line.trim();

        if idx == 0 {
            for prefix in ["///", "//!", "/**", "/*!"] {
                if let Some(rest) = text.strip_prefix(prefix) {
                    text = rest;
                    break;
                }
            }
            if let Some(rest) = text.strip_prefix("//").or_else(|| text.strip_prefix("/*")) {
                text = rest;
            }
        } else {
            for prefix in ["///", "//!", "//"] {
                if let Some(rest) = text.strip_prefix(prefix) {
                    text = rest;
                    break;
                }
            }
        }

        let mut text = text.trim();
        if let Some(rest) = text.strip_suffix("*/") {
            text = rest.trim_end();
        }
        if let Some(rest) = text.strip_prefix('*') {
            text = rest.trim_start();
        }

        if !text.is_empty() {
            cleaned.push(text.to_string());
        }
    }

    cleaned.join("\n")
}

/// Build the docstring for an entity whose outer node is `node`.
///
/// Raw comment texts are joined with a single newline. Under
/// `normalize_docstrings` each comment is delimiter-stripped first; a
/// docstring that cleans down to nothing becomes `None`.
pub fn docstring_for(node: Node, source: &[u8], options: &ExtractOptions) -> Option<String> {
    let comments = collect_preceding_comments(node, source);
    if comments.is_empty() {
        return None;
    }

    if options.normalize_docstrings {
        let cleaned: Vec<String> = comments
            .iter()
            .map(|c| clean_comment_text(c))
            .filter(|c| !c.is_empty())
            .collect();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.join("\n"))
        }
    } else {
        Some(comments.join("\n"))
    }
}
