//! cxxindex-extract: Tree-sitter based structural entity extraction from
//! C++ sources.
//!
//! Converts a directory of C++ files into a deterministic stream of
//! [`ExtractedEntity`](cxxindex_core::ExtractedEntity) records (classes,
//! structs, and functions with their adjacent documentation), keyed by the
//! Global URI contract from `cxxindex-core`.
//!
//! # Architecture
//!
//! - **parser** — owns the reusable tree-sitter C++ parser; tolerates
//!   syntax errors as error nodes rather than failures
//! - **names** — canonical entity names from declarator subtrees
//!   (qualified ids, destructors, operators, conversion operators)
//! - **comment** — doc-comment classification and positional aggregation
//! - **traversal** — tree walk under a namespace-context stack; applies
//!   the extraction filters and builds records
//! - **walker** — directory discovery, per-file orchestration, statistics,
//!   and record serialization

pub mod comment;
pub mod names;
pub mod parser;
pub mod traversal;
pub mod walker;

pub use parser::{count_error_nodes, CppParser};
pub use traversal::extract_entities_from_tree;
pub use walker::{
    discover_cpp_files, extract_directory, extract_file, extract_to_records, write_jsonl,
    CPP_EXTENSIONS, EXCLUDED_DIRS,
};
