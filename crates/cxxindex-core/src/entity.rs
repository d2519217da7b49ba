//! Entity and statistics records produced by structural extraction.

use serde::{Deserialize, Serialize};

/// The syntactic kind of an extracted C++ entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Class,
    Struct,
    Function,
}

impl EntityType {
    /// The tag string used in Global URIs and serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "Class",
            Self::Struct => "Struct",
            Self::Function => "Function",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted C++ entity (class, struct, or function).
///
/// Records are constructed once during traversal and never mutated
/// afterwards; the caller owns the collected stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Unique identifier: `RepoName::FilePath::EntityType::EntityName`.
    pub global_uri: String,
    /// Repository name supplied by the caller.
    pub repo_name: String,
    /// Path relative to the repository root, forward slashes.
    pub file_path: String,
    /// Syntactic kind of the entity.
    pub entity_type: EntityType,
    /// Canonical qualified name (e.g. `outer::inner::Name`).
    pub entity_name: String,
    /// Adjacent documentation comments, or `None` when absent.
    pub docstring: Option<String>,
    /// Exact source text of the outer node, including any `template<...>` prefix.
    pub code_text: String,
    /// 1-indexed first line of the outer node.
    pub start_line: usize,
    /// 1-indexed last line of the outer node.
    pub end_line: usize,
    /// Whether the entity is wrapped in a `template<...>` declaration.
    pub is_templated: bool,
}

/// Counters for one extraction run. Monotonic; never reset mid-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Files successfully parsed and traversed.
    pub files_processed: usize,
    /// Files that failed with an I/O or input error.
    pub files_failed: usize,
    /// Total entities emitted across all files.
    pub entities_extracted: usize,
    /// Total syntax-error nodes observed across all parsed trees.
    pub parse_errors: usize,
}

impl std::fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ExtractionStats(processed={}, failed={}, entities={}, parse_errors={})",
            self.files_processed, self.files_failed, self.entities_extracted, self.parse_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entity() -> ExtractedEntity {
        ExtractedEntity {
            global_uri: "repo::src/foo.cpp::Function::foo".to_string(),
            repo_name: "repo".to_string(),
            file_path: "src/foo.cpp".to_string(),
            entity_type: EntityType::Function,
            entity_name: "foo".to_string(),
            docstring: None,
            code_text: "void foo() {}".to_string(),
            start_line: 1,
            end_line: 1,
            is_templated: false,
        }
    }

    #[test]
    fn entity_type_display_matches_uri_tags() {
        assert_eq!(EntityType::Class.to_string(), "Class");
        assert_eq!(EntityType::Struct.to_string(), "Struct");
        assert_eq!(EntityType::Function.to_string(), "Function");
    }

    #[test]
    fn entity_serializes_with_contract_field_names() {
        let value = serde_json::to_value(sample_entity()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "global_uri",
            "repo_name",
            "file_path",
            "entity_type",
            "entity_name",
            "docstring",
            "code_text",
            "start_line",
            "end_line",
            "is_templated",
        ] {
            assert!(obj.contains_key(key), "missing field {key}");
        }
        assert_eq!(obj["entity_type"], "Function");
        assert_eq!(obj["docstring"], serde_json::Value::Null);
    }

    #[test]
    fn entity_roundtrips_through_json() {
        let entity = sample_entity();
        let json = serde_json::to_string(&entity).unwrap();
        let back: ExtractedEntity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn stats_default_is_zeroed() {
        let stats = ExtractionStats::default();
        assert_eq!(stats.files_processed, 0);
        assert_eq!(stats.files_failed, 0);
        assert_eq!(stats.entities_extracted, 0);
        assert_eq!(stats.parse_errors, 0);
    }

    #[test]
    fn stats_display_is_stable() {
        let stats = ExtractionStats {
            files_processed: 3,
            files_failed: 1,
            entities_extracted: 12,
            parse_errors: 2,
        };
        assert_eq!(
            stats.to_string(),
            "ExtractionStats(processed=3, failed=1, entities=12, parse_errors=2)"
        );
    }
}
