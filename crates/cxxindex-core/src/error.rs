use std::path::PathBuf;

/// Unified error type for cxxindex.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
