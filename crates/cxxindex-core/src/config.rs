//! Persistent extraction options.
//!
//! Loads/saves a TOML config at `~/.cxxindex/config.toml`. Every option has
//! a default, so a partial file (or no file at all) is always valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::IndexError;

/// Policy switches for entity extraction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Extract declaration-only function prototypes everywhere.
    pub include_declarations: bool,
    /// Extract declaration-only function prototypes inside `extern "C"`
    /// (and other linkage-specification) bodies.
    pub extern_c_declarations: bool,
    /// Append a signature-hash token to the URIs of same-name function
    /// overloads. Off by default: colliding overload URIs are part of the
    /// identity contract with the semantic layer.
    pub disambiguate_overloads: bool,
    /// Strip comment delimiters (`///`, `/** */`, leading `*`) from
    /// docstrings instead of preserving raw text.
    pub normalize_docstrings: bool,
    /// In directory mode, log per-file failures and keep going instead of
    /// propagating the first error.
    pub continue_on_error: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_declarations: false,
            extern_c_declarations: false,
            disambiguate_overloads: false,
            normalize_docstrings: false,
            continue_on_error: true,
        }
    }
}

impl ExtractOptions {
    /// Load options from the given TOML file.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| IndexError::Config(e.to_string()))
    }

    /// Save options to the given TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| IndexError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the default path, or return defaults if the file doesn't exist.
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Default config path: `~/.cxxindex/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cxxindex")
            .join("config.toml")
    }
}
