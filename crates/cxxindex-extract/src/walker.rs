//! Directory discovery and extraction orchestration.
//!
//! Walks a source tree, filters C++ files, drives per-file extraction,
//! and aggregates run statistics. Discovered files are sorted by
//! repo-relative path so runs over an unchanged tree produce
//! byte-identical output streams.

use std::io::Write;
use std::path::{Path, PathBuf};

use cxxindex_core::{ExtractOptions, ExtractedEntity, ExtractionStats, IndexError};
use ignore::WalkBuilder;

use crate::parser::{count_error_nodes, CppParser};
use crate::traversal::extract_entities_from_tree;

/// File extensions treated as C++ sources.
pub const CPP_EXTENSIONS: [&str; 6] = ["cpp", "cc", "cxx", "h", "hpp", "hxx"];

/// Directory names never descended into.
pub const EXCLUDED_DIRS: [&str; 8] = [
    ".git",
    "build",
    "cmake-build-debug",
    "cmake-build-release",
    "node_modules",
    ".vscode",
    ".idea",
    "__pycache__",
];

fn is_cpp_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CPP_EXTENSIONS.contains(&ext))
}

/// Compute the repo-relative path with forward slashes.
///
/// Falls back to the absolute path (slash-normalized) when the file lies
/// outside the repo root.
fn repo_relative_path(path: &Path, repo_root: &Path) -> String {
    match path.strip_prefix(repo_root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => {
            tracing::warn!(
                "Cannot compute relative path for {} from {}; using absolute path",
                path.display(),
                repo_root.display()
            );
            path.to_string_lossy().replace('\\', "/")
        }
    }
}

struct FileDiagnostics {
    entities: Vec<ExtractedEntity>,
    parse_error_count: usize,
}

fn extract_file_with_diagnostics(
    parser: &mut CppParser,
    path: &Path,
    repo_name: &str,
    repo_root: &Path,
    options: &ExtractOptions,
) -> Result<FileDiagnostics, IndexError> {
    if !path.is_file() {
        return Err(IndexError::FileNotFound(path.to_path_buf()));
    }
    if !is_cpp_extension(path) {
        return Err(IndexError::InvalidInput(format!(
            "{} is not a C++ source file (expected one of {:?})",
            path.display(),
            CPP_EXTENSIONS
        )));
    }

    let relative_path = repo_relative_path(path, repo_root);
    tracing::debug!("Extracting entities from {relative_path}");

    let (tree, source) = parser.parse_file(path)?;
    let parse_error_count = count_error_nodes(&tree);
    if parse_error_count > 0 {
        tracing::warn!(
            "File {} contains syntax errors ({} error nodes)",
            relative_path,
            parse_error_count
        );
    }

    let entities = extract_entities_from_tree(&tree, &source, repo_name, &relative_path, options);
    tracing::debug!("Extracted {} entities from {}", entities.len(), relative_path);

    Ok(FileDiagnostics {
        entities,
        parse_error_count,
    })
}

fn check_repo_name(repo_name: &str) -> Result<(), IndexError> {
    if repo_name.is_empty() {
        return Err(IndexError::InvalidInput("repo_name is empty".to_string()));
    }
    Ok(())
}

/// Extract all entities from a single C++ source file.
///
/// `repo_root` defaults to the file's parent directory. Syntax errors in
/// the source never fail the call; only file-system and input errors do.
pub fn extract_file(
    path: &Path,
    repo_name: &str,
    repo_root: Option<&Path>,
    options: &ExtractOptions,
) -> Result<Vec<ExtractedEntity>, IndexError> {
    check_repo_name(repo_name)?;

    let resolved_root = match repo_root {
        Some(root) => root.to_path_buf(),
        None => path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut parser = CppParser::new()?;
    let diagnostics =
        extract_file_with_diagnostics(&mut parser, path, repo_name, &resolved_root, options)?;
    Ok(diagnostics.entities)
}

/// Recursively discover all C++ source files under `directory`, sorted by
/// repo-relative path.
///
/// Returns `(relative_path, absolute_path)` pairs. Standard gitignore
/// filtering is disabled so discovery is deterministic regardless of
/// repository state; exclusion is driven solely by [`EXCLUDED_DIRS`].
pub fn discover_cpp_files(
    directory: &Path,
    repo_root: &Path,
) -> Result<Vec<(String, PathBuf)>, IndexError> {
    if !directory.is_dir() {
        return Err(IndexError::FileNotFound(directory.to_path_buf()));
    }

    let walker = WalkBuilder::new(directory)
        .standard_filters(false)
        .filter_entry(|entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                let name = entry.file_name().to_string_lossy();
                !EXCLUDED_DIRS.iter().any(|dir| *dir == name)
            } else {
                true
            }
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!("Walk error: {err}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.into_path();
        if is_cpp_extension(&path) {
            let relative = repo_relative_path(&path, repo_root);
            files.push((relative, path));
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    tracing::info!("Found {} C++ files under {}", files.len(), directory.display());
    Ok(files)
}

/// Extract entities from every C++ file in a directory tree.
///
/// `repo_root` defaults to `directory`. Per-file failures increment
/// `files_failed` and processing continues when
/// `options.continue_on_error`; otherwise the first error propagates.
pub fn extract_directory(
    directory: &Path,
    repo_name: &str,
    repo_root: Option<&Path>,
    options: &ExtractOptions,
) -> Result<(Vec<ExtractedEntity>, ExtractionStats), IndexError> {
    check_repo_name(repo_name)?;

    let resolved_root = repo_root.unwrap_or(directory).to_path_buf();
    let files = discover_cpp_files(directory, &resolved_root)?;

    let mut stats = ExtractionStats::default();
    let mut all_entities = Vec::new();

    if files.is_empty() {
        tracing::warn!("No C++ files found in {}", directory.display());
        return Ok((all_entities, stats));
    }

    let mut parser = CppParser::new()?;
    for (relative, path) in &files {
        match extract_file_with_diagnostics(&mut parser, path, repo_name, &resolved_root, options) {
            Ok(diagnostics) => {
                stats.files_processed += 1;
                stats.entities_extracted += diagnostics.entities.len();
                stats.parse_errors += diagnostics.parse_error_count;
                all_entities.extend(diagnostics.entities);
            }
            Err(err) => {
                tracing::error!("Error processing {relative}: {err}");
                stats.files_failed += 1;
                if !options.continue_on_error {
                    return Err(err);
                }
            }
        }
    }

    tracing::info!("Extraction complete: {stats}");
    Ok((all_entities, stats))
}

/// Extract entities from a file or directory and serialize them to JSON
/// records, field names per the output contract.
pub fn extract_to_records(
    source: &Path,
    repo_name: &str,
    repo_root: Option<&Path>,
    options: &ExtractOptions,
) -> Result<Vec<serde_json::Value>, IndexError> {
    let entities = if source.is_file() {
        extract_file(source, repo_name, repo_root, options)?
    } else if source.is_dir() {
        let (entities, stats) = extract_directory(source, repo_name, repo_root, options)?;
        tracing::info!("Extraction stats: {stats}");
        entities
    } else {
        return Err(IndexError::FileNotFound(source.to_path_buf()));
    };

    entities
        .iter()
        .map(|entity| serde_json::to_value(entity).map_err(IndexError::from))
        .collect()
}

/// Write entities as JSON Lines, one record per line.
pub fn write_jsonl<W: Write>(entities: &[ExtractedEntity], mut writer: W) -> Result<(), IndexError> {
    for entity in entities {
        serde_json::to_writer(&mut writer, entity)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
