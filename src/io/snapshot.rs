//! Repository snapshot loading

use crate::core::{ImpactError, Result};
use ignore::WalkBuilder;
use std::path::Path;

/// Extensions treated as source modules for dependency extraction
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

/// One file in the snapshot, path normalized to forward slashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

/// Immutable snapshot of a repository's source files at the PR head state
///
/// Files are kept sorted by path so every downstream pass is deterministic.
#[derive(Debug, Clone, Default)]
pub struct RepoSnapshot {
    files: Vec<SourceFile>,
}

impl RepoSnapshot {
    /// Build a snapshot from in-memory (path, content) pairs
    pub fn from_files(files: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut files: Vec<SourceFile> = files
            .into_iter()
            .map(|(path, content)| SourceFile {
                path: normalize_path(&path),
                content,
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        Self { files }
    }

    /// Load source files under `root`, honoring gitignore rules
    ///
    /// Undecodable file content is a [`ImpactError::GraphBuild`]; unreadable
    /// directory entries are skipped with a warning.
    pub fn load(root: &Path, extensions: &[&str]) -> Result<Self> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !has_extension(path, extensions) {
                continue;
            }
            if path.components().any(|c| c.as_os_str() == "node_modules") {
                continue;
            }

            let bytes = std::fs::read(path)
                .map_err(|e| ImpactError::graph_build(path, e.to_string()))?;
            let content = String::from_utf8(bytes)
                .map_err(|_| ImpactError::graph_build(path, "content is not valid UTF-8"))?;

            let rel = path.strip_prefix(root).unwrap_or(path);
            files.push((rel.to_string_lossy().into_owned(), content));
        }

        log::debug!("Loaded {} source files from {}", files.len(), root.display());
        Ok(Self::from_files(files))
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.binary_search_by(|f| f.path.as_str().cmp(path)).is_ok()
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .map_or(false, |ext| extensions.iter().any(|e| *e == ext))
}

/// Normalize separators so module ids compare the same on every platform
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
