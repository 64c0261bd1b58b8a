//! File system walker for discovering source files to analyse
//!
//! Supports:
//! - .gitignore and .chunkforgeignore rules
//! - language filtering by enabled extensions
//! - source-root narrowing and target-file filtering
//!
//! Discovery order is deterministic: names are sorted per directory.

use crate::config::{IGNORE_FILE, Settings};
use crate::parsing::Language;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Walks directories to find source files to analyse
#[derive(Debug)]
pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Every matching file under `root`, in discovery order
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let roots = self.walk_roots(root);
        debug!("walking {} root(s) under {}", roots.len(), root.display());

        let Some((first, rest)) = roots.split_first() else {
            return Vec::new();
        };
        let mut builder = WalkBuilder::new(first);
        for extra in rest {
            builder.add(extra);
        }

        builder
            .hidden(false) // Hidden files are filtered below so dot-dirs like .mvn still count
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .max_depth(None)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.add_custom_ignore_filename(IGNORE_FILE);

        let enabled_extensions = self.enabled_extensions();

        builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| {
                // Skip hidden files (files starting with .)
                !path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'))
            })
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| enabled_extensions.iter().any(|e| e == ext))
            })
            .collect()
    }

    /// Whether `path` is selected for analysis by `analysis.target_files`.
    ///
    /// Every file is a target when the list is empty. The index always
    /// covers the whole project so targets can still resolve against it.
    pub fn is_target(&self, path: &Path) -> bool {
        let targets = &self.settings.analysis.target_files;
        if targets.is_empty() {
            return true;
        }
        let normalized = path.to_string_lossy().replace('\\', "/");
        targets
            .iter()
            .any(|target| normalized.ends_with(target.as_str()))
    }

    /// Configured source roots that exist under `root`, outermost only.
    /// Falls back to `root` itself when none exist.
    fn walk_roots(&self, root: &Path) -> Vec<PathBuf> {
        let mut existing: Vec<PathBuf> = self
            .settings
            .analysis
            .source_roots
            .iter()
            .map(|rel| root.join(rel))
            .filter(|path| path.is_dir())
            .collect();
        existing.sort();
        existing.dedup();

        let outermost: Vec<PathBuf> = existing
            .iter()
            .filter(|candidate| {
                !existing
                    .iter()
                    .any(|other| other != *candidate && candidate.starts_with(other))
            })
            .cloned()
            .collect();

        if outermost.is_empty() {
            vec![root.to_path_buf()]
        } else {
            outermost
        }
    }

    fn enabled_extensions(&self) -> Vec<String> {
        Language::ALL
            .iter()
            .flat_map(|lang| self.settings.enabled_extensions(lang.config_key()))
            .collect()
    }
}
