//! Project-wide declaration index built before deep analysis.
//!
//! The index is a flat map keyed by qualified type name. It is built once
//! per run in parallel with rayon, merged in discovery order so the first
//! declaration of a name wins, and is read-only afterwards.

use super::walker::FileWalker;
use crate::config::Settings;
use crate::error::{ScanError, ScanResult};
use crate::parsing::{
    DeclarationFacts, ExtractorFactory, ImportDecl, Language, LanguageExtractor, MemberDecl,
    SyntaxParser,
};
use crate::types::{Diagnostic, FileId, Range, TypeKind};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Declaration metadata for one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIndexEntry {
    pub fqn: String,
    pub name: String,
    pub path: PathBuf,
    pub file_id: FileId,
    pub kind: TypeKind,
    pub package: String,
    /// Supertypes exactly as written, superclass separate from interfaces
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub methods: Vec<MemberDecl>,
    pub fields: Vec<MemberDecl>,
    pub range: Range,
    pub parent_fqn: Option<String>,
}

impl SourceIndexEntry {
    pub fn is_nested(&self) -> bool {
        self.parent_fqn.is_some()
    }

    pub fn declares_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    pub fn declares_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn public_members(&self) -> impl Iterator<Item = &str> {
        self.methods
            .iter()
            .chain(self.fields.iter())
            .filter(|m| m.is_public)
            .map(|m| m.name.as_str())
    }

    /// All supertypes as written, superclass first
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.extends
            .iter()
            .chain(self.implements.iter())
            .map(String::as_str)
    }

    /// Method whose declaration spans `line` (0-based)
    pub fn method_at(&self, line: u32) -> Option<&MemberDecl> {
        self.methods.iter().find(|m| m.range.contains_line(line))
    }
}

/// A discovered file that was indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub id: FileId,
    pub path: PathBuf,
    pub language: Language,
    pub package: String,
    pub imports: Vec<ImportDecl>,
    /// Qualified names declared in the file, in declaration order
    pub types: Vec<String>,
}

/// A discovered file that could not be read or parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnindexedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct SourceIndex {
    root: PathBuf,
    entries: HashMap<String, SourceIndexEntry>,
    /// Qualified names in discovery order
    order: Vec<String>,
    by_simple_name: HashMap<String, Vec<String>>,
    by_path: HashMap<PathBuf, Vec<String>>,
    packages: HashSet<String>,
    method_names: HashSet<String>,
    files: Vec<IndexedFile>,
    unindexed: Vec<UnindexedFile>,
    diagnostics: Vec<Diagnostic>,
}

impl SourceIndex {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, fqn: &str) -> Option<&SourceIndexEntry> {
        self.entries.get(fqn)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.entries.contains_key(fqn)
    }

    /// Every qualified name declaring `simple_name`, in discovery order
    pub fn by_simple_name(&self, simple_name: &str) -> &[String] {
        self.by_simple_name
            .get(simple_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any indexed type declares a method with this name
    pub fn has_method(&self, name: &str) -> bool {
        self.method_names.contains(name)
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    /// Entries in discovery order
    pub fn entries(&self) -> impl Iterator<Item = &SourceIndexEntry> {
        self.order.iter().filter_map(|fqn| self.entries.get(fqn))
    }

    /// Types declared in `path`, in declaration order
    pub fn types_in(&self, path: &Path) -> impl Iterator<Item = &SourceIndexEntry> {
        self.by_path
            .get(path)
            .into_iter()
            .flatten()
            .filter_map(|fqn| self.entries.get(fqn))
    }

    /// Innermost type in `path` whose declaration spans `line` (0-based)
    pub fn type_at(&self, path: &Path, line: u32) -> Option<&SourceIndexEntry> {
        self.types_in(path)
            .filter(|entry| entry.range.contains_line(line))
            .min_by_key(|entry| entry.range.line_span())
    }

    /// Innermost type and the method spanning `line`, if any
    pub fn member_at(&self, path: &Path, line: u32) -> Option<(&SourceIndexEntry, Option<&MemberDecl>)> {
        let entry = self.type_at(path, line)?;
        Some((entry, entry.method_at(line)))
    }

    pub fn files(&self) -> &[IndexedFile] {
        &self.files
    }

    pub fn file(&self, path: &Path) -> Option<&IndexedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn unindexed(&self) -> &[UnindexedFile] {
        &self.unindexed
    }

    pub fn is_unindexed(&self, path: &Path) -> bool {
        self.unindexed.iter().any(|u| u.path == path)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of files discovered, indexed or not
    pub fn discovered(&self) -> usize {
        self.files.len() + self.unindexed.len()
    }

    fn insert(&mut self, entry: SourceIndexEntry) {
        if let Some(existing) = self.entries.get(&entry.fqn) {
            self.diagnostics.push(
                Diagnostic::warning(
                    "DUPLICATE_TYPE",
                    format!(
                        "{} already declared in {}; later declaration ignored",
                        entry.fqn,
                        existing.path.display()
                    ),
                )
                .with_path(&entry.path)
                .at_line(entry.range.start_line),
            );
            return;
        }

        self.by_simple_name
            .entry(entry.name.clone())
            .or_default()
            .push(entry.fqn.clone());
        self.by_path
            .entry(entry.path.clone())
            .or_default()
            .push(entry.fqn.clone());
        if !entry.package.is_empty() {
            self.packages.insert(entry.package.clone());
        }
        self.method_names
            .extend(entry.methods.iter().map(|m| m.name.clone()));
        self.order.push(entry.fqn.clone());
        self.entries.insert(entry.fqn.clone(), entry);
    }
}

/// Per-file result of the parallel pass
enum FileOutcome {
    Indexed {
        language: Language,
        package: String,
        imports: Vec<ImportDecl>,
        declarations: Vec<DeclarationFacts>,
    },
    Failed {
        reason: String,
    },
}

/// Builds a [`SourceIndex`] for a project root
#[derive(Debug)]
pub struct SourceIndexBuilder {
    settings: Arc<Settings>,
    factory: ExtractorFactory,
    walker: FileWalker,
}

impl SourceIndexBuilder {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            factory: ExtractorFactory::new(settings.clone()),
            walker: FileWalker::new(settings.clone()),
            settings,
        }
    }

    /// Index every source file under `root`.
    ///
    /// Fails only when the root itself is unusable. Per-file read or parse
    /// failures are recorded as unindexed files with a warning diagnostic.
    pub fn build(&self, root: &Path) -> ScanResult<SourceIndex> {
        check_root(root)?;
        let started = Instant::now();

        let mut extractors: HashMap<Language, Arc<dyn LanguageExtractor>> = HashMap::new();
        for language in self.factory.enabled_languages() {
            extractors.insert(language, self.factory.create_extractor(language)?);
        }

        let files = self.walker.walk(root);
        let workers = self.settings.analysis.effective_workers();
        let parse_all = || -> Vec<(PathBuf, FileOutcome)> {
            files
                .par_iter()
                .map_init(HashMap::<Language, SyntaxParser>::new, |parsers, path| {
                    let outcome = index_file(parsers, &extractors, path);
                    (path.clone(), outcome)
                })
                .collect()
        };

        let outcomes = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => {
                info!(
                    "indexing {} files under {} with {} worker threads",
                    files.len(),
                    root.display(),
                    pool.current_num_threads()
                );
                pool.install(parse_all)
            }
            Err(e) => {
                warn!("worker pool unavailable ({e}); indexing on the shared pool");
                parse_all()
            }
        };

        let mut index = SourceIndex {
            root: root.to_path_buf(),
            ..SourceIndex::default()
        };
        let mut next_id = 1u32;

        for (path, outcome) in outcomes {
            match outcome {
                FileOutcome::Indexed {
                    language,
                    package,
                    imports,
                    declarations,
                } => {
                    let id = FileId(next_id);
                    next_id += 1;
                    let mut types = Vec::with_capacity(declarations.len());
                    for decl in declarations {
                        types.push(decl.fqn.clone());
                        index.insert(SourceIndexEntry {
                            fqn: decl.fqn,
                            name: decl.name,
                            path: path.clone(),
                            file_id: id,
                            kind: decl.kind,
                            package: package.clone(),
                            extends: decl.extends,
                            implements: decl.implements,
                            methods: decl.methods,
                            fields: decl.fields,
                            range: decl.range,
                            parent_fqn: decl.parent_fqn,
                        });
                    }
                    index.files.push(IndexedFile {
                        id,
                        path,
                        language,
                        package,
                        imports,
                        types,
                    });
                }
                FileOutcome::Failed { reason } => {
                    warn!("not indexed: {}: {reason}", path.display());
                    index.diagnostics.push(
                        Diagnostic::warning("UNINDEXED_FILE", reason.clone()).with_path(&path),
                    );
                    index.unindexed.push(UnindexedFile { path, reason });
                }
            }
        }

        info!(
            "indexed {} types from {} files ({} unindexed) in {:.2?}",
            index.len(),
            index.files.len(),
            index.unindexed.len(),
            started.elapsed()
        );
        Ok(index)
    }
}

fn check_root(root: &Path) -> ScanResult<()> {
    if !root.exists() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    std::fs::read_dir(root).map_err(|source| ScanError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn index_file(
    parsers: &mut HashMap<Language, SyntaxParser>,
    extractors: &HashMap<Language, Arc<dyn LanguageExtractor>>,
    path: &Path,
) -> FileOutcome {
    let Some(language) = Language::from_path(path) else {
        return FileOutcome::Failed {
            reason: "unsupported file extension".to_string(),
        };
    };
    let Some(extractor) = extractors.get(&language) else {
        return FileOutcome::Failed {
            reason: format!("{language} is disabled"),
        };
    };

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            return FileOutcome::Failed {
                reason: format!("read failed: {e}"),
            };
        }
    };

    let parser = match parsers.entry(language) {
        std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
        std::collections::hash_map::Entry::Vacant(slot) => match SyntaxParser::new(language) {
            Ok(parser) => slot.insert(parser),
            Err(e) => {
                return FileOutcome::Failed {
                    reason: format!("{e} [{}]", e.status_code()),
                };
            }
        },
    };

    match parser.parse(&bytes) {
        Ok(tree) => {
            let header = extractor.extract_header(&tree);
            let declarations = extractor.extract_declarations(&tree, &header);
            debug!("{}: {} declarations", path.display(), declarations.len());
            FileOutcome::Indexed {
                language,
                package: header.package,
                imports: header.imports,
                declarations,
            }
        }
        Err(e) => FileOutcome::Failed {
            reason: format!("{e} [{}]", e.status_code()),
        },
    }
}
