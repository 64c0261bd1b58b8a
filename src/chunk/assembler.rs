//! Chunk assembly
//!
//! Pure composition of extracted facts, resolution results and hashes into
//! a [`CodeChunk`]. No I/O and no semantic queries happen here.

use super::model::{ChunkType, CodeChunk, Method};
use crate::config::Settings;
use crate::error::{AssemblyError, AssemblyResult};
use crate::hashing::{AstHash, content_hash};
use crate::parsing::{AnnotationFact, ClassFacts};
use crate::resolution::ResolvedClass;
use crate::types::{Diagnostic, TypeKind};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Everything needed to build one chunk
#[derive(Debug)]
pub struct ChunkParts<'a> {
    pub path: &'a Path,
    pub class: &'a ClassFacts,
    pub resolved: ResolvedClass,
    pub class_hash: AstHash,
    /// One per method of `class`, same order
    pub method_hashes: Vec<AstHash>,
}

impl<'a> ChunkParts<'a> {
    /// Hash the class and its methods from their declaration text
    pub fn hashed(path: &'a Path, class: &'a ClassFacts, resolved: ResolvedClass) -> Self {
        Self {
            path,
            class,
            resolved,
            class_hash: content_hash(&class.text),
            method_hashes: class.methods.iter().map(|m| content_hash(&m.text)).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    project_id: String,
    branch: String,
    root: PathBuf,
}

fn annotation_texts(annotations: &[AnnotationFact]) -> Vec<String> {
    annotations.iter().map(|a| a.text.clone()).collect()
}

/// Trailing whitespace removed, runs of blank lines collapsed. Comment
/// stripping leaves blank space behind; this keeps the stored text tidy.
pub fn normalize_content(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_blank = false;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if previous_blank {
                continue;
            }
            previous_blank = true;
        } else {
            previous_blank = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

impl ChunkAssembler {
    pub fn new(
        project_id: impl Into<String>,
        branch: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            branch: branch.into(),
            root: root.into(),
        }
    }

    pub fn from_settings(settings: &Settings, root: &Path) -> Self {
        Self::new(
            settings.analysis.project_id.clone(),
            settings.analysis.branch.clone(),
            root,
        )
    }

    /// Path relative to the project root with `/` separators
    pub fn relative_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Build the chunk for one class.
    ///
    /// Methods whose full name repeats an earlier one are dropped with a
    /// `DUPLICATE_METHOD` diagnostic.
    pub fn assemble(
        &self,
        parts: ChunkParts<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> AssemblyResult<CodeChunk> {
        let ChunkParts {
            path,
            class,
            resolved,
            class_hash,
            method_hashes,
        } = parts;

        if class.name.trim().is_empty() {
            return Err(AssemblyError::MissingName {
                line: class.range.start_line + 1,
            });
        }
        if class.fqn.trim().is_empty() {
            return Err(AssemblyError::MissingQualifiedName {
                name: class.name.clone(),
            });
        }
        if resolved.methods.len() != class.methods.len() {
            return Err(AssemblyError::MethodCountMismatch {
                class: class.fqn.clone(),
                extracted: class.methods.len(),
                resolved: resolved.methods.len(),
            });
        }
        if method_hashes.len() < class.methods.len() {
            let method = class.methods[method_hashes.len()].signature.clone();
            return Err(AssemblyError::MissingHash { method });
        }

        let mut seen = HashSet::new();
        let mut methods = Vec::with_capacity(class.methods.len());
        for ((facts, resolution), ast_hash) in class
            .methods
            .iter()
            .zip(resolved.methods)
            .zip(method_hashes)
        {
            let name = format!("{}.{}", class.fqn, facts.signature);
            if !seen.insert(name.clone()) {
                diagnostics.push(
                    Diagnostic::warning(
                        "DUPLICATE_METHOD",
                        format!("{name} is declared more than once; keeping the first"),
                    )
                    .with_path(path)
                    .at_line(facts.range.start_line + 1),
                );
                continue;
            }
            methods.push(Method {
                name,
                body: normalize_content(&facts.text),
                ast_hash,
                calls: resolution.calls,
                used_types: resolution.used_types,
                field_access: resolution.field_access,
                inheritance_info: resolution.inheritance_info,
                implemented_by: resolution.implemented_by,
                annotations: annotation_texts(&facts.annotations),
                endpoints: facts.endpoints.clone(),
                method_type: facts.method_type,
            });
        }

        diagnostics.extend(resolved.diagnostics);

        Ok(CodeChunk {
            package: class.package.clone(),
            class_name: class.name.clone(),
            full_class_name: class.fqn.clone(),
            file_path: self.relative_path(path),
            content: normalize_content(&class.text),
            ast_hash: class_hash,
            implements: resolved.implements,
            extends: resolved.extends,
            methods,
            used_types: resolved.used_types,
            annotations: annotation_texts(&class.annotations),
            chunk_type: if class.is_configuration {
                ChunkType::Configuration
            } else {
                ChunkType::Regular
            },
            kind: class.kind,
            is_nested: class.is_nested(),
            parent_class: class.parent_fqn.clone(),
            is_annotation: class.kind == TypeKind::Annotation,
            inheritance_status: resolved.inheritance_status,
            project_id: self.project_id.clone(),
            branch: self.branch.clone(),
        })
    }
}
