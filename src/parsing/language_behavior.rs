//! Language-specific extraction abstraction
//!
//! Each supported language implements [`LanguageExtractor`]; the analyzer
//! only ever talks to this trait, picked once per run by the
//! [`ExtractorFactory`](super::ExtractorFactory).

use super::facts::{
    AnnotationFact, ClassFacts, DeclarationFacts, FileFacts, FileHeader, MethodFacts, ParamFact,
    RestEndpoint,
};
use super::{Language, SyntaxTree};
use crate::types::{Diagnostic, MethodType};
use tree_sitter::Node;

/// Pure syntax-tree extraction for one language
///
/// Every method returns owned facts. A malformed node is skipped with a
/// diagnostic pushed to the caller's list; extraction never aborts a file.
pub trait LanguageExtractor: Send + Sync {
    fn language(&self) -> Language;

    /// Package and imports
    fn extract_header(&self, tree: &SyntaxTree) -> FileHeader;

    /// Cheap declaration-only pass used to build the source index.
    ///
    /// Does not look inside method bodies.
    fn extract_declarations(&self, tree: &SyntaxTree, header: &FileHeader)
    -> Vec<DeclarationFacts>;

    /// Every type declaration in the file, nested ones included, with
    /// methods fully extracted
    fn extract_classes(
        &self,
        tree: &SyntaxTree,
        header: &FileHeader,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ClassFacts>;

    /// Methods and constructors declared directly in `class_node`'s body
    fn extract_methods(
        &self,
        tree: &SyntaxTree,
        class_node: Node<'_>,
        class_annotations: &[AnnotationFact],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<MethodFacts>;

    /// Annotations attached to a declaration node
    fn extract_annotations(&self, tree: &SyntaxTree, node: Node<'_>) -> Vec<AnnotationFact>;

    /// Entry points declared by a method's annotations, merged with the
    /// enclosing type's annotations (path prefixes)
    fn extract_endpoints(
        &self,
        method_annotations: &[AnnotationFact],
        class_annotations: &[AnnotationFact],
        params: &[ParamFact],
    ) -> Vec<RestEndpoint>;

    /// Reduce a supertype as written to the bare name used for lookups
    ///
    /// # Examples
    /// - `Repository<User, Long>` -> `Repository`
    /// - `@Valid Base` -> `Base`
    /// - `java.util.List<String>` -> `java.util.List`
    fn resolve_supertype_heuristics(&self, written: &str) -> String;

    /// Primitives and platform types that never produce edges
    fn is_builtin_type(&self, simple_name: &str) -> bool;

    /// Qualified names inside runtime or well-known library packages
    fn is_builtin_package(&self, qualified_name: &str) -> bool;

    fn classify_method(&self, method: &MethodFacts) -> MethodType;

    /// Header plus classes in one go
    fn extract_file(&self, tree: &SyntaxTree) -> FileFacts {
        let header = self.extract_header(tree);
        let mut diagnostics = Vec::new();
        let classes = self.extract_classes(tree, &header, &mut diagnostics);
        FileFacts {
            header,
            classes,
            diagnostics,
        }
    }
}
