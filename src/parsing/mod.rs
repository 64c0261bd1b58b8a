//! Parsing layer: tree-sitter adapter, comment-aware text helpers and
//! per-language structural extraction.

pub mod factory;
pub mod facts;
pub mod java;
pub mod language;
pub mod language_behavior;
pub mod parser;
pub mod text;

pub use factory::ExtractorFactory;
pub use facts::{
    AnnotationFact, CallFact, ClassFacts, DeclarationFacts, FieldFact, FileFacts, FileHeader,
    ImportDecl, MemberDecl, MethodFacts, ParamFact, RestEndpoint, TypeRef,
};
pub use java::JavaExtractor;
pub use language::Language;
pub use language_behavior::LanguageExtractor;
pub use parser::{SyntaxParser, SyntaxTree};
