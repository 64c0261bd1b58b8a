//! chunkforge turns a Java source tree into code chunks: one record per type
//! declaration, cross-referenced with resolved relationships and stamped
//! with content hashes, ready for a knowledge graph.

pub mod analyzer;
pub mod chunk;
pub mod config;
pub mod error;
pub mod hashing;
pub mod indexing;
pub mod logging;
pub mod parsing;
pub mod resolution;
pub mod semantic;
pub mod types;

// Explicit exports for better API clarity
pub use analyzer::{LanguageAnalyzer, RunReport, SemanticMode};
pub use chunk::{ChunkType, CodeChunk, Edge, EdgeKind, Method, MemorySink, Sink};
pub use config::Settings;
pub use error::{
    AnalysisError, AnalysisResult, AssemblyError, ParseError, ScanError, SessionError, SinkError,
};
pub use hashing::{AstHash, content_hash};
pub use indexing::{SourceIndex, SourceIndexBuilder};
pub use parsing::Language;
pub use resolution::{MethodCallRecord, RelationshipResolver};
pub use semantic::{FileSession, LspService, NullSemanticService, SemanticService};
pub use types::{Diagnostic, InheritanceStatus, ResolvedKind, Severity, TypeKind};
