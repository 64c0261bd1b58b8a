//! Relationship resolution
//!
//! Turns raw structural facts into resolved calls, used types and supertype
//! edges.

pub mod context;
pub mod resolver;

pub use context::ClassParsingContext;
pub use resolver::{
    MethodCallRecord, RelationshipResolver, ResolvedClass, ResolvedMethod, TypeResolution,
};
