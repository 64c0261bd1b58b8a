//! Phase one: file discovery and the project-wide source index

pub mod source_index;
pub mod walker;

pub use source_index::{
    IndexedFile, SourceIndex, SourceIndexBuilder, SourceIndexEntry, UnindexedFile,
};
pub use walker::FileWalker;
