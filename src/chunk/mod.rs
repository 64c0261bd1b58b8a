//! Output records, their assembly and their consumers

pub mod assembler;
pub mod model;
pub mod sink;

pub use assembler::{ChunkAssembler, ChunkParts};
pub use model::{ChunkType, CodeChunk, Edge, EdgeKind, Method};
pub use sink::{JsonFileSink, JsonLinesSink, MemorySink, Sink, sink_for};
