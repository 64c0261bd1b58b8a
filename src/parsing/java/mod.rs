//! Java language support

pub mod constants;
pub mod endpoints;
pub mod extractor;

pub use extractor::JavaExtractor;
