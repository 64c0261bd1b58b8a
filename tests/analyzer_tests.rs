// Gateway file to expose analyzer tests from the analyzer/ subdirectory
// Each test file in analyzer/ needs to be included here

mod common;

#[path = "analyzer/test_relationships.rs"]
mod test_relationships;

#[path = "analyzer/test_hashing.rs"]
mod test_hashing;

#[path = "analyzer/test_failures.rs"]
mod test_failures;

#[path = "analyzer/test_semantic_sessions.rs"]
mod test_semantic_sessions;

#[path = "analyzer/test_output.rs"]
mod test_output;
