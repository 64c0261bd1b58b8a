//! Semantic query service: the trait the analyzer talks to, a
//! Language Server Protocol implementation of it, and the per-file
//! session state machine that guarantees every opened file is closed.

pub mod lsp;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod uri;

pub use lsp::LspService;
pub use session::{FileSession, SessionState, SessionTimeouts};

use crate::error::{SessionError, SessionResult};
use crate::types::Position;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A position in some file, as answered by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub start: Position,
    pub end: Position,
}

/// Direct supertypes of a type, qualified where the service knows them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeHierarchy {
    pub extends: Vec<String>,
    pub implements: Vec<String>,
}

impl TypeHierarchy {
    pub fn is_empty(&self) -> bool {
        self.extends.is_empty() && self.implements.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.extends
            .iter()
            .chain(self.implements.iter())
            .map(String::as_str)
    }
}

/// External service answering definition and hierarchy queries.
///
/// `Ok(None)` (or an empty list) means "not found"; `Err` means the query
/// itself failed. Positions are zero-based with UTF-16 columns.
#[async_trait]
pub trait SemanticService: Send + Sync {
    fn name(&self) -> &str;

    /// `false` when no service stands behind this handle; the analyzer
    /// then skips sessions instead of treating every file as degraded
    fn is_available(&self) -> bool {
        true
    }

    async fn open_file(&self, path: &Path, content: &str) -> SessionResult<()>;

    async fn close_file(&self, path: &Path) -> SessionResult<()>;

    async fn definition(&self, path: &Path, position: Position) -> SessionResult<Option<Location>>;

    /// Supertypes of the type declared or referenced at `position`; the
    /// simple `type_name` disambiguates when several items come back
    async fn type_hierarchy(
        &self,
        path: &Path,
        type_name: &str,
        position: Position,
    ) -> SessionResult<Option<TypeHierarchy>>;

    async fn implementations(&self, path: &Path, position: Position)
    -> SessionResult<Vec<Location>>;

    /// Stop the service. Called once after the last session closed.
    async fn shutdown(&self) -> SessionResult<()> {
        Ok(())
    }
}

/// Service used when semantic analysis is disabled; every open fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSemanticService;

impl NullSemanticService {
    fn disabled() -> SessionError {
        SessionError::unavailable("semantic service disabled")
    }
}

#[async_trait]
impl SemanticService for NullSemanticService {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn open_file(&self, _path: &Path, _content: &str) -> SessionResult<()> {
        Err(Self::disabled())
    }

    async fn close_file(&self, _path: &Path) -> SessionResult<()> {
        Ok(())
    }

    async fn definition(&self, _path: &Path, _position: Position) -> SessionResult<Option<Location>> {
        Err(Self::disabled())
    }

    async fn type_hierarchy(
        &self,
        _path: &Path,
        _type_name: &str,
        _position: Position,
    ) -> SessionResult<Option<TypeHierarchy>> {
        Err(Self::disabled())
    }

    async fn implementations(
        &self,
        _path: &Path,
        _position: Position,
    ) -> SessionResult<Vec<Location>> {
        Err(Self::disabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_service_is_unavailable() {
        let service = NullSemanticService;
        let err = service
            .open_file(Path::new("/p/A.java"), "class A {}")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), "SESSION_UNAVAILABLE");
        assert!(service.close_file(Path::new("/p/A.java")).await.is_ok());
        assert!(!service.is_available());
    }

    #[test]
    fn test_hierarchy_iterates_all_supertypes() {
        let hierarchy = TypeHierarchy {
            extends: vec!["a.Base".to_string()],
            implements: vec!["a.I".to_string()],
        };
        assert_eq!(hierarchy.all().collect::<Vec<_>>(), vec!["a.Base", "a.I"]);
        assert!(TypeHierarchy::default().is_empty());
    }
}
