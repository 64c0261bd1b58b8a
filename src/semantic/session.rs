//! Per-file session state machine.
//!
//! `Idle -> Opening -> Open -> (Querying -> Open)* -> Closing -> Closed`.
//! A failed open goes straight to `Closed`. A session that was opened is
//! closed on every exit path: explicitly via [`FileSession::close`], on a
//! query error, or by the drop guard when the owning task is cancelled.

use super::{Location, SemanticService, TypeHierarchy};
use crate::config::SemanticConfig;
use crate::error::{SessionError, SessionResult};
use crate::types::Position;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Opening,
    Open,
    Querying,
    Closing,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Querying => "querying",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub open: Duration,
    pub request: Duration,
}

impl SessionTimeouts {
    pub fn from_config(config: &SemanticConfig) -> Self {
        Self {
            open: config.open_timeout(),
            request: config.request_timeout(),
        }
    }
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self::from_config(&SemanticConfig::default())
    }
}

pub struct FileSession {
    service: Arc<dyn SemanticService>,
    path: PathBuf,
    state: SessionState,
    timeouts: SessionTimeouts,
    /// `open_file` succeeded and no `close_file` was sent yet
    needs_close: bool,
}

impl std::fmt::Debug for FileSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSession")
            .field("service", &self.service.name())
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}

impl FileSession {
    pub fn new(
        service: Arc<dyn SemanticService>,
        path: impl Into<PathBuf>,
        timeouts: SessionTimeouts,
    ) -> Self {
        Self {
            service,
            path: path.into(),
            state: SessionState::Idle,
            timeouts,
            needs_close: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            path: self.path.clone(),
            operation,
            state: self.state.as_str(),
        }
    }

    /// Send the file content to the service.
    ///
    /// On failure or timeout the session ends up `Closed` and the caller
    /// continues without semantic answers.
    pub async fn open(&mut self, content: &str) -> SessionResult<()> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("open"));
        }
        self.state = SessionState::Opening;
        // A cancelled open may still have reached the service
        self.needs_close = true;

        let result =
            tokio::time::timeout(self.timeouts.open, self.service.open_file(&self.path, content))
                .await;
        match result {
            Ok(Ok(())) => {
                self.state = SessionState::Open;
                debug!("session open: {}", self.path.display());
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = SessionState::Closed;
                self.needs_close = false;
                Err(e)
            }
            Err(_) => {
                // The service may have seen the open; `close` still owes it a didClose
                self.state = SessionState::Closed;
                Err(SessionError::Timeout {
                    operation: "open",
                    elapsed: self.timeouts.open,
                })
            }
        }
    }

    fn begin_query(&mut self, operation: &'static str) -> SessionResult<()> {
        if self.state != SessionState::Open {
            return Err(self.invalid(operation));
        }
        self.state = SessionState::Querying;
        Ok(())
    }

    /// Back to `Open` on an answer; a query error closes the session
    async fn end_query<T>(
        &mut self,
        operation: &'static str,
        result: Result<SessionResult<T>, tokio::time::error::Elapsed>,
    ) -> SessionResult<T> {
        self.state = SessionState::Open;
        let error = match result {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => SessionError::Timeout {
                operation,
                elapsed: self.timeouts.request,
            },
        };
        warn!(
            "{operation} query failed for {}: {error}; closing session",
            self.path.display()
        );
        if let Err(close_error) = self.close().await {
            debug!("close after query error failed: {close_error}");
        }
        Err(error)
    }

    pub async fn definition(&mut self, position: Position) -> SessionResult<Option<Location>> {
        self.begin_query("definition")?;
        let result = tokio::time::timeout(
            self.timeouts.request,
            self.service.definition(&self.path, position),
        )
        .await;
        self.end_query("definition", result).await
    }

    pub async fn type_hierarchy(
        &mut self,
        type_name: &str,
        position: Position,
    ) -> SessionResult<Option<TypeHierarchy>> {
        self.begin_query("type_hierarchy")?;
        let result = tokio::time::timeout(
            self.timeouts.request,
            self.service.type_hierarchy(&self.path, type_name, position),
        )
        .await;
        self.end_query("type_hierarchy", result).await
    }

    pub async fn implementations(&mut self, position: Position) -> SessionResult<Vec<Location>> {
        self.begin_query("implementations")?;
        let result = tokio::time::timeout(
            self.timeouts.request,
            self.service.implementations(&self.path, position),
        )
        .await;
        self.end_query("implementations", result).await
    }

    /// Close the file on the service. Closing a closed session is a no-op
    /// unless an open timed out; an idle session closes without contacting
    /// the service.
    pub async fn close(&mut self) -> SessionResult<()> {
        match self.state {
            SessionState::Closed if !self.needs_close => return Ok(()),
            SessionState::Idle => {
                self.state = SessionState::Closed;
                return Ok(());
            }
            SessionState::Open | SessionState::Closed => {}
            SessionState::Opening | SessionState::Querying | SessionState::Closing => {
                return Err(self.invalid("close"));
            }
        }

        self.state = SessionState::Closing;
        // Considered closed even if the notification fails
        self.needs_close = false;
        let result =
            tokio::time::timeout(self.timeouts.request, self.service.close_file(&self.path)).await;
        self.state = SessionState::Closed;
        debug!("session closed: {}", self.path.display());

        match result {
            Ok(inner) => inner,
            Err(_) => Err(SessionError::Timeout {
                operation: "close",
                elapsed: self.timeouts.request,
            }),
        }
    }
}

impl Drop for FileSession {
    fn drop(&mut self) {
        if !self.needs_close {
            return;
        }
        // Task was cancelled mid-session; close from a detached task
        let service = self.service.clone();
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = service.close_file(&path).await {
                        debug!("deferred close of {} failed: {e}", path.display());
                    }
                });
            }
            Err(_) => warn!(
                "session for {} dropped outside a runtime; close not sent",
                path.display()
            ),
        }
    }
}
