//! Language Server Protocol client over a child process's stdio.
//!
//! One server per run. A background task reads framed messages, routes
//! responses to waiting requests by id, answers server-to-client requests
//! with `null` and logs notifications.

use super::protocol::{
    self, HierarchyItem, Incoming, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    METHOD_NOT_FOUND,
};
use super::transport::{read_message, write_message};
use super::{Location, SemanticService, TypeHierarchy};
use crate::config::SemanticConfig;
use crate::error::{SessionError, SessionResult};
use crate::types::Position;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncWrite, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type PendingReply = oneshot::Sender<Result<Value, JsonRpcError>>;

struct Connection {
    writer: tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    pending: Mutex<HashMap<i64, PendingReply>>,
    next_id: AtomicI64,
    alive: AtomicBool,
}

impl Connection {
    fn new(writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            alive: AtomicBool::new(true),
        }
    }

    async fn send(&self, message: &Value) -> SessionResult<()> {
        if !self.alive.load(Ordering::Acquire) {
            return Err(SessionError::transport("language server is not running"));
        }
        let mut writer = self.writer.lock().await;
        write_message(&mut *writer, message).await
    }

    async fn notify(&self, method: &str, params: Value) -> SessionResult<()> {
        let message = serde_json::to_value(JsonRpcNotification::new(method, params))
            .map_err(SessionError::transport)?;
        self.send(&message).await
    }

    /// Transport failures are the outer error, server errors the inner one.
    ///
    /// The reply slot is released however the call ends, including when
    /// the caller drops this future before an answer arrives.
    async fn request(
        self: &Arc<Self>,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> SessionResult<Result<Value, JsonRpcError>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);
        let mut in_flight = InFlight {
            connection: self.clone(),
            id,
            sent: false,
        };

        let message = serde_json::to_value(JsonRpcRequest::new(id, method, params))
            .map_err(SessionError::transport)?;
        self.send(&message).await?;
        in_flight.sent = true;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(SessionError::transport("language server exited")),
            Err(_) => Err(SessionError::Timeout {
                operation: "request",
                elapsed: timeout,
            }),
        }
    }

    /// Route one incoming message
    async fn dispatch(&self, incoming: Incoming) {
        match incoming {
            Incoming::Response { id, result } => {
                if let Some(tx) = self.pending.lock().remove(&id) {
                    let _ = tx.send(result);
                } else {
                    debug!("response for unknown request id {id}");
                }
            }
            Incoming::Request { id, method } => {
                debug!("server request {method}; replying null");
                if let Err(e) = self.send(&protocol::null_reply(id)).await {
                    debug!("reply to {method} failed: {e}");
                }
            }
            Incoming::Notification { method, params } => {
                if method == "window/logMessage" {
                    if let Some(message) = params.get("message").and_then(Value::as_str) {
                        debug!("server: {message}");
                    }
                }
            }
        }
    }

    /// Fail every waiting request; called when the server stream ends
    fn disconnect(&self) {
        self.alive.store(false, Ordering::Release);
        self.pending.lock().clear();
    }
}

/// Owns a `pending` entry for the lifetime of one request
struct InFlight {
    connection: Arc<Connection>,
    id: i64,
    sent: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let unanswered = self.connection.pending.lock().remove(&self.id).is_some();
        if !(unanswered && self.sent && self.connection.alive.load(Ordering::Acquire)) {
            return;
        }
        // Tell the server to stop working on an abandoned request
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let connection = self.connection.clone();
        let id = self.id;
        runtime.spawn(async move {
            if let Err(e) = connection.notify("$/cancelRequest", json!({ "id": id })).await {
                debug!("cancel of request {id} failed: {e}");
            }
        });
    }
}

/// Semantic service backed by a language server process
pub struct LspService {
    connection: Arc<Connection>,
    child: tokio::sync::Mutex<Option<Child>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    language_id: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for LspService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LspService")
            .field("language_id", &self.language_id)
            .field("alive", &self.connection.alive.load(Ordering::Relaxed))
            .finish()
    }
}

impl LspService {
    /// Spawn the configured server for `root` and complete the
    /// `initialize` handshake.
    pub async fn start(config: &SemanticConfig, root: &Path) -> SessionResult<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SessionError::unavailable(format!("failed to start '{}': {e}", config.command))
            })?;

        let stdin: ChildStdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::unavailable("language server stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::unavailable("language server stdout not captured"))?;

        let service = Self::from_streams(Box::new(stdin), stdout, config.request_timeout());
        *service.child.lock().await = Some(child);

        info!("starting language server '{}'", config.command);
        service
            .connection
            .request("initialize", protocol::initialize_params(root), config.init_timeout())
            .await?
            .map_err(|e| protocol_error("initialize", &e))?;
        service.connection.notify("initialized", json!({})).await?;
        info!("language server ready");
        Ok(service)
    }

    /// Wire a service to arbitrary streams; no handshake is performed
    pub fn from_streams<R>(
        writer: Box<dyn AsyncWrite + Send + Unpin>,
        reader: R,
        request_timeout: Duration,
    ) -> Self
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        let connection = Arc::new(Connection::new(writer));
        let reader_conn = connection.clone();
        let handle = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            loop {
                match read_message(&mut reader).await {
                    Ok(Some(message)) => match Incoming::classify(message) {
                        Some(incoming) => reader_conn.dispatch(incoming).await,
                        None => debug!("dropping malformed message"),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("language server stream failed: {e}");
                        break;
                    }
                }
            }
            reader_conn.disconnect();
        });

        Self {
            connection,
            child: tokio::sync::Mutex::new(None),
            reader: Mutex::new(Some(handle)),
            language_id: "java".to_string(),
            request_timeout,
        }
    }

    /// `Ok(None)` when the server does not implement `method`
    async fn request(&self, method: &str, params: Value) -> SessionResult<Option<Value>> {
        match self
            .connection
            .request(method, params, self.request_timeout)
            .await?
        {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code == METHOD_NOT_FOUND => {
                debug!("{method} not supported by server");
                Ok(None)
            }
            Err(e) => Err(protocol_error(method, &e)),
        }
    }

    fn pick_item<'a>(items: &'a [HierarchyItem], type_name: &str) -> Option<&'a HierarchyItem> {
        let simple = type_name.rsplit('.').next().unwrap_or(type_name);
        items
            .iter()
            .find(|item| item.name == simple)
            .or_else(|| items.first())
    }
}

impl Drop for LspService {
    fn drop(&mut self) {
        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
        }
    }
}

fn protocol_error(method: &str, error: &JsonRpcError) -> SessionError {
    SessionError::Protocol {
        method: method.to_string(),
        message: format!("{} (code {})", error.message, error.code),
    }
}

#[async_trait]
impl SemanticService for LspService {
    fn name(&self) -> &str {
        "lsp"
    }

    async fn open_file(&self, path: &Path, content: &str) -> SessionResult<()> {
        self.connection
            .notify(
                "textDocument/didOpen",
                protocol::did_open_params(path, &self.language_id, content),
            )
            .await
    }

    async fn close_file(&self, path: &Path) -> SessionResult<()> {
        self.connection
            .notify("textDocument/didClose", protocol::did_close_params(path))
            .await
    }

    async fn definition(&self, path: &Path, position: Position) -> SessionResult<Option<Location>> {
        let result = self
            .request(
                "textDocument/definition",
                protocol::text_document_position(path, position),
            )
            .await?;
        Ok(result.and_then(|value| protocol::parse_locations(&value).into_iter().next()))
    }

    async fn type_hierarchy(
        &self,
        path: &Path,
        type_name: &str,
        position: Position,
    ) -> SessionResult<Option<TypeHierarchy>> {
        let prepared = self
            .request(
                "textDocument/prepareTypeHierarchy",
                protocol::text_document_position(path, position),
            )
            .await?;
        let Some(prepared) = prepared else {
            return Ok(None);
        };

        let items = protocol::parse_hierarchy_items(&prepared);
        let Some(item) = Self::pick_item(&items, type_name) else {
            return Ok(None);
        };
        let item = serde_json::to_value(item).map_err(SessionError::transport)?;

        let Some(supertypes) = self
            .request("typeHierarchy/supertypes", json!({ "item": item }))
            .await?
        else {
            return Ok(None);
        };
        let items = protocol::parse_hierarchy_items(&supertypes);
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(protocol::hierarchy_from_supertypes(&items)))
    }

    async fn implementations(&self, path: &Path, position: Position) -> SessionResult<Vec<Location>> {
        let result = self
            .request(
                "textDocument/implementation",
                protocol::text_document_position(path, position),
            )
            .await?;
        Ok(result
            .map(|value| protocol::parse_locations(&value))
            .unwrap_or_default())
    }

    async fn shutdown(&self) -> SessionResult<()> {
        if self.connection.alive.load(Ordering::Acquire) {
            if let Err(e) = self.request("shutdown", Value::Null).await {
                debug!("shutdown request failed: {e}");
            }
            if let Err(e) = self.connection.notify("exit", Value::Null).await {
                debug!("exit notification failed: {e}");
            }
        }

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(self.request_timeout, child.wait()).await {
                Ok(Ok(status)) => debug!("language server exited with {status}"),
                _ => {
                    warn!("language server did not exit; killing it");
                    if let Err(e) = child.kill().await {
                        debug!("kill failed: {e}");
                    }
                }
            }
        }

        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
        }
        self.connection.disconnect();
        info!("language server stopped");
        Ok(())
    }
}
