//! JSON-RPC 2.0 envelopes and the handful of LSP payloads the client uses.

use super::uri::{path_to_uri, uri_to_path};
use super::{Location, TypeHierarchy};
use crate::types::Position;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;

/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i64 = -32601;

/// LSP `SymbolKind` values used to split supertypes
const SYMBOL_KIND_INTERFACE: u64 = 11;

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: i64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> JsonRpcNotification<'a> {
    pub fn new(method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A message received from the server
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Response {
        id: i64,
        result: Result<Value, JsonRpcError>,
    },
    /// Server-to-client request, must be answered
    Request { id: Value, method: String },
    Notification { method: String, params: Value },
}

impl Incoming {
    /// Classify a raw message; `None` when it is not valid JSON-RPC
    pub fn classify(mut message: Value) -> Option<Self> {
        let method = message
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string);
        let id = message.get_mut("id").map(Value::take);

        match (id, method) {
            (Some(id), Some(method)) if !id.is_null() => Some(Self::Request { id, method }),
            (_, Some(method)) => Some(Self::Notification {
                params: message.get_mut("params").map(Value::take).unwrap_or(Value::Null),
                method,
            }),
            (Some(id), None) => {
                let id = id.as_i64()?;
                let result = match message.get_mut("error").map(Value::take) {
                    Some(error) if !error.is_null() => Err(serde_json::from_value(error).ok()?),
                    _ => Ok(message.get_mut("result").map(Value::take).unwrap_or(Value::Null)),
                };
                Some(Self::Response { id, result })
            }
            (None, None) => None,
        }
    }
}

/// Reply sent to any server-to-client request
pub fn null_reply(id: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": null})
}

pub fn initialize_params(root: &Path) -> Value {
    let root_uri = path_to_uri(root);
    json!({
        "processId": std::process::id(),
        "rootUri": root_uri,
        "workspaceFolders": [{"uri": root_uri, "name": "workspace"}],
        "capabilities": {
            "textDocument": {
                "synchronization": {"didSave": false},
                "definition": {"linkSupport": false},
                "implementation": {"linkSupport": false},
                "typeHierarchy": {"dynamicRegistration": false}
            },
            "workspace": {"workspaceFolders": true}
        }
    })
}

pub fn did_open_params(path: &Path, language_id: &str, text: &str) -> Value {
    json!({
        "textDocument": {
            "uri": path_to_uri(path),
            "languageId": language_id,
            "version": 1,
            "text": text
        }
    })
}

pub fn did_close_params(path: &Path) -> Value {
    json!({"textDocument": {"uri": path_to_uri(path)}})
}

pub fn text_document_position(path: &Path, position: Position) -> Value {
    json!({
        "textDocument": {"uri": path_to_uri(path)},
        "position": {"line": position.line, "character": position.character}
    })
}

fn parse_position(value: &Value) -> Option<Position> {
    Some(Position::new(
        value.get("line")?.as_u64()? as u32,
        value.get("character")?.as_u64()? as u32,
    ))
}

fn parse_location(value: &Value) -> Option<Location> {
    // Location or LocationLink
    let uri = value
        .get("uri")
        .or_else(|| value.get("targetUri"))?
        .as_str()?;
    let range = value
        .get("range")
        .or_else(|| value.get("targetSelectionRange"))?;
    Some(Location {
        path: uri_to_path(uri)?,
        start: parse_position(range.get("start")?)?,
        end: parse_position(range.get("end")?)?,
    })
}

/// Definition and implementation results: `null`, one location, or an array
pub fn parse_locations(result: &Value) -> Vec<Location> {
    match result {
        Value::Array(items) => items.iter().filter_map(parse_location).collect(),
        Value::Object(_) => parse_location(result).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// A `TypeHierarchyItem` as returned by the server
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HierarchyItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub kind: u64,
    pub uri: String,
    /// Rest of the item, sent back verbatim in follow-up requests
    #[serde(flatten)]
    pub rest: serde_json::Map<String, Value>,
}

impl HierarchyItem {
    /// Qualified name when `detail` carries the package
    pub fn qualified_name(&self) -> String {
        match self.detail.as_deref().map(str::trim) {
            Some(detail) if !detail.is_empty() && !detail.contains(' ') => {
                if detail.ends_with(&format!(".{}", self.name)) || detail == self.name {
                    detail.to_string()
                } else {
                    format!("{detail}.{}", self.name)
                }
            }
            _ => self.name.clone(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == SYMBOL_KIND_INTERFACE
    }
}

pub fn parse_hierarchy_items(result: &Value) -> Vec<HierarchyItem> {
    match result {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Split supertypes into superclass and interfaces
pub fn hierarchy_from_supertypes(items: &[HierarchyItem]) -> TypeHierarchy {
    let mut hierarchy = TypeHierarchy::default();
    for item in items {
        let name = item.qualified_name();
        if item.is_interface() {
            hierarchy.implements.push(name);
        } else if name != "java.lang.Object" {
            hierarchy.extends.push(name);
        }
    }
    hierarchy
}
