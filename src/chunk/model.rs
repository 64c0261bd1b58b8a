//! Output records
//!
//! A [`CodeChunk`] is the unit handed to a sink: one per type declaration,
//! nested types included. Field names serialize in camelCase.

use crate::hashing::AstHash;
use crate::parsing::RestEndpoint;
use crate::resolution::MethodCallRecord;
use crate::types::{InheritanceStatus, MethodType, ResolvedKind, TypeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    #[default]
    Regular,
    /// Framework configuration (`@Configuration` and friends)
    Configuration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    /// `<fqn>.<name>(<params>)`
    pub name: String,
    pub body: String,
    pub ast_hash: AstHash,
    pub calls: Vec<MethodCallRecord>,
    pub used_types: Vec<String>,
    pub field_access: Vec<String>,
    pub inheritance_info: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub implemented_by: Vec<String>,
    pub annotations: Vec<String>,
    pub endpoints: Vec<RestEndpoint>,
    #[serde(rename = "type")]
    pub method_type: MethodType,
}

impl Method {
    /// Qualified name without the parameter list
    pub fn base_name(&self) -> &str {
        self.name
            .split_once('(')
            .map_or(self.name.as_str(), |(base, _)| base)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeChunk {
    pub package: String,
    pub class_name: String,
    pub full_class_name: String,
    /// Relative to the project root, `/`-separated
    pub file_path: String,
    pub content: String,
    pub ast_hash: AstHash,
    pub implements: Vec<String>,
    pub extends: Option<String>,
    pub methods: Vec<Method>,
    pub used_types: Vec<String>,
    pub annotations: Vec<String>,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    pub kind: TypeKind,
    pub is_nested: bool,
    pub parent_class: Option<String>,
    pub is_annotation: bool,
    pub inheritance_status: InheritanceStatus,
    pub project_id: String,
    pub branch: String,
}

/// Relationship kinds derived from chunk fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Calls,
    Implements,
    Extends,
    Uses,
    AccessesField,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Calls => "CALLS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Uses => "USES",
            EdgeKind::AccessesField => "ACCESSES_FIELD",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub from: String,
    pub to: String,
    /// Set for call edges only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_kind: Option<ResolvedKind>,
}

impl Edge {
    fn new(kind: EdgeKind, from: &str, to: &str) -> Self {
        Self {
            kind,
            from: from.to_string(),
            to: to.to_string(),
            resolved_kind: None,
        }
    }
}

impl CodeChunk {
    pub fn is_incomplete(&self) -> bool {
        !self.inheritance_status.is_complete()
    }

    pub fn method(&self, base_name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.base_name() == base_name)
    }

    /// Relationship view over this chunk, in field order.
    ///
    /// Type-level edges start at the chunk's FQN; method-level edges start at
    /// the method's full name.
    pub fn edges(&self) -> Vec<Edge> {
        let fqn = self.full_class_name.as_str();
        let mut edges = Vec::new();

        if let Some(parent) = &self.extends {
            edges.push(Edge::new(EdgeKind::Extends, fqn, parent));
        }
        for interface in &self.implements {
            edges.push(Edge::new(EdgeKind::Implements, fqn, interface));
        }
        for used in &self.used_types {
            edges.push(Edge::new(EdgeKind::Uses, fqn, used));
        }

        for method in &self.methods {
            for call in &method.calls {
                let mut edge = Edge::new(EdgeKind::Calls, &method.name, &call.name);
                edge.resolved_kind = Some(call.resolved_kind);
                edges.push(edge);
            }
            for used in &method.used_types {
                edges.push(Edge::new(EdgeKind::Uses, &method.name, used));
            }
            for field in &method.field_access {
                edges.push(Edge::new(
                    EdgeKind::AccessesField,
                    &method.name,
                    &format!("{fqn}.{field}"),
                ));
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::content_hash;

    fn sample() -> CodeChunk {
        CodeChunk {
            package: "p".into(),
            class_name: "A".into(),
            full_class_name: "p.A".into(),
            file_path: "src/p/A.java".into(),
            content: "class A implements I {}".into(),
            ast_hash: content_hash("class A implements I {}"),
            implements: vec!["p.I".into()],
            extends: None,
            methods: vec![Method {
                name: "p.A.run()".into(),
                body: "void run() { go(); }".into(),
                ast_hash: content_hash("void run() { go(); }"),
                calls: vec![MethodCallRecord::unresolved("go")],
                used_types: vec![],
                field_access: vec!["count".into()],
                inheritance_info: vec![],
                implemented_by: vec![],
                annotations: vec![],
                endpoints: vec![],
                method_type: MethodType::Regular,
            }],
            used_types: vec!["p.I".into()],
            annotations: vec![],
            chunk_type: ChunkType::Regular,
            kind: TypeKind::Class,
            is_nested: false,
            parent_class: None,
            is_annotation: false,
            inheritance_status: InheritanceStatus::Complete,
            project_id: "demo".into(),
            branch: "main".into(),
        }
    }

    #[test]
    fn serializes_in_output_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["fullClassName"], "p.A");
        assert_eq!(json["filePath"], "src/p/A.java");
        assert_eq!(json["extends"], serde_json::Value::Null);
        assert_eq!(json["parentClass"], serde_json::Value::Null);
        assert_eq!(json["type"], "regular");
        assert_eq!(json["inheritanceStatus"], "complete");
        assert_eq!(json["isAnnotation"], false);
        assert_eq!(json["projectId"], "demo");

        let method = &json["methods"][0];
        assert_eq!(method["type"], "regular");
        assert_eq!(method["calls"][0]["resolvedKind"], "unresolved");
        assert_eq!(method["fieldAccess"][0], "count");
        assert!(method.get("implementedBy").is_none());
        assert!(method["calls"][0].get("displayName").is_none());
        assert_eq!(method["astHash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn edges_follow_fields() {
        let edges = sample().edges();
        let kinds: Vec<EdgeKind> = edges.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EdgeKind::Implements,
                EdgeKind::Uses,
                EdgeKind::Calls,
                EdgeKind::AccessesField
            ]
        );
        assert_eq!(edges[2].from, "p.A.run()");
        assert_eq!(edges[2].resolved_kind, Some(ResolvedKind::Unresolved));
        assert_eq!(edges[3].to, "p.A.count");
    }

    #[test]
    fn method_lookup_ignores_parameters() {
        let chunk = sample();
        assert_eq!(chunk.methods[0].base_name(), "p.A.run");
        assert!(chunk.method("p.A.run").is_some());
        assert!(chunk.method("p.A.stop").is_none());
    }
}
