//! Owned structural facts pulled out of a syntax tree.
//!
//! Extraction runs synchronously against a [`SyntaxTree`](super::SyntaxTree)
//! and produces these records; nothing here borrows from the tree, so facts
//! can cross await points and thread boundaries.

use crate::types::{Diagnostic, MethodType, Range, TypeKind};
use serde::{Deserialize, Serialize};

/// `import` declaration as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Dotted path without `static` or the trailing `.*`
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

impl ImportDecl {
    /// Last path segment (`java.util.List` -> `List`)
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// Package and imports of one compilation unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub package: String,
    pub imports: Vec<ImportDecl>,
}

impl FileHeader {
    pub fn qualify(&self, dotted: &str) -> String {
        if self.package.is_empty() {
            dotted.to_string()
        } else {
            format!("{}.{dotted}", self.package)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFact {
    /// Name without `@`, possibly qualified (`Override`, `org.junit.Test`)
    pub name: String,
    /// Full annotation text including arguments
    pub text: String,
}

impl AnnotationFact {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// An externally reachable entry point declared by annotations.
///
/// Covers HTTP handlers as well as message and event consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestEndpoint {
    /// HTTP verb, `REQUEST`, or a consumer kind such as `KAFKA_CONSUMER`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produces: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumes: Option<String>,
}

impl RestEndpoint {
    pub fn http(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: Some(path.into()),
            produces: None,
            consumes: None,
        }
    }

    pub fn consumer(kind: impl Into<String>, consumes: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            path: None,
            produces: None,
            consumes: Some(consumes.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamFact {
    pub name: String,
    /// Declared type as written, varargs `...` folded into `[]`
    pub type_name: String,
}

/// A method invocation inside a method body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFact {
    pub name: String,
    /// Receiver expression text, `None` for bare calls
    pub receiver: Option<String>,
    /// Position of the method name identifier
    pub name_range: Range,
    pub arg_count: usize,
}

impl CallFact {
    /// `receiver.name` or `name`, the callee text as written
    pub fn literal(&self) -> String {
        match &self.receiver {
            Some(receiver) => format!("{receiver}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Bare, `this.` and `super.` calls target the enclosing type hierarchy
    pub fn targets_self(&self) -> bool {
        matches!(self.receiver.as_deref(), None | Some("this") | Some("super"))
    }
}

/// A type reference as written, with the position of its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFact {
    pub name: String,
    pub type_name: String,
    pub is_public: bool,
    pub is_static: bool,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFacts {
    pub name: String,
    /// `name(params)` with whitespace normalised
    pub signature: String,
    pub params: Vec<ParamFact>,
    pub return_type: Option<String>,
    pub is_constructor: bool,
    /// Declared without a body
    pub is_abstract: bool,
    pub is_static: bool,
    pub is_public: bool,
    pub annotations: Vec<AnnotationFact>,
    /// Declaration text in the comment-stripped source
    pub text: String,
    pub range: Range,
    pub name_range: Range,
    pub calls: Vec<CallFact>,
    /// Every type name referenced by the signature and body, in order
    pub type_refs: Vec<TypeRef>,
    /// Type names that appear in the public signature only
    pub signature_types: Vec<String>,
    /// Local variable name -> declared type
    pub locals: Vec<(String, String)>,
    pub field_accesses: Vec<String>,
    pub endpoints: Vec<RestEndpoint>,
    pub method_type: MethodType,
}

impl MethodFacts {
    pub fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotations.iter().any(|a| a.simple_name() == simple_name)
    }

    /// Declared type of a parameter or local variable visible in this method
    pub fn variable_type(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, ty)| ty.as_str())
            .or_else(|| {
                self.params
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.type_name.as_str())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFacts {
    pub name: String,
    /// `pkg.Outer.Inner`
    pub fqn: String,
    pub package: String,
    pub kind: TypeKind,
    pub modifiers: Vec<String>,
    pub annotations: Vec<AnnotationFact>,
    /// Superclass as written; `None` for interfaces
    pub extends: Option<TypeRef>,
    /// Implemented interfaces, or extended interfaces for an interface
    pub implements: Vec<TypeRef>,
    pub fields: Vec<FieldFact>,
    pub methods: Vec<MethodFacts>,
    /// Type names referenced by field declarations
    pub field_type_refs: Vec<TypeRef>,
    pub text: String,
    pub range: Range,
    pub name_range: Range,
    pub parent_fqn: Option<String>,
    /// Simple names of directly nested types
    pub nested_types: Vec<String>,
    pub is_configuration: bool,
}

impl ClassFacts {
    pub fn is_nested(&self) -> bool {
        self.parent_fqn.is_some()
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == TypeKind::Interface || self.modifiers.iter().any(|m| m == "abstract")
    }

    pub fn field_type(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.type_name.as_str())
    }

    pub fn declares_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    /// Every supertype as written, superclass first
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.extends.iter().chain(self.implements.iter())
    }
}

/// Lightweight declaration record used by the first, index-only pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationFacts {
    pub name: String,
    pub fqn: String,
    pub kind: TypeKind,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub methods: Vec<MemberDecl>,
    pub fields: Vec<MemberDecl>,
    pub range: Range,
    pub parent_fqn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: String,
    /// `name(params)` for methods, the bare name for fields
    pub signature: String,
    pub is_public: bool,
    pub range: Range,
}

/// Everything extracted from one file in the analysis pass
#[derive(Debug, Clone, Default)]
pub struct FileFacts {
    pub header: FileHeader,
    pub classes: Vec<ClassFacts>,
    pub diagnostics: Vec<Diagnostic>,
}
