use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Identifier of a discovered source file, assigned in discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Zero-based line/column span of a syntax node.
///
/// Columns are byte offsets within the line, matching tree-sitter points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Range {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Number of lines covered; used to pick the innermost of nested spans.
    pub fn line_span(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line)
    }
}

/// A cursor position in the protocol sense: zero-based line and UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Convert a byte column on `line` of `source` into a UTF-16 column.
    ///
    /// Falls back to the byte column when the line is out of range or the
    /// column does not land on a char boundary.
    pub fn from_byte_column(source: &str, line: u32, byte_column: u32) -> Self {
        let character = source
            .lines()
            .nth(line as usize)
            .and_then(|text| text.get(..byte_column as usize))
            .map(|prefix| prefix.encode_utf16().count() as u32)
            .unwrap_or(byte_column);
        Self { line, character }
    }
}

/// How a call or type reference was tied to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedKind {
    /// Declared inside the analysed project
    Local,
    /// Declared outside the project (library or runtime)
    External,
    /// No declaration could be found
    Unresolved,
}

impl ResolvedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedKind::Local => "local",
            ResolvedKind::External => "external",
            ResolvedKind::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for ResolvedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "annotation",
        }
    }
}

impl FromStr for TypeKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(TypeKind::Class),
            "interface" => Ok(TypeKind::Interface),
            "enum" => Ok(TypeKind::Enum),
            "record" => Ok(TypeKind::Record),
            "annotation" => Ok(TypeKind::Annotation),
            _ => Err("Unknown type kind"),
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a method inside its declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MethodType {
    #[default]
    Regular,
    Constructor,
    Getter,
    Setter,
    Endpoint,
    Configuration,
    Override,
    Static,
}

impl MethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodType::Regular => "regular",
            MethodType::Constructor => "constructor",
            MethodType::Getter => "getter",
            MethodType::Setter => "setter",
            MethodType::Endpoint => "endpoint",
            MethodType::Configuration => "configuration",
            MethodType::Override => "override",
            MethodType::Static => "static",
        }
    }
}

/// Whether every supertype of a chunk was tied to a known declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InheritanceStatus {
    #[default]
    Complete,
    /// Some supertype is unknown or ambiguous, or semantic answers were
    /// unavailable for the file
    Incomplete,
}

impl InheritanceStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, InheritanceStatus::Complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A non-fatal finding collected during a run.
///
/// `code` is a stable machine-readable tag such as `PARSE_SKIPPED` or
/// `AMBIGUOUS_SUPERTYPE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            path: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn info(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.code)?;
        if let Some(path) = &self.path {
            write!(f, "{}", path.display())?;
            if let Some(line) = self.line {
                write!(f, ":{}", line + 1)?;
            }
            write!(f, ": ")?;
        }
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_rejects_zero() {
        assert!(FileId::new(0).is_none());
        assert_eq!(FileId::new(7).map(|id| id.value()), Some(7));
    }

    #[test]
    fn position_counts_utf16_units() {
        let source = "class A {}\nString s = \"é\"; foo();\n";
        // "é" is two bytes but one UTF-16 unit
        let byte_col = source.lines().nth(1).unwrap().find("foo").unwrap() as u32;
        let pos = Position::from_byte_column(source, 1, byte_col);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.character, byte_col - 1);
    }

    #[test]
    fn resolved_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ResolvedKind::Unresolved).unwrap();
        assert_eq!(json, "\"unresolved\"");
    }

    #[test]
    fn type_kind_round_trips_through_str() {
        for kind in [
            TypeKind::Class,
            TypeKind::Interface,
            TypeKind::Enum,
            TypeKind::Record,
            TypeKind::Annotation,
        ] {
            assert_eq!(kind.as_str().parse::<TypeKind>(), Ok(kind));
        }
    }

    #[test]
    fn diagnostic_display_uses_one_based_lines() {
        let diag = Diagnostic::warning("PARSE_SKIPPED", "syntax error")
            .with_path("src/A.java")
            .at_line(4);
        assert_eq!(diag.to_string(), "[PARSE_SKIPPED] src/A.java:5: syntax error");
    }
}
