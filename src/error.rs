//! Error types for the analysis engine
//!
//! Only [`ScanError`] aborts a run. Every other error is contained to the
//! file or chunk it occurred in and surfaces as a diagnostic in the final
//! [`RunReport`](crate::analyzer::RunReport).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The project root could not be scanned. Fatal for the whole run.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Project root '{path}' does not exist")]
    RootNotFound { path: PathBuf },

    #[error("Project root '{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Failed to read project root '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No analyzer available for language '{language}': {reason}")]
    LanguageUnavailable { language: String, reason: String },
}

impl ScanError {
    /// Stable status code for programmatic handling
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::RootNotFound { .. } => "ROOT_NOT_FOUND",
            Self::NotADirectory { .. } => "ROOT_NOT_A_DIRECTORY",
            Self::Unreadable { .. } => "ROOT_UNREADABLE",
            Self::LanguageUnavailable { .. } => "LANGUAGE_UNAVAILABLE",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::RootNotFound { .. } | Self::NotADirectory { .. } => vec![
                "Pass the directory that contains your sources, not a single file",
                "Check for typos in the project path",
            ],
            Self::Unreadable { .. } => vec![
                "Check that you have read and list permissions on the directory",
            ],
            Self::LanguageUnavailable { .. } => vec![
                "Enable the language in .chunkforge/settings.toml under [languages.<name>]",
            ],
        }
    }
}

/// A single file could not be parsed. The file is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("Syntax error at line {line}, column {column}: {reason}")]
    Syntax {
        line: u32,
        column: u32,
        reason: String,
    },

    #[error("Invalid UTF-8 in source file")]
    InvalidUtf8,

    #[error("Parser produced no tree")]
    NoTree,
}

impl ParseError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::ParserInit { .. } => "PARSER_INIT",
            Self::Syntax { .. } => "SYNTAX_ERROR",
            Self::InvalidUtf8 => "INVALID_UTF8",
            Self::NoTree => "NO_TREE",
        }
    }
}

/// The semantic service could not serve a session or a query.
///
/// Recoverable: the file falls back to syntax-only resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Semantic service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Semantic service timed out after {elapsed:?} during {operation}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    #[error("Semantic service returned an error for {method}: {message}")]
    Protocol { method: String, message: String },

    #[error("Transport to semantic service failed: {reason}")]
    Transport { reason: String },

    #[error("Session for '{path}' cannot {operation} while {state}")]
    InvalidState {
        path: PathBuf,
        operation: &'static str,
        state: &'static str,
    },
}

impl SessionError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "SESSION_UNAVAILABLE",
            Self::Timeout { .. } => "SESSION_TIMEOUT",
            Self::Protocol { .. } => "SESSION_PROTOCOL",
            Self::Transport { .. } => "SESSION_TRANSPORT",
            Self::InvalidState { .. } => "SESSION_INVALID_STATE",
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl std::fmt::Display) -> Self {
        Self::Transport {
            reason: reason.to_string(),
        }
    }
}

/// The downstream sink rejected a chunk.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to write chunk output to '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize chunk '{name}': {source}")]
    Serialize {
        name: String,
        source: serde_json::Error,
    },

    #[error("Sink rejected chunk '{name}': {reason}")]
    Rejected { name: String, reason: String },
}

impl SinkError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "SINK_IO",
            Self::Serialize { .. } => "SINK_SERIALIZE",
            Self::Rejected { .. } => "SINK_REJECTED",
        }
    }
}

/// Assembling a chunk failed. Indicates an upstream logic error and is
/// fatal for that chunk only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("Declaration at line {line} has no name")]
    MissingName { line: u32 },

    #[error("Declaration '{name}' has no qualified name")]
    MissingQualifiedName { name: String },

    #[error("Method hash is missing for '{method}'")]
    MissingHash { method: String },

    #[error("'{class}' has {extracted} methods but {resolved} resolutions")]
    MethodCountMismatch {
        class: String,
        extracted: usize,
        resolved: usize,
    },
}

impl AssemblyError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::MissingName { .. } => "MISSING_NAME",
            Self::MissingQualifiedName { .. } => "MISSING_QUALIFIED_NAME",
            Self::MissingHash { .. } => "MISSING_HASH",
            Self::MethodCountMismatch { .. } => "METHOD_COUNT_MISMATCH",
        }
    }
}

/// Errors that stop a run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Only raised when fail-fast sink behaviour is configured
    #[error("Run stopped on sink failure: {0}")]
    Sink(#[from] SinkError),

    #[error("Analysis worker failed: {reason}")]
    Worker { reason: String },
}

impl AnalysisError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Scan(e) => e.status_code(),
            Self::Sink(e) => e.status_code(),
            Self::Worker { .. } => "WORKER_FAILED",
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
pub type ParseResult<T> = Result<T, ParseError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type SinkResult<T> = Result<T, SinkError>;
pub type AssemblyResult<T> = Result<T, AssemblyError>;
pub type AnalysisResult<T> = Result<T, AnalysisError>;
