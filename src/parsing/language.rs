//! Language detection and enumeration

use serde::{Deserialize, Serialize};

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Java,
}

impl Language {
    /// Every language the engine knows how to analyse
    pub const ALL: &'static [Language] = &[Language::Java];

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext_lower = ext.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext_lower.as_str()))
    }

    /// Detect language from file path
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get default file extensions for this language
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Java => &["java"],
        }
    }

    /// Get the configuration key for this language
    pub fn config_key(&self) -> &str {
        match self {
            Language::Java => "java",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &str {
        match self {
            Language::Java => "Java",
        }
    }

    /// Look up a language by its configuration key
    pub fn from_config_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|lang| lang.config_key() == key)
    }

    /// Node kinds of top-level type declarations
    pub fn declaration_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Java => crate::parsing::java::constants::TYPE_DECLARATION_KINDS,
        }
    }

    /// The tree-sitter grammar for this language
    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Language::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
