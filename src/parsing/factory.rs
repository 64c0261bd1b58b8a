//! Extractor factory with configuration-based instantiation.
//!
//! Hands out the [`LanguageExtractor`] for a language, refusing languages
//! that are disabled in the settings.

use super::{JavaExtractor, Language, LanguageExtractor};
use crate::config::Settings;
use crate::error::{ScanError, ScanResult};
use std::sync::Arc;

#[derive(Debug)]
pub struct ExtractorFactory {
    settings: Arc<Settings>,
}

impl ExtractorFactory {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Extractor for `language`.
    ///
    /// Fails with [`ScanError::LanguageUnavailable`] when the language is
    /// disabled in configuration.
    pub fn create_extractor(&self, language: Language) -> ScanResult<Arc<dyn LanguageExtractor>> {
        if !self.is_language_enabled(language) {
            return Err(ScanError::LanguageUnavailable {
                language: language.name().to_string(),
                reason: "disabled in configuration".to_string(),
            });
        }

        match language {
            Language::Java => Ok(Arc::new(JavaExtractor::new())),
        }
    }

    /// Returns false if language not found in settings
    pub fn is_language_enabled(&self, language: Language) -> bool {
        self.settings
            .languages
            .get(language.config_key())
            .map(|config| config.enabled)
            .unwrap_or(false)
    }

    pub fn enabled_languages(&self) -> Vec<Language> {
        Language::ALL
            .iter()
            .copied()
            .filter(|&lang| self.is_language_enabled(lang))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_java_extractor() {
        let factory = ExtractorFactory::new(Arc::new(Settings::default()));
        let extractor = factory.create_extractor(Language::Java).unwrap();
        assert_eq!(extractor.language(), Language::Java);
    }

    #[test]
    fn test_disabled_language() {
        let mut settings = Settings::default();
        if let Some(java) = settings.languages.get_mut("java") {
            java.enabled = false;
        }

        let factory = ExtractorFactory::new(Arc::new(settings));
        let result = factory.create_extractor(Language::Java);
        assert!(matches!(
            result,
            Err(ScanError::LanguageUnavailable { reason, .. }) if reason.contains("disabled")
        ));
        assert!(factory.enabled_languages().is_empty());
    }

    #[test]
    fn test_enabled_languages() {
        let factory = ExtractorFactory::new(Arc::new(Settings::default()));
        assert_eq!(factory.enabled_languages(), vec![Language::Java]);
    }
}
