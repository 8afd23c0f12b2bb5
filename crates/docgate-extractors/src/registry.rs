//! Registry mapping backend kinds to extractors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ChatConfig, VisionConfig};
use crate::ocr::OcrExtractor;
use crate::openai::OpenAiChatModel;
use crate::pdf::PdfExtractor;
use crate::spreadsheet::SpreadsheetExtractor;
use crate::structured::StructuredDataExtractor;
use crate::types::BackendKind;
use crate::vision::GoogleVisionDetector;
use crate::Extractor;

/// Holds one shared extractor per backend kind.
///
/// Extractors are created once and handed out as `Arc`s, so any client
/// state they cache lives as long as the registry.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<BackendKind, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the production backend for every kind.
    ///
    /// Remote clients are not contacted here; they resolve credentials on
    /// first use.
    pub fn with_defaults(chat: ChatConfig, vision: VisionConfig) -> Self {
        let strict_json = chat.strict_json;
        Self::new()
            .register(Arc::new(SpreadsheetExtractor::new()))
            .register(Arc::new(PdfExtractor::new()))
            .register(Arc::new(OcrExtractor::new(Arc::new(
                GoogleVisionDetector::new(vision),
            ))))
            .register(Arc::new(
                StructuredDataExtractor::new(Arc::new(OpenAiChatModel::new(chat)))
                    .with_strict_json(strict_json),
            ))
    }

    /// Register an extractor under its own kind, replacing any previous one.
    pub fn register(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.insert(extractor.kind(), extractor);
        self
    }

    /// Extractor for a kind, if one is registered.
    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&kind).cloned()
    }

    /// Check if the registry can serve a kind.
    pub fn supports(&self, kind: BackendKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Get the number of registered extractors.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Check if the registry has no registered extractors.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_empty() {
        let registry = ExtractorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(BackendKind::Pdf).is_none());
    }

    #[test]
    fn test_registry_with_defaults_covers_every_kind() {
        let registry = ExtractorRegistry::with_defaults(ChatConfig::default(), VisionConfig::default());
        assert_eq!(registry.len(), 4);
        for kind in BackendKind::ALL {
            let extractor = registry.get(kind).unwrap();
            assert_eq!(extractor.kind(), kind);
        }
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let registry = ExtractorRegistry::new()
            .register(Arc::new(PdfExtractor::new()))
            .register(Arc::new(PdfExtractor::new()));
        assert_eq!(registry.len(), 1);
        assert!(registry.supports(BackendKind::Pdf));
        assert!(!registry.supports(BackendKind::Image));
    }
}
