use std::sync::Arc;
use waloo_core::MediaExtractor;

/// Shared application state
pub struct AppState {
    extractor: Arc<dyn MediaExtractor>,
}

impl AppState {
    pub fn new(extractor: Arc<dyn MediaExtractor>) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &dyn MediaExtractor {
        self.extractor.as_ref()
    }
}
