use crate::error::ExtractionError;
use std::sync::Arc;

/// Pure text extraction from the stored payload. Implementations must not
/// touch external state; the store treats a failure as recoverable and
/// substitutes a diagnostic placeholder.
pub trait TextExtractor: Send + Sync + std::fmt::Debug {
    /// Extracts a text rendition of `content`.
    ///
    /// # Errors
    /// Returns `ExtractionError` when no text can be derived.
    fn extract(&self, content: &[u8]) -> Result<String, ExtractionError>;
}

pub type SharedExtractor = Arc<dyn TextExtractor>;

/// Extractor for plain-text payloads. Rejects payloads that are not valid
/// UTF-8 rather than producing mojibake previews.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract(&self, content: &[u8]) -> Result<String, ExtractionError> {
        String::from_utf8(content.to_vec())
            .map_err(|e| ExtractionError(format!("document is not valid UTF-8: {e}")))
    }
}
