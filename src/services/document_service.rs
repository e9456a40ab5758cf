use crate::config::StoreConfig;
use crate::domain::{code, document::Document};
use crate::error::{AppError, Result};
use crate::print::{PrintDispatcher, PrintOutcome};
use crate::services::extract::SharedExtractor;
use crate::storage::document_repo::DocumentRepository;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use time::{Duration, OffsetDateTime};
use tracing::Instrument;

/// Attempts at minting a fresh code when the storage primary key reports a
/// collision. Codes are time-derived, so a second attempt virtually always
/// succeeds.
const CODE_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) stored_total: Counter<u64>,
    pub(crate) purged_total: Counter<u64>,
    pub(crate) document_size_bytes: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("printdrop-server");
        Self {
            stored_total: meter
                .u64_counter("printdrop_documents_stored_total")
                .with_description("Total documents stored")
                .build(),
            purged_total: meter
                .u64_counter("printdrop_documents_purged_total")
                .with_description("Total documents purged, by expiry path")
                .build(),
            document_size_bytes: meter
                .u64_histogram("printdrop_document_size_bytes")
                .with_description("Distribution of stored document sizes")
                .build(),
        }
    }
}

/// The single entry point external surfaces call: stores documents under
/// short-lived codes, retrieves them while they are live, and hands their
/// bytes to the print dispatcher.
#[derive(Clone, Debug)]
pub struct DocumentService {
    repo: DocumentRepository,
    extractor: SharedExtractor,
    dispatcher: PrintDispatcher,
    config: StoreConfig,
    metrics: Metrics,
}

impl DocumentService {
    #[must_use]
    pub fn new(
        repo: DocumentRepository,
        extractor: SharedExtractor,
        dispatcher: PrintDispatcher,
        config: StoreConfig,
    ) -> Self {
        Self { repo, extractor, dispatcher, config, metrics: Metrics::new() }
    }

    /// Stores a document and schedules its deferred purge.
    ///
    /// Text extraction failures degrade to a diagnostic placeholder; the
    /// upload itself never fails on them.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` on an empty filename or a TTL outside
    /// the configured bounds, `AppError::PayloadTooLarge` on an oversized
    /// payload, and `AppError::Database` if the write fails.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, content),
        fields(size = content.len(), code = tracing::field::Empty)
    )]
    pub async fn store(&self, filename: &str, content: Vec<u8>, ttl_minutes: Option<i64>) -> Result<Document> {
        if filename.trim().is_empty() {
            return Err(AppError::BadRequest("filename must not be empty".to_string()));
        }

        let ttl_minutes = ttl_minutes.unwrap_or(self.config.default_ttl_minutes);
        if ttl_minutes < 1 || ttl_minutes > self.config.max_ttl_minutes {
            return Err(AppError::BadRequest(format!(
                "ttl_minutes must be between 1 and {}",
                self.config.max_ttl_minutes
            )));
        }

        if content.len() > self.config.max_document_size_bytes {
            return Err(AppError::PayloadTooLarge);
        }

        let extracted_text = self.extractor.extract(&content).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Text extraction failed, storing placeholder");
            format!("Error extracting text: {e}")
        });

        // Second precision: what we return matches what the sweep predicate sees.
        let created_at = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp())
            .map_err(|_| AppError::Internal)?;
        let expires_at = created_at + Duration::minutes(ttl_minutes);

        let size = content.len() as u64;
        let mut document = Document {
            code: code::generate(created_at),
            filename: filename.to_string(),
            content,
            extracted_text,
            created_at,
            ttl_minutes,
            expires_at,
        };

        let mut attempt = 1;
        loop {
            match self.repo.insert(&document).await {
                Ok(()) => break,
                Err(AppError::Conflict(_)) if attempt < CODE_ATTEMPTS => {
                    attempt += 1;
                    document.code = code::generate(created_at);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::Span::current().record("code", document.code.as_str());
        tracing::info!(expires_at = %document.expires_at, ttl_minutes, "Document stored");
        self.metrics.stored_total.add(1, &[]);
        self.metrics.document_size_bytes.record(size, &[]);

        let _ = self
            .schedule_purge(&document.code, std::time::Duration::from_secs(u64::try_from(ttl_minutes).unwrap_or(0) * 60));

        Ok(document)
    }

    /// Spawns the deferred purge task for `code`: sleep the TTL, then an
    /// idempotent delete. Never cancelled; if the sweep wins the race this
    /// delete is a no-op, and if the process restarts before it fires the
    /// sweep covers the loss.
    pub fn schedule_purge(&self, code: &str, delay: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let repo = self.repo.clone();
        let metrics = self.metrics.clone();
        let code = code.to_string();
        tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                match repo.delete_by_code(&code).await {
                    Ok(0) => tracing::debug!(code = %code, "Deferred purge: document already gone"),
                    Ok(_) => {
                        tracing::info!(code = %code, "Deferred purge removed document");
                        metrics.purged_total.add(1, &[KeyValue::new("path", "deferred")]);
                    }
                    Err(e) => {
                        tracing::warn!(code = %code, error = ?e, "Deferred purge failed; sweep will cover it");
                    }
                }
            }
            .instrument(tracing::info_span!("deferred_purge")),
        )
    }

    /// Fetches a live document. A record whose expiry has arrived is reported
    /// absent even before a deletion path has removed it; the read itself
    /// never deletes.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn retrieve(&self, code: &str) -> Result<Option<Document>> {
        let Some(document) = self.repo.find_by_code(code).await? else {
            return Ok(None);
        };

        if document.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::debug!(code = %code, "Document present but logically expired");
            return Ok(None);
        }

        Ok(Some(document))
    }

    /// Resolves the document behind `code` and dispatches it to a printer.
    ///
    /// # Errors
    /// Returns `AppError::CodeNotFound` for an unknown or expired code; the
    /// dispatcher is not invoked in that case. Dispatch failures are not
    /// errors — they come back inside the outcome.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn print(&self, code: &str, printer_name: Option<&str>) -> Result<PrintOutcome> {
        let document = self.retrieve(code).await?.ok_or(AppError::CodeNotFound)?;
        Ok(self.dispatcher.dispatch(&document.content, printer_name).await)
    }

    /// Count of documents still live.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn active_count(&self) -> Result<i64> {
        self.repo.count_active(OffsetDateTime::now_utc()).await
    }
}
