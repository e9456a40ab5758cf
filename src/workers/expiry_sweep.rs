use crate::config::StoreConfig;
use crate::error::AppError;
use crate::storage::document_repo::DocumentRepository;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    purged_total: Counter<u64>,
    sweep_errors: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("printdrop-server");
        Self {
            purged_total: meter
                .u64_counter("printdrop_documents_purged_total")
                .with_description("Total documents purged, by expiry path")
                .build(),
            sweep_errors: meter
                .u64_counter("printdrop_sweep_errors_total")
                .with_description("Total failed expiry sweep iterations")
                .build(),
        }
    }
}

/// Periodic expiry sweep: the durability backstop behind the per-document
/// deferred purge tasks. Guarantees eventual purge even when every deferred
/// task is lost to a restart, at the cost of a document living at most one
/// sweep interval past its nominal expiry.
///
/// The sweep and the deferred tasks never coordinate; both funnel into the
/// same idempotent delete, so whichever fires first wins and the loser's
/// attempt is a no-op.
#[derive(Debug)]
pub struct ExpirySweepWorker {
    repo: DocumentRepository,
    config: StoreConfig,
    metrics: Metrics,
}

impl ExpirySweepWorker {
    #[must_use]
    pub fn new(repo: DocumentRepository, config: StoreConfig) -> Self {
        Self { repo, config, metrics: Metrics::new() }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.sweep_interval_secs));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.perform_sweep()
                        .instrument(tracing::info_span!("expiry_sweep_iteration"))
                        .await
                    {
                        self.metrics.sweep_errors.add(1, &[]);
                        tracing::error!(error = ?e, "Expiry sweep iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Expiry sweep loop shutting down...");
    }

    /// Deletes every document whose expiry has arrived.
    ///
    /// # Errors
    /// Returns an error if the delete statement fails.
    #[tracing::instrument(skip(self), err, fields(purged = tracing::field::Empty))]
    pub async fn perform_sweep(&self) -> Result<u64, AppError> {
        let count = self.repo.delete_expired(OffsetDateTime::now_utc()).await?;

        if count > 0 {
            tracing::info!(count = %count, "Swept expired documents");
            self.metrics.purged_total.add(count, &[KeyValue::new("path", "sweep")]);
            tracing::Span::current().record("purged", count);
        }

        Ok(count)
    }
}
