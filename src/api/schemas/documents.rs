use crate::domain::document::Document;
use crate::print::PrintOutcome;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

#[derive(Debug, Deserialize)]
pub struct StoreDocumentQuery {
    pub filename: String,
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocumentResponse {
    pub code: String,
    pub filename: String,
    pub expires_at: String,
    pub ttl_minutes: i64,
}

impl From<&Document> for StoreDocumentResponse {
    fn from(doc: &Document) -> Self {
        Self {
            code: doc.code.clone(),
            filename: doc.filename.clone(),
            expires_at: rfc3339(doc.expires_at),
            ttl_minutes: doc.ttl_minutes,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub code: String,
    pub filename: String,
    pub created_at: String,
    pub expires_at: String,
    pub minutes_remaining: i64,
    pub preview: String,
}

impl DocumentResponse {
    #[must_use]
    pub fn from_document(doc: &Document, now: OffsetDateTime) -> Self {
        Self {
            code: doc.code.clone(),
            filename: doc.filename.clone(),
            created_at: rfc3339(doc.created_at),
            expires_at: rfc3339(doc.expires_at),
            minutes_remaining: doc.minutes_remaining(now),
            preview: doc.extracted_text.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub printer_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
    pub debug_trace: String,
}

impl From<PrintOutcome> for PrintResponse {
    fn from(outcome: PrintOutcome) -> Self {
        Self { success: outcome.success, message: outcome.message, debug_trace: outcome.debug_trace }
    }
}
