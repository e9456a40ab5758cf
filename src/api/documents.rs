use crate::api::AppState;
use crate::api::schemas::documents::{
    DocumentResponse, PrintRequest, PrintResponse, StoreDocumentQuery, StoreDocumentResponse,
};
use crate::error::{AppError, Result};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use time::OffsetDateTime;

/// Stores an uploaded document and returns its print code.
///
/// # Errors
/// Returns `AppError::BadRequest` on validation failures and
/// `AppError::PayloadTooLarge` when the body exceeds the configured limit.
pub async fn store_document(
    State(state): State<AppState>,
    Query(query): Query<StoreDocumentQuery>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    if body.is_empty() {
        return Err(AppError::BadRequest("document body must not be empty".to_string()));
    }

    let document = state.document_service.store(&query.filename, body.to_vec(), query.ttl_minutes).await?;

    Ok((StatusCode::CREATED, Json(StoreDocumentResponse::from(&document))))
}

/// Returns document metadata and the extracted-text preview.
///
/// # Errors
/// Returns `AppError::CodeNotFound` when the code is unknown or the document
/// has expired; the two cases are deliberately indistinguishable.
pub async fn get_document(State(state): State<AppState>, Path(code): Path<String>) -> Result<impl IntoResponse> {
    let document = state.document_service.retrieve(&code).await?.ok_or(AppError::CodeNotFound)?;

    Ok(Json(DocumentResponse::from_document(&document, OffsetDateTime::now_utc())))
}

/// Returns the stored document bytes.
///
/// # Errors
/// Returns `AppError::CodeNotFound` when the code is unknown or expired.
pub async fn get_document_content(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let document = state.document_service.retrieve(&code).await?.ok_or(AppError::CodeNotFound)?;

    let disposition = format!("attachment; filename=\"{}\"", document.filename.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.content,
    ))
}

/// Dispatches the document to a local printer. Every dispatch outcome,
/// success or failure, is a 200 with the structured result and debug trace.
///
/// # Errors
/// Returns `AppError::CodeNotFound` when the code is unknown or expired; the
/// dispatcher is never invoked for such a request.
pub async fn print_document(
    State(state): State<AppState>,
    Path(code): Path<String>,
    body: Option<Json<PrintRequest>>,
) -> Result<impl IntoResponse> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let outcome = state.document_service.print(&code, request.printer_name.as_deref()).await?;

    Ok(Json(PrintResponse::from(outcome)))
}
