use crate::api::AppState;
use crate::api::schemas::status::StatusResponse;
use axum::{Json, extract::State, response::IntoResponse};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Reports the number of live documents and the server clock.
///
/// # Errors
/// Returns `AppError::Database` if the count query fails.
pub async fn get_status(State(state): State<AppState>) -> crate::error::Result<impl IntoResponse> {
    let active_documents = state.document_service.active_count().await?;
    let now = OffsetDateTime::now_utc();

    Ok(Json(StatusResponse {
        active_documents,
        server_time: now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string()),
    }))
}
