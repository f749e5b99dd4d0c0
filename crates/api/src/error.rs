use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loyalty_core::eligibility::EligibilityError;
use loyalty_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`], sqlx and eligibility errors.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `loyalty_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An eligibility evaluation could not complete.
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Eligibility evaluation ---
            AppError::Eligibility(err) => match err {
                EligibilityError::DataAccess(e) => {
                    tracing::error!(error = %e, "Eligibility data access failed");
                    internal()
                }
                EligibilityError::TimedOut(after) => {
                    tracing::warn!(timeout_ms = after.as_millis() as u64, "Ledger read timed out");
                    (
                        StatusCode::GATEWAY_TIMEOUT,
                        "LEDGER_TIMEOUT",
                        "Ledger read timed out".to_string(),
                    )
                }
                EligibilityError::Cancelled => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CANCELLED",
                    "Evaluation was cancelled".to_string(),
                ),
                EligibilityError::LookbackOutOfRange { criteria_id } => {
                    tracing::error!(criteria_id, "Stored criteria lookback out of range");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INVALID_CRITERIA",
                        err.to_string(),
                    )
                }
            },
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on a `uq_`-prefixed constraint or index map to 409.
/// - Foreign key and check violations map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            match db_err.code().as_deref() {
                // PostgreSQL unique_violation
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    if constraint.starts_with("uq_") {
                        return (
                            StatusCode::CONFLICT,
                            "CONFLICT",
                            format!("Duplicate value violates unique constraint: {constraint}"),
                        );
                    }
                }
                // PostgreSQL foreign_key_violation
                Some("23503") => {
                    return (
                        StatusCode::BAD_REQUEST,
                        "BAD_REQUEST",
                        "Referenced record does not exist".to_string(),
                    );
                }
                // PostgreSQL check_violation
                Some("23514") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    return (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        format!("Value violates check constraint: {constraint}"),
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
