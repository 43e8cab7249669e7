use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use core_types::CoreError;
use database::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing form fields. Raised before any query runs.
    #[error("{0}")]
    Validation(#[from] CoreError),

    /// The write collided with a unique constraint.
    #[error("{message}")]
    Conflict {
        message: &'static str,
        source: DbError,
    },

    /// Any other data-layer failure. `context` is what the client sees.
    #[error("{context}")]
    Database {
        context: &'static str,
        source: DbError,
    },

    /// A form post without a matching CSRF token.
    #[error("Invalid CSRF token")]
    Csrf,

    #[error("Template rendering failed: {0}")]
    Render(#[from] askama::Error),
}

impl AppError {
    /// Wraps a data-layer error with the message shown to the client, for use
    /// with `map_err`.
    pub fn database(context: &'static str) -> impl FnOnce(DbError) -> Self {
        move |source| AppError::Database { context, source }
    }
}

/// Converts our custom `AppError` into a short plain-text HTTP response.
/// Details stay in the server log.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(err) => {
                tracing::info!(field = err.field(), "Rejected form input.");
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Conflict { message, source } => {
                tracing::warn!(error = %source, "Conflicting write.");
                (StatusCode::BAD_REQUEST, (*message).to_string())
            }
            AppError::Csrf => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Database { context, source } => {
                tracing::error!(error = ?source, "{context}");
                (StatusCode::INTERNAL_SERVER_ERROR, (*context).to_string())
            }
            AppError::Render(err) => {
                tracing::error!(error = ?err, "Template rendering error.");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        (status, message).into_response()
    }
}
