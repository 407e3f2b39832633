use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

/// Result alias for registration-time operations.
pub type SwaggerResult<T> = Result<T, SwaggerError>;

/// Errors raised while building the document. They surface during application start-up
/// and are meant to abort it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SwaggerError {
    /// An operation declaration violates a structural contract.
    #[error("invalid operation spec: {0}")]
    InvalidOperationSpec(String),
    /// Two distinct sources claim the same definition name.
    #[error("definition name collision for `{name}`: already registered from {existing}, now from {incoming}")]
    DefinitionNameCollision {
        /// Contested definition name.
        name: String,
        /// Origin of the stored definition.
        existing: String,
        /// Origin of the rejected registration.
        incoming: String,
    },
}

/// Errors returned by the documentation routes.
#[derive(Debug, Error)]
pub enum DocsError {
    /// The requested file is not part of the bundled UI.
    #[error("unknown static asset: {0}")]
    UnknownStaticAsset(String),
    /// The bundled UI could not be rendered.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for DocsError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            DocsError::UnknownStaticAsset(_) => StatusCode::NOT_FOUND,
            DocsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
