/// Error types for the video platform service
///
/// Every failure surfaces as an `AppError` and is rendered once, at the HTTP
/// boundary, into the error envelope:
/// `{success: false, statusCode, message, errors: [...], stack?}`.
use crate::media::MediaError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use once_cell::sync::OnceCell;
use query_pipeline::PipelineError;
use serde::Serialize;
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, AppError>;

static EXPOSE_ERROR_CHAIN: OnceCell<bool> = OnceCell::new();

/// Record the runtime environment; the error source chain is only rendered
/// outside production.
pub fn configure_error_rendering(app_env: &str) {
    let _ = EXPOSE_ERROR_CHAIN.set(!app_env.eq_ignore_ascii_case("production"));
}

fn expose_error_chain() -> bool {
    *EXPOSE_ERROR_CHAIN.get().unwrap_or(&true)
}

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed identifier, missing or oversized field, bad sort key
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },

    #[error("{0}")]
    Unauthenticated(String),

    /// Caller is not allowed to act on the resource
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Object storage rejected an upload
    #[error("{message}")]
    Upload {
        message: String,
        #[source]
        source: MediaError,
    },

    #[error("Storage operation failed")]
    Database(#[from] sqlx::Error),

    /// A pipeline that failed to compile; never caused by client input
    #[error("Internal server error")]
    Pipeline(#[source] PipelineError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation_with(message: impl Into<String>, errors: Vec<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn upload(message: impl Into<String>, source: MediaError) -> Self {
        AppError::Upload {
            message: message.into(),
            source,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Database(e) => AppError::Database(e),
            e if e.is_client_error() => AppError::validation(e.to_string()),
            e => AppError::Pipeline(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let errors: Vec<String> = errs
            .field_errors()
            .into_iter()
            .flat_map(|(field, list)| {
                list.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{field}: {msg}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();

        let message = errors
            .first()
            .cloned()
            .unwrap_or_else(|| "Invalid request".to_string());
        AppError::validation_with(message, errors)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,
}

fn source_chain(err: &AppError) -> Vec<String> {
    let mut chain = vec![format!("{err:?}")];
    let mut current = std::error::Error::source(err);
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::Upload { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Pipeline(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let errors = match self {
            AppError::Validation { errors, .. } => errors.clone(),
            _ => Vec::new(),
        };

        HttpResponse::build(status).json(ErrorEnvelope {
            success: false,
            status_code: status.as_u16(),
            message: self.to_string(),
            errors,
            stack: expose_error_chain().then(|| source_chain(self)),
        })
    }
}
