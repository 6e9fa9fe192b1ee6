use thiserror::Error;

/// Errors raised while building, compiling or executing a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown field '{field}' on collection '{collection}'")]
    UnknownField {
        collection: &'static str,
        field: String,
    },

    /// Internal fields (credentials, emails) never leave the storage layer.
    #[error("field '{field}' of collection '{collection}' is not public")]
    NonPublicField {
        collection: &'static str,
        field: String,
    },

    #[error("cannot sort by '{field}'; allowed: {allowed}")]
    UnsortableField { field: String, allowed: String },

    #[error("stage references '{field}' which is not produced by a preceding lookup")]
    UnboundLookupField { field: String },

    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PipelineError {
    /// Errors caused by caller-supplied input rather than by a malformed pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::UnsortableField { .. })
    }
}
