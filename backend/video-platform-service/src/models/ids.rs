use crate::error::AppError;
use uuid::Uuid;

/// Parse a client-supplied identifier; `what` names it in the error message
/// (e.g. "video ID").
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{what} is required")));
    }
    Uuid::parse_str(trimmed).map_err(|_| AppError::validation(format!("Invalid {what}")))
}
