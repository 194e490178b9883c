//! Request validation

use super::models::HttpServerError;

/// Run ids are UUIDs handed out by the controller; reject anything else early.
pub fn validate_run_id(run_id: &str) -> Result<(), HttpServerError> {
    if run_id.is_empty() {
        return Err(HttpServerError::InvalidRequest(
            "Run ID cannot be empty".to_string(),
        ));
    }

    if run_id.len() > 64 {
        return Err(HttpServerError::InvalidRequest(format!(
            "Run ID too long ({} chars, max 64)",
            run_id.len()
        )));
    }

    if !run_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(HttpServerError::InvalidRequest(
            "Run ID can only contain alphanumeric and hyphen characters".to_string(),
        ));
    }

    Ok(())
}

/// Trim optional text fields; blank becomes `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
