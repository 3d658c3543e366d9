use crate::utils::error::{GradebookError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Into<String>, reason: impl Into<String>) -> GradebookError {
    GradebookError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

/// 後端位址：http(s)，不帶 query 或 fragment，路徑會直接接上 /api/...
pub fn validate_base_url(field: &str, raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(invalid(field, raw, "Backend address is required"));
    }
    let url = Url::parse(raw)
        .map_err(|e| invalid(field, raw, format!("Not a backend address: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field,
            raw,
            format!("Backend must be reached over http or https, not {}", url.scheme()),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid(field, raw, "Backend address cannot carry a query or fragment"));
    }
    Ok(())
}

pub fn validate_token_path(field: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field, path, "Token file path is required"));
    }
    if path.contains('\0') {
        return Err(invalid(field, path, "Token file path contains a NUL byte"));
    }
    if path.ends_with('/') {
        return Err(invalid(field, path, "Token file path names a directory"));
    }
    Ok(())
}

pub fn validate_timeout(field: &str, seconds: u64) -> Result<()> {
    if seconds == 0 {
        return Err(invalid(field, "0", "Request timeout must be at least 1 second"));
    }
    Ok(())
}

pub fn validate_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(invalid(field, value, format!("Expected one of: {}", allowed.join(", "))))
}
