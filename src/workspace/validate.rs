use crate::shared::ids::SessionId;

pub fn validate_session_id(raw: &str) -> Result<SessionId, String> {
    SessionId::parse(raw)
}

/// Accepts only a single flat file name: no separators of either flavour and
/// no `..` anywhere in the value.
pub fn validate_relative_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("file path must be non-empty".to_string());
    }
    if path.contains('/') || path.contains('\\') {
        return Err("file path must not contain path separators".to_string());
    }
    if path.contains("..") {
        return Err("file path must not contain `..`".to_string());
    }
    Ok(())
}
