use super::ApiError;

/// Record ids arrive as path segments; only positive ids can exist.
pub fn validate_record_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid record ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_search_term(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}

/// Rejects bulk selections containing ids that cannot exist.
pub fn validate_selection(ids: &[i32]) -> Result<&[i32], ApiError> {
    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(ApiError::validation(format!(
            "Invalid record ID in selection: {}",
            bad
        )));
    }
    Ok(ids)
}
