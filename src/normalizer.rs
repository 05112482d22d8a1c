// src/normalizer.rs
// Stage 1: lowercases the raw query before curated matching.

use crate::error::ResolveError;

pub fn normalize_query(raw: &str) -> Result<String, ResolveError> {
    if raw.trim().is_empty() {
        return Err(ResolveError::InvalidInput("query must not be empty".to_string()));
    }
    Ok(raw.to_lowercase())
}
