//! Input validation utilities
//!
//! Custom rules for `validator` derives on request DTOs.

use validator::ValidationError;

use crate::{constants, models::Language};

/// Language key must be one of the supported keys
pub fn validate_language_key(key: &str) -> Result<(), ValidationError> {
    if Language::from_key(key).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("unsupported_language");
        err.message = Some(format!("Unsupported language: {}", key).into());
        Err(err)
    }
}

/// Source code must be non-blank and within the size limit
pub fn validate_source_code(code: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() {
        let mut err = ValidationError::new("empty_code");
        err.message = Some("Source code cannot be empty".into());
        return Err(err);
    }
    if code.len() as u64 > constants::MAX_SOURCE_CODE_SIZE {
        let mut err = ValidationError::new("code_too_large");
        err.message = Some("Source code exceeds maximum size of 1MB".into());
        return Err(err);
    }
    Ok(())
}

/// Clamp pagination parameters to sane bounds
pub fn page_bounds(page: Option<u32>, per_page: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page
        .unwrap_or(constants::DEFAULT_PAGE_SIZE)
        .clamp(1, constants::MAX_PAGE_SIZE);
    (page, per_page)
}
