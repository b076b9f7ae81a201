//! Utility functions

pub mod validation;

pub use validation::{page_bounds, validate_language_key, validate_source_code};
