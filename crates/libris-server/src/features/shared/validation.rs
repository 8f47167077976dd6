//! Shared validation utilities
//!
//! Provides common validation functions for input data across commands.
//!
//! # Examples
//!
//! ```rust,ignore
//! use libris_server::features::shared::validation::{validate_text, validate_non_negative};
//!
//! validate_text("title", &command.title, 255)?;
//! if let Some(pages) = command.page_count {
//!     validate_non_negative("page_count", pages)?;
//! }
//! ```

use thiserror::Error;

/// Maximum length of titles, authors and publishing house names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length of a language tag.
pub const MAX_LANG_LENGTH: usize = 50;

/// Errors raised by field validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldValidationError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },

    #[error("{field} must be at most {max_length} characters")]
    TooLong {
        field: &'static str,
        max_length: usize,
    },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },
}

/// Validate a required text field
///
/// # Rules
/// - Must not be empty after trimming whitespace
/// - Must not exceed `max_length` characters (not bytes)
pub fn validate_text(
    field: &'static str,
    value: &str,
    max_length: usize,
) -> Result<(), FieldValidationError> {
    if value.trim().is_empty() {
        return Err(FieldValidationError::Required { field });
    }

    if value.chars().count() > max_length {
        return Err(FieldValidationError::TooLong { field, max_length });
    }

    Ok(())
}

/// Validate an optional text field, skipping it when absent
pub fn validate_optional_text(
    field: &'static str,
    value: Option<&str>,
    max_length: usize,
) -> Result<(), FieldValidationError> {
    match value {
        Some(value) => validate_text(field, value, max_length),
        None => Ok(()),
    }
}

pub fn validate_non_negative(field: &'static str, value: i32) -> Result<(), FieldValidationError> {
    if value < 0 {
        return Err(FieldValidationError::Negative { field });
    }
    Ok(())
}
