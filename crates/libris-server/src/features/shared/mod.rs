//! Shared utilities and types for feature modules
//!
//! # Contents
//!
//! - **pagination**: Common pagination types and helpers
//! - **validation**: Input validation utilities
//! - **error_helpers**: Database error handling utilities

pub mod error_helpers;
pub mod pagination;
pub mod validation;

// Re-export commonly used types
pub use pagination::{Paginated, PaginationMetadata, PaginationParams};
pub use validation::{
    validate_non_negative, validate_optional_text, validate_text, FieldValidationError,
    MAX_LANG_LENGTH, MAX_NAME_LENGTH,
};
