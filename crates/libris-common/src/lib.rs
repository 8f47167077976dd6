//! Libris Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging infrastructure for the Libris project.
//!
//! # Overview
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: tracing subscriber setup driven by [`logging::LogConfig`]
//! - **Rotation**: a size-based log sink that keeps gzip-compressed backups
//! - **Filtering**: a target block-list applied before any output
//!
//! # Example
//!
//! ```no_run
//! use libris_common::rotation::{RotatingFileSink, RotationConfig};
//!
//! fn main() -> libris_common::Result<()> {
//!     let sink = RotatingFileSink::open(RotationConfig::new("logs/message.log"))?;
//!     sink.append("hello")?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod filter;
pub mod logging;
pub mod rotation;

// Re-export commonly used types
pub use error::{LibrisError, Result};
pub use filter::BlockListFilter;
pub use rotation::{RotatingFileSink, RotationConfig, RotationError};
