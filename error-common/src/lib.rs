//! Common error handling utilities for My Desk
//!
//! Standardized error type, error codes and error context shared by the
//! sync engine and the record server.
//!
//! # Example
//!
//! ```rust
//! use error_common::{DeskError, ErrorContext, report_error};
//!
//! fn require_file_no(file_no: &str) -> error_common::Result<&str> {
//!     if file_no.trim().is_empty() {
//!         return Err(DeskError::ValidationError("fileNo required".to_string()));
//!     }
//!     Ok(file_no)
//! }
//!
//! if let Err(e) = require_file_no("  ") {
//!     report_error(&e, &ErrorContext::new().with_collection("inward"));
//! }
//! ```

pub mod codes;
pub mod context;
pub mod reporting;
pub mod types;

pub use context::*;
pub use reporting::*;
pub use types::*;
