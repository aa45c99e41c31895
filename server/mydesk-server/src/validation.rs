//! Request validation utilities for consistent validation across handlers
//!
//! This module provides a `RequestValidation` trait and helper macros to
//! centralize validation logic and ensure consistent error messages.

use crate::error::ApiError;

/// Trait for validating request payloads
///
/// Implement this trait for create/update request types so every handler
/// rejects bad input with the same 400 response.
pub trait RequestValidation {
    /// Returns `Err(ApiError::Validation)` describing the first failed check
    fn validate(&self) -> Result<(), ApiError>;
}

/// Macro for validating fields with custom predicates
///
/// # Usage
///
/// ```rust,ignore
/// validate_field!(self.file_no, !self.file_no.trim().is_empty(), "fileNo required");
/// ```
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Macro for validating required fields (non-blank strings)
///
/// # Usage
///
/// ```rust,ignore
/// validate_required!(self.subject, "Missing required fields");
/// ```
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for validating optional string fields that must be present and non-blank
///
/// # Usage
///
/// ```rust,ignore
/// validate_present!(self.title, "Missing title/dueDate");
/// ```
#[macro_export]
macro_rules! validate_present {
    ($field:expr, $message:expr) => {
        $crate::validate_field!(
            $field,
            $field.as_deref().is_some_and(|v: &str| !v.trim().is_empty()),
            $message
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    struct TestRequest {
        file_no: String,
        due_date: Option<String>,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_required!(self.file_no, "fileNo required");
            validate_present!(self.due_date, "dueDate required");
            Ok(())
        }
    }

    #[test]
    fn test_validation_success() {
        let request = TestRequest {
            file_no: "101/GA".to_string(),
            due_date: Some("2025-03-01".to_string()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_required_field() {
        let request = TestRequest {
            file_no: "   ".to_string(),
            due_date: Some("2025-03-01".to_string()),
        };
        assert_eq!(request.validate().unwrap_err().to_string(), "fileNo required");
    }

    #[test]
    fn test_missing_optional_field() {
        let request = TestRequest {
            file_no: "101/GA".to_string(),
            due_date: None,
        };
        assert_eq!(request.validate().unwrap_err().to_string(), "dueDate required");

        let request = TestRequest {
            file_no: "101/GA".to_string(),
            due_date: Some(String::new()),
        };
        assert!(request.validate().is_err());
    }
}
