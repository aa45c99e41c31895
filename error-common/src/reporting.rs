// Error reporting utilities

use crate::context::ErrorContext;
use crate::types::DeskError;

/// Log an error together with its context as a single structured event
pub fn report_error(error: &DeskError, context: &ErrorContext) {
    tracing::error!(
        error_code = error.code(),
        request_id = context.request_id.as_deref().unwrap_or("-"),
        user_id = context.user_id.as_deref().unwrap_or("-"),
        collection = context.collection.as_deref().unwrap_or("-"),
        error = %error,
        "My Desk error occurred"
    );
}
