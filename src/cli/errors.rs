//! CLI-specific error formatting for user-facing messages.

use crate::error::{ClientError, ErrorCategory};

/// Map a [`ClientError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &ClientError) -> String {
    match err.category() {
        ErrorCategory::SessionExpired => {
            format!("Your session has expired ({err}). Run: cpstats login <username>")
        }
        ErrorCategory::Authentication => {
            format!("Authentication failed: {err}. Run: cpstats login <username>")
        }
        ErrorCategory::Configuration => {
            format!("{err}. Check your .env or the CPSTATS_* environment variables")
        }
        ErrorCategory::Network | ErrorCategory::Timeout => {
            format!("{err}. Check your connection or CPSTATS_BASE_URL")
        }
        _ => format!("{err}"),
    }
}
