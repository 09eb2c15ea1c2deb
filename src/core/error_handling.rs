//! Generic error reporting utilities
//!
//! Fatal errors are reported with a message suited to their audience: a
//! misconfigured route is worth showing verbatim, a failed socket bind is
//! summarised with details at debug level.

/// Errors that know whether the operator can act on them directly.
///
/// When `is_user_actionable()` returns `true`, `user_message()` should
/// return `Some(message)`; otherwise it should return `None`.
pub trait ContextualError: std::error::Error {
    /// True when the error message names something the operator can fix,
    /// e.g. a bad handler reference or an unknown group
    fn is_user_actionable(&self) -> bool;

    /// The message to show when the error is user-actionable
    fn user_message(&self) -> Option<String>;
}

/// Log a fatal error with the level of detail its kind deserves
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log::error!("FATAL: {}: {}", operation_context, user_msg)
        }
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
