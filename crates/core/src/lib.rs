//! Shared primitives for all Rust crates in Runlist.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Runlist crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is not allowed to mutate the resource through this path.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A configured quota would be exceeded by the operation.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Forbidden(message)
            | Self::LimitExceeded(message)
            | Self::Internal(message) => message.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn error_message_strips_category_prefix() {
        let error = AppError::LimitExceeded("at most 1000".to_owned());
        assert_eq!(error.message(), "at most 1000");
        assert_eq!(error.to_string(), "limit exceeded: at most 1000");
    }
}
