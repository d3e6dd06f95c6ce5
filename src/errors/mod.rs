//! Mapping of errors to messages a user can act on.

use std::error::Error;

use crate::repository::RepositoryError;

pub const NO_CONNECTION: &str = "No internet connection";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const NOT_FOUND: &str = "Resource not found";
pub const UNEXPECTED: &str = "An unexpected error occurred";

/// Turns an error into a short user-facing message.
pub trait ErrorHandler: Send + Sync {
    fn user_message(&self, error: &(dyn Error + 'static)) -> String;
}

/// Classifies by walking the source chain: the first I/O error or HTTP
/// status found decides the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn user_message(&self, error: &(dyn Error + 'static)) -> String {
        let mut current = Some(error);
        while let Some(err) = current {
            if let Some(message) = classify(err) {
                return message.to_string();
            }
            current = err.source();
        }
        UNEXPECTED.to_string()
    }
}

fn classify(error: &(dyn Error + 'static)) -> Option<&'static str> {
    if error.is::<std::io::Error>() {
        return Some(NO_CONNECTION);
    }
    match error.downcast_ref::<RepositoryError>()? {
        RepositoryError::Io(_) => Some(NO_CONNECTION),
        RepositoryError::Status { status: 500, .. } => Some(INTERNAL_SERVER_ERROR),
        RepositoryError::Status { status: 404, .. } => Some(NOT_FOUND),
        RepositoryError::Status { .. } => Some(UNEXPECTED),
    }
}
