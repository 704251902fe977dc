use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{handlers::ValidationErrors, repos::RepoError},
    config::LoadError,
    infra::error::InfraError,
};

/// Failure of a single handler call. Cancellation is not represented here;
/// handlers fold it into their empty result.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl HandlerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Chain of messages from an error and its sources, outermost first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Handler(#[from] HandlerError),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the command line.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Input(_) => 2,
            AppError::Handler(HandlerError::Validation(_)) => 3,
            AppError::Handler(HandlerError::NotFound { .. }) => 4,
            AppError::Handler(HandlerError::Repo(_)) | AppError::Infra(_) => 5,
            AppError::Unexpected(_) => 1,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> Self {
        Self::Handler(HandlerError::Repo(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_source_chain() {
        let error = AppError::from(HandlerError::from(RepoError::Timeout));
        let report = ErrorReport::from_error("test", &error);
        assert_eq!(report.messages, vec!["database timeout".to_string()]);
    }

    #[test]
    fn exit_codes_distinguish_failure_kinds() {
        assert_eq!(AppError::input("bad json").exit_code(), 2);
        assert_eq!(
            AppError::from(HandlerError::not_found("housing", 7)).exit_code(),
            4
        );
        assert_eq!(AppError::from(RepoError::Timeout).exit_code(), 5);
    }
}
