//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::drill::{Subject, UnknownSubject};
use tutor_core::model::{UserError, UserId};

/// Errors emitted by completion clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("completion client is not configured")]
    Disabled,
    #[error("invalid completion config: {0}")]
    InvalidConfig(String),
    #[error("completion returned an empty response")]
    EmptyResponse,
    #[error("completion request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    Invalid(#[from] UserError),
    #[error("username or email already registered")]
    AlreadyRegistered,
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("user {0} has no open session")]
    NoOpenSession(UserId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TutorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TutorError {
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("conversation has no student message")]
    EmptyConversation,
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DrillService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DrillError {
    #[error(transparent)]
    UnknownSubject(#[from] UnknownSubject),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("no drills available for {0}")]
    EmptyDrillBank(Subject),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
