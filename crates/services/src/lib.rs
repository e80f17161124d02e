#![forbid(unsafe_code)]

pub mod app_services;
pub mod completion;
pub mod drill_service;
pub mod error;
pub mod progress_service;
pub mod tutor_service;
pub mod user_service;

pub use tutor_core::Clock;

pub use app_services::{AppServices, completion_from_env};
pub use completion::{CompletionClient, CompletionRequest, DryRunClient};
pub use drill_service::{AnswerFeedback, DrillService};
pub use error::{
    AppServicesError, CompletionError, DrillError, ProgressError, TutorError, UserServiceError,
};
pub use progress_service::ProgressService;
pub use tutor_service::{ChatTurn, TutorReply, TutorService};
pub use user_service::UserService;
