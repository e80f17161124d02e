use std::sync::Arc;

use serde::Serialize;
use storage::repository::UserRepository;
use tutor_core::classify::{ExchangeClassification, classify_exchange};
use tutor_core::model::{ChatMessage, LearningSession, UserId, latest_user_message};
use tutor_core::prompt::{INITIAL_PROMPT, tutor_system_prompt};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::error::TutorError;
use crate::progress_service::ProgressService;

/// One chat request from a student.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub user_id: UserId,
    pub messages: Vec<ChatMessage>,
    /// Opening turn: the tutor introduces itself and the history is ignored.
    pub is_initial: bool,
}

/// Tutor reply plus the progress it produced.
#[derive(Debug, Clone, Serialize)]
pub struct TutorReply {
    pub text: String,
    /// `None` for opening turns, which are never classified.
    pub classification: Option<ExchangeClassification>,
    pub session: Option<LearningSession>,
}

/// Socratic chat tutor.
#[derive(Clone)]
pub struct TutorService {
    users: Arc<dyn UserRepository>,
    completion: Arc<dyn CompletionClient>,
    progress: Arc<ProgressService>,
}

impl TutorService {
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        completion: Arc<dyn CompletionClient>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            users,
            completion,
            progress,
        }
    }

    /// Produce the tutor's next reply and record the exchange.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::UserNotFound` for unknown users,
    /// `TutorError::EmptyConversation` when a follow-up turn has no student
    /// message, and `TutorError::Completion` when the provider fails. Progress
    /// is only recorded once a reply was obtained.
    pub async fn chat(&self, turn: ChatTurn) -> Result<TutorReply, TutorError> {
        let user = self
            .users
            .get_user(turn.user_id)
            .await?
            .ok_or(TutorError::UserNotFound(turn.user_id))?;
        let system = tutor_system_prompt(user.display_name(), user.preferred_language());

        if turn.is_initial {
            let text = self
                .completion
                .complete(CompletionRequest::single(system, INITIAL_PROMPT))
                .await?;
            tracing::debug!(user_id = %user.id(), "opened conversation");
            return Ok(TutorReply {
                text,
                classification: None,
                session: None,
            });
        }

        let message = latest_user_message(&turn.messages)
            .ok_or(TutorError::EmptyConversation)?
            .content
            .clone();
        let text = self
            .completion
            .complete(CompletionRequest::new(system, turn.messages))
            .await?;

        let classification = classify_exchange(&message, &text);
        let session = self
            .progress
            .record_exchange(user.id(), classification)
            .await?;

        Ok(TutorReply {
            text,
            classification: Some(classification),
            session: Some(session),
        })
    }
}
