use std::sync::Arc;

use storage::repository::{
    LearningSessionRepository, NewSessionRecord, StorageError, UserRepository,
};
use tutor_core::classify::ExchangeClassification;
use tutor_core::model::{
    CounterDelta, DEFAULT_SUBJECT, LearningSession, SessionStats, UserId,
};

use crate::Clock;
use crate::error::ProgressError;

/// Keeps each user's open learning session in step with classified exchanges.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn LearningSessionRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn LearningSessionRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            sessions,
        }
    }

    /// Fold one classified exchange into the user's open session.
    ///
    /// With no open session a new one is started, already carrying this
    /// exchange's counters. Points earned reach the user's total in the same
    /// storage write, so a failure leaves both untouched.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UserNotFound` for unknown users and
    /// `ProgressError::Storage` on repository failures.
    pub async fn record_exchange(
        &self,
        user_id: UserId,
        classification: ExchangeClassification,
    ) -> Result<LearningSession, ProgressError> {
        self.require_user(user_id).await?;
        let delta = CounterDelta::from_classification(classification);

        let session = match self.sessions.open_session(user_id).await? {
            Some(open) => self.apply(open, delta).await?,
            None => self.open_with(user_id, DEFAULT_SUBJECT, delta).await?,
        };

        tracing::debug!(
            user_id = %user_id,
            session_id = %session.id(),
            hint = classification.hint_requested,
            correct = classification.answer_correct,
            "recorded exchange"
        );
        Ok(session)
    }

    /// The user's open session, if any.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UserNotFound` for unknown users.
    pub async fn current_session(
        &self,
        user_id: UserId,
    ) -> Result<Option<LearningSession>, ProgressError> {
        self.require_user(user_id).await?;
        Ok(self.sessions.open_session(user_id).await?)
    }

    /// Explicitly start a session for `subject`, returning the open one if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UserNotFound` for unknown users.
    pub async fn start_session(
        &self,
        user_id: UserId,
        subject: &str,
    ) -> Result<LearningSession, ProgressError> {
        self.require_user(user_id).await?;
        if let Some(open) = self.sessions.open_session(user_id).await? {
            return Ok(open);
        }
        self.open_with(user_id, subject, CounterDelta::default())
            .await
    }

    /// Close the user's open session.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::NoOpenSession` when there is nothing to close.
    pub async fn end_session(&self, user_id: UserId) -> Result<LearningSession, ProgressError> {
        self.require_user(user_id).await?;
        let open = self
            .sessions
            .open_session(user_id)
            .await?
            .ok_or(ProgressError::NoOpenSession(user_id))?;
        match self.sessions.end_session(open.id(), self.clock.now()).await {
            Ok(ended) => {
                tracing::info!(user_id = %user_id, session_id = %ended.id(), "ended session");
                Ok(ended)
            }
            Err(StorageError::NotFound) => Err(ProgressError::NoOpenSession(user_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// All sessions of the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UserNotFound` for unknown users.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<LearningSession>, ProgressError> {
        self.require_user(user_id).await?;
        Ok(self.sessions.list_sessions(user_id).await?)
    }

    /// Aggregate counters across every session of the user.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UserNotFound` for unknown users.
    pub async fn stats(&self, user_id: UserId) -> Result<SessionStats, ProgressError> {
        let sessions = self.history(user_id).await?;
        Ok(SessionStats::from_sessions(&sessions))
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), ProgressError> {
        match self.users.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ProgressError::UserNotFound(user_id)),
        }
    }

    async fn apply(
        &self,
        session: LearningSession,
        delta: CounterDelta,
    ) -> Result<LearningSession, ProgressError> {
        if delta.is_empty() {
            return Ok(session);
        }
        Ok(self.sessions.apply_delta(session.id(), delta).await?)
    }

    async fn open_with(
        &self,
        user_id: UserId,
        subject: &str,
        initial: CounterDelta,
    ) -> Result<LearningSession, ProgressError> {
        let record = NewSessionRecord {
            user_id,
            subject: subject.to_owned(),
            started_at: self.clock.now(),
            initial,
        };
        match self.sessions.create_session(record).await {
            Ok(session) => {
                tracing::info!(user_id = %user_id, session_id = %session.id(), "started session");
                Ok(session)
            }
            // Another request opened one first; fold into that one instead.
            Err(StorageError::Conflict) => {
                let open = self
                    .sessions
                    .open_session(user_id)
                    .await?
                    .ok_or(StorageError::Conflict)?;
                self.apply(open, initial).await
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, NewUserRecord};
    use tutor_core::model::Language;
    use tutor_core::time::{fixed_clock, fixed_now};

    async fn setup() -> (ProgressService, InMemoryRepository, UserId) {
        let repo = InMemoryRepository::new();
        let user = repo
            .insert_user(NewUserRecord {
                username: "ada".into(),
                email: "ada@example.com".into(),
                preferred_language: Language::En,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let svc = ProgressService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo.clone()));
        (svc, repo, user.id())
    }

    fn correct() -> ExchangeClassification {
        ExchangeClassification {
            hint_requested: false,
            answer_correct: true,
        }
    }

    #[tokio::test]
    async fn first_exchange_opens_a_seeded_session() {
        let (svc, repo, user) = setup().await;
        let session = svc.record_exchange(user, correct()).await.unwrap();
        assert!(session.is_open());
        assert_eq!(session.subject(), DEFAULT_SUBJECT);
        assert_eq!(
            (session.problems_attempted(), session.problems_solved(), session.score()),
            (1, 1, 10)
        );
        assert_eq!(repo.get_user(user).await.unwrap().unwrap().total_score(), 10);
    }

    #[tokio::test]
    async fn neutral_exchange_leaves_counters_alone() {
        let (svc, repo, user) = setup().await;
        let first = svc
            .record_exchange(user, ExchangeClassification::default())
            .await
            .unwrap();
        let second = svc
            .record_exchange(user, ExchangeClassification::default())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.problems_attempted(), 0);
        assert_eq!(repo.get_user(user).await.unwrap().unwrap().total_score(), 0);
    }

    #[tokio::test]
    async fn end_session_then_next_exchange_starts_fresh() {
        let (svc, _repo, user) = setup().await;
        let first = svc.record_exchange(user, correct()).await.unwrap();
        let ended = svc.end_session(user).await.unwrap();
        assert_eq!(ended.id(), first.id());
        assert!(!ended.is_open());
        assert!(matches!(
            svc.end_session(user).await,
            Err(ProgressError::NoOpenSession(_))
        ));

        let next = svc.record_exchange(user, correct()).await.unwrap();
        assert_ne!(next.id(), first.id());
        assert_eq!(next.problems_solved(), 1);

        let stats = svc.stats(user).await.unwrap();
        assert_eq!(stats.total_problems_solved, 2);
        assert_eq!(svc.history(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn start_session_reuses_open_one() {
        let (svc, _repo, user) = setup().await;
        let started = svc.start_session(user, "algebra").await.unwrap();
        assert_eq!(started.subject(), "algebra");
        let again = svc.start_session(user, "geometry").await.unwrap();
        assert_eq!(again.id(), started.id());
        assert_eq!(svc.current_session(user).await.unwrap(), Some(started));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let (svc, _repo, _user) = setup().await;
        let ghost = UserId::new(42);
        assert!(matches!(
            svc.record_exchange(ghost, correct()).await,
            Err(ProgressError::UserNotFound(id)) if id == ghost
        ));
        assert!(matches!(
            svc.stats(ghost).await,
            Err(ProgressError::UserNotFound(_))
        ));
    }
}
