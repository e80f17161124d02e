use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::model::{
    CounterDelta, Language, LearningSession, NewUser, SessionId, User, UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a user; the id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub preferred_language: Language,
    pub created_at: DateTime<Utc>,
}

impl NewUserRecord {
    #[must_use]
    pub fn from_new_user(user: NewUser, created_at: DateTime<Utc>) -> Self {
        Self {
            username: user.username,
            email: user.email,
            preferred_language: user.preferred_language,
            created_at,
        }
    }
}

/// Insert shape for a learning session seeded with its first counters.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub user_id: UserId,
    pub subject: String,
    pub started_at: DateTime<Utc>,
    pub initial: CounterDelta,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username or email is taken.
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, StorageError>;

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures. Missing users are `Ok(None)`.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Change the language the tutor answers this user in.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn set_preferred_language(
        &self,
        id: UserId,
        language: Language,
    ) -> Result<User, StorageError>;
}

/// Repository contract for learning sessions.
///
/// A user has at most one open session (no `end_time`) at a time. Writes that
/// carry a score also credit it to the owning user's `total_score`, in the same
/// transaction as the counter change.
#[async_trait]
pub trait LearningSessionRepository: Send + Sync {
    /// Fetch the user's open session, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn open_session(&self, user_id: UserId)
    -> Result<Option<LearningSession>, StorageError>;

    /// Create a session seeded with `record.initial`, crediting its score.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already has an open session.
    async fn create_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<LearningSession, StorageError>;

    /// Add `delta` to the session counters, credit `delta.score` to the user
    /// and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn apply_delta(
        &self,
        id: SessionId,
        delta: CounterDelta,
    ) -> Result<LearningSession, StorageError>;

    /// Set `end_time` on an open session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no open session has this id.
    async fn end_session(
        &self,
        id: SessionId,
        ended_at: DateTime<Utc>,
    ) -> Result<LearningSession, StorageError>;

    /// All sessions of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<LearningSession>, StorageError>;
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn credit(users: &mut HashMap<UserId, User>, id: UserId, points: u32) {
    if let Some(user) = users.get_mut(&id) {
        user.add_score(points);
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    sessions: Arc<Mutex<HashMap<SessionId, LearningSession>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let taken = guard
            .values()
            .any(|u| u.username() == record.username || u.email() == record.email);
        if taken {
            return Err(StorageError::Conflict);
        }
        let id = UserId::new(guard.len() as u64 + 1);
        let user = User::from_persisted(
            id,
            record.username,
            record.email,
            record.preferred_language,
            0,
            record.created_at,
        );
        guard.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn set_preferred_language(
        &self,
        id: UserId,
        language: Language,
    ) -> Result<User, StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let user = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        user.set_preferred_language(language);
        Ok(user.clone())
    }
}

#[async_trait]
impl LearningSessionRepository for InMemoryRepository {
    async fn open_session(
        &self,
        user_id: UserId,
    ) -> Result<Option<LearningSession>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .values()
            .find(|s| s.user_id() == user_id && s.is_open())
            .cloned())
    }

    async fn create_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<LearningSession, StorageError> {
        // Lock order: users, then sessions.
        let mut users = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard
            .values()
            .any(|s| s.user_id() == record.user_id && s.is_open())
        {
            return Err(StorageError::Conflict);
        }
        let id = SessionId::new(guard.len() as u64 + 1);
        let session = LearningSession::from_persisted(
            id,
            record.user_id,
            record.subject,
            record.started_at,
            None,
            record.initial.attempted,
            record.initial.solved,
            record.initial.hints,
            record.initial.score,
            record.started_at,
        )
        .map_err(ser)?;
        credit(&mut users, record.user_id, record.initial.score);
        guard.insert(id, session.clone());
        Ok(session)
    }

    async fn apply_delta(
        &self,
        id: SessionId,
        delta: CounterDelta,
    ) -> Result<LearningSession, StorageError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        session.apply_delta(delta);
        credit(&mut users, session.user_id(), delta.score);
        Ok(session.clone())
    }

    async fn end_session(
        &self,
        id: SessionId,
        ended_at: DateTime<Utc>,
    ) -> Result<LearningSession, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let session = guard
            .get_mut(&id)
            .filter(|s| s.is_open())
            .ok_or(StorageError::NotFound)?;
        session.end(ended_at).map_err(ser)?;
        Ok(session.clone())
    }

    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<LearningSession>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<LearningSession> = guard
            .values()
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(out)
    }
}

/// Aggregates repositories for easy wiring/swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn LearningSessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn LearningSessionRepository> = Arc::new(repo);
        Self { users, sessions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::model::DEFAULT_SUBJECT;
    use tutor_core::time::fixed_now;

    fn new_user(name: &str) -> NewUserRecord {
        NewUserRecord {
            username: name.into(),
            email: format!("{name}@example.com"),
            preferred_language: Language::En,
            created_at: fixed_now(),
        }
    }

    fn new_session(user_id: UserId, initial: CounterDelta) -> NewSessionRecord {
        NewSessionRecord {
            user_id,
            subject: DEFAULT_SUBJECT.into(),
            started_at: fixed_now(),
            initial,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let repo = InMemoryRepository::new();
        repo.insert_user(new_user("ada")).await.unwrap();
        let err = repo.insert_user(new_user("ada")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn session_score_is_credited_to_the_user() {
        let repo = InMemoryRepository::new();
        let user = repo.insert_user(new_user("ada")).await.unwrap();
        let seeded = CounterDelta {
            attempted: 1,
            solved: 1,
            hints: 0,
            score: 10,
        };
        let session = repo
            .create_session(new_session(user.id(), seeded))
            .await
            .unwrap();
        repo.apply_delta(session.id(), seeded).await.unwrap();
        let fetched = repo.get_user(user.id()).await.unwrap().unwrap();
        assert_eq!(fetched.total_score(), 20);
    }

    #[tokio::test]
    async fn preferred_language_can_change() {
        let repo = InMemoryRepository::new();
        let user = repo.insert_user(new_user("ada")).await.unwrap();
        let updated = repo
            .set_preferred_language(user.id(), Language::He)
            .await
            .unwrap();
        assert_eq!(updated.preferred_language(), Language::He);
        assert_eq!(
            repo.get_user(user.id()).await.unwrap().unwrap(),
            updated
        );
        assert!(matches!(
            repo.set_preferred_language(UserId::new(99), Language::Fr).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn only_one_open_session_per_user() {
        let repo = InMemoryRepository::new();
        let user = UserId::new(1);
        let first = repo
            .create_session(new_session(user, CounterDelta::default()))
            .await
            .unwrap();
        let err = repo
            .create_session(new_session(user, CounterDelta::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        repo.end_session(first.id(), fixed_now()).await.unwrap();
        assert!(repo.open_session(user).await.unwrap().is_none());
        repo.create_session(new_session(user, CounterDelta::default()))
            .await
            .unwrap();
        assert_eq!(repo.list_sessions(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn apply_delta_and_end_require_existing_session() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.apply_delta(SessionId::new(5), CounterDelta::default())
                .await,
            Err(StorageError::NotFound)
        ));

        let session = repo
            .create_session(new_session(UserId::new(1), CounterDelta::default()))
            .await
            .unwrap();
        repo.end_session(session.id(), fixed_now()).await.unwrap();
        assert!(matches!(
            repo.end_session(session.id(), fixed_now()).await,
            Err(StorageError::NotFound)
        ));
    }
}
