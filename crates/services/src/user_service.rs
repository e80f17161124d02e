use std::sync::Arc;

use storage::repository::{NewUserRecord, StorageError, UserRepository};
use tutor_core::model::{Language, NewUser, User, UserId};

use crate::Clock;
use crate::error::UserServiceError;

/// Registration and lookup of students.
#[derive(Clone)]
pub struct UserService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Validate and persist a new student.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::Invalid` for bad input and
    /// `UserServiceError::AlreadyRegistered` when the username or email is taken.
    pub async fn register(&self, draft: NewUser) -> Result<User, UserServiceError> {
        let draft = draft.validate()?;
        let record = NewUserRecord::from_new_user(draft, self.clock.now());
        match self.users.insert_user(record).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id(), "registered user");
                Ok(user)
            }
            Err(StorageError::Conflict) => Err(UserServiceError::AlreadyRegistered),
            Err(err) => Err(err.into()),
        }
    }

    /// Fetch a student by id.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if no such user exists.
    pub async fn get(&self, id: UserId) -> Result<User, UserServiceError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(UserServiceError::NotFound(id))
    }

    /// Change the language the tutor answers `id` in.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::NotFound` if no such user exists.
    pub async fn set_language(
        &self,
        id: UserId,
        language: Language,
    ) -> Result<User, UserServiceError> {
        match self.users.set_preferred_language(id, language).await {
            Ok(user) => {
                tracing::info!(user_id = %id, language = language.code(), "changed language");
                Ok(user)
            }
            Err(StorageError::NotFound) => Err(UserServiceError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use tutor_core::time::{fixed_clock, fixed_now};

    fn service() -> UserService {
        UserService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
    }

    fn draft(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            preferred_language: Language::Fr,
        }
    }

    #[tokio::test]
    async fn register_then_get() {
        let svc = service();
        let user = svc.register(draft("ada")).await.unwrap();
        assert_eq!(user.created_at(), fixed_now());
        assert_eq!(user.total_score(), 0);

        let fetched = svc.get(user.id()).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let svc = service();
        svc.register(draft("ada")).await.unwrap();
        assert!(matches!(
            svc.register(draft("ada")).await,
            Err(UserServiceError::AlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn invalid_input_and_unknown_user() {
        let svc = service();
        assert!(matches!(
            svc.register(draft("   ")).await,
            Err(UserServiceError::Invalid(_))
        ));
        assert!(matches!(
            svc.get(UserId::new(9)).await,
            Err(UserServiceError::NotFound(id)) if id == UserId::new(9)
        ));
    }

    #[tokio::test]
    async fn set_language_updates_the_stored_user() {
        let svc = service();
        let user = svc.register(draft("ada")).await.unwrap();
        let updated = svc.set_language(user.id(), Language::He).await.unwrap();
        assert_eq!(updated.preferred_language(), Language::He);
        assert_eq!(svc.get(user.id()).await.unwrap(), updated);
        assert!(matches!(
            svc.set_language(UserId::new(9), Language::En).await,
            Err(UserServiceError::NotFound(_))
        ));
    }
}
