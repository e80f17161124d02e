use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::completion::{AnthropicClient, AnthropicConfig, CompletionClient, DryRunClient};
use crate::drill_service::DrillService;
use crate::error::{AppServicesError, CompletionError};
use crate::progress_service::ProgressService;
use crate::tutor_service::TutorService;
use crate::user_service::UserService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    users: Arc<UserService>,
    progress: Arc<ProgressService>,
    tutor: Arc<TutorService>,
    drills: Arc<DrillService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: Storage, completion: Arc<dyn CompletionClient>, clock: Clock) -> Self {
        let users = Arc::new(UserService::new(clock, Arc::clone(&storage.users)));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.sessions),
        ));
        let tutor = Arc::new(TutorService::new(
            Arc::clone(&storage.users),
            Arc::clone(&completion),
            Arc::clone(&progress),
        ));
        let drills = Arc::new(DrillService::new(completion));

        Self {
            users,
            progress,
            tutor,
            drills,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        completion: Arc<dyn CompletionClient>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(storage, completion, clock))
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn tutor(&self) -> Arc<TutorService> {
        Arc::clone(&self.tutor)
    }

    #[must_use]
    pub fn drills(&self) -> Arc<DrillService> {
        Arc::clone(&self.drills)
    }
}

/// Pick the completion client: the dry-run client when asked for, otherwise
/// Anthropic configured from the environment.
///
/// # Errors
///
/// Returns `CompletionError::Disabled` when no API key is configured and
/// `CompletionError::InvalidConfig` for unusable settings.
pub fn completion_from_env(dry_run: bool) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    if dry_run {
        tracing::info!("using dry-run completion client");
        return Ok(Arc::new(DryRunClient));
    }
    let config = AnthropicConfig::from_env().ok_or(CompletionError::Disabled)?;
    let client = AnthropicClient::new(config)?;
    tracing::info!(model = client.model(), "using anthropic completion client");
    Ok(Arc::new(client))
}
