use std::sync::Arc;

use services::ProgressService;
use storage::repository::{LearningSessionRepository, NewUserRecord, Storage, UserRepository};
use tutor_core::classify::ExchangeClassification;
use tutor_core::model::Language;
use tutor_core::time::{fixed_clock, fixed_now};

const EXCHANGES: u32 = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_exchanges_fold_into_one_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("tutor.sqlite3").display()
    );
    let storage = Storage::sqlite(&url).await.expect("sqlite storage");
    let user = storage
        .users
        .insert_user(NewUserRecord {
            username: "ada".into(),
            email: "ada@example.com".into(),
            preferred_language: Language::En,
            created_at: fixed_now(),
        })
        .await
        .unwrap();

    let progress = Arc::new(ProgressService::new(
        fixed_clock(),
        Arc::clone(&storage.users),
        Arc::clone(&storage.sessions),
    ));
    let exchange = ExchangeClassification {
        hint_requested: true,
        answer_correct: true,
    };

    // No session exists yet, so every task races to create it.
    let tasks: Vec<_> = (0..EXCHANGES)
        .map(|_| {
            let progress = Arc::clone(&progress);
            let user_id = user.id();
            tokio::spawn(async move { progress.record_exchange(user_id, exchange).await })
        })
        .collect();
    for task in tasks {
        task.await.expect("join").expect("record_exchange");
    }

    let sessions = storage.sessions.list_sessions(user.id()).await.unwrap();
    assert_eq!(sessions.len(), 1);
    let session = &sessions[0];
    assert!(session.is_open());
    assert_eq!(
        (
            session.problems_attempted(),
            session.problems_solved(),
            session.hints_used(),
            session.score(),
        ),
        (EXCHANGES, EXCHANGES, EXCHANGES, EXCHANGES * 10)
    );

    let user = storage.users.get_user(user.id()).await.unwrap().unwrap();
    assert_eq!(user.total_score(), EXCHANGES * 10);
}
