//! HTTP surface: JSON routes over `AppServices`.

mod chat;
mod drills;
mod users;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use services::AppServices;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tutor_core::model::Language;

use crate::error::AppError;

#[must_use]
pub fn router(services: AppServices) -> Router {
    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/api/users", post(users::register))
        .route("/api/users/{id}", get(users::get_user))
        .route("/api/users/{id}/language", put(users::set_language))
        .route(
            "/api/users/{id}/session",
            get(users::current_session).post(users::start_session),
        )
        .route("/api/users/{id}/session/end", post(users::end_session))
        .route("/api/users/{id}/sessions", get(users::history))
        .route("/api/users/{id}/stats", get(users::stats))
        .route("/api/subjects", get(drills::subjects))
        .route("/api/drill/{subject}", get(drills::next_drill))
        .route("/api/validate_answer", post(drills::validate_answer))
        .route("/api/tutor", post(drills::tutor))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(services)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Numeric id sent either as a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    /// Empty strings and zero count as no id at all.
    fn is_blank(&self) -> bool {
        match self {
            RawId::Number(n) => *n == 0,
            RawId::Text(s) => s.trim().is_empty() || s.trim() == "0",
        }
    }

    fn parse<T: std::str::FromStr>(self, field: &str) -> Result<T, AppError> {
        let text = match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s.trim().to_string(),
        };
        text.parse()
            .map_err(|_| AppError::BadRequest(format!("invalid {field}: {text}")))
    }
}

fn parse_language(raw: Option<&str>) -> Result<Language, AppError> {
    match raw {
        None => Ok(Language::default()),
        Some(code) => code
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid language".into())),
    }
}
