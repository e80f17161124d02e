use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use services::AppServices;
use tutor_core::drill::SubjectInfo;
use tutor_core::model::{DEFAULT_SUBJECT, LearningSession, NewUser, SessionStats, User, UserId};

use super::parse_language;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    username: String,
    email: String,
    preferred_language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LanguageRequest {
    language: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LanguageResponse {
    user: User,
    subjects: Vec<SubjectInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct StartSessionRequest {
    subject: Option<String>,
}

fn user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user id: {raw}")))
}

pub(super) async fn register(
    State(services): State<AppServices>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(request) = body?;
    let draft = NewUser {
        username: request.username,
        email: request.email,
        preferred_language: parse_language(request.preferred_language.as_deref())?,
    };
    Ok(Json(services.users().register(draft).await?))
}

pub(super) async fn get_user(
    State(services): State<AppServices>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(services.users().get(user_id(&id)?).await?))
}

/// Switch the tutor language; the reply carries the catalog in that language.
pub(super) async fn set_language(
    State(services): State<AppServices>,
    Path(id): Path<String>,
    body: Result<Json<LanguageRequest>, JsonRejection>,
) -> Result<Json<LanguageResponse>, AppError> {
    let Json(request) = body?;
    let language = parse_language(request.language.as_deref())?;
    let user = services.users().set_language(user_id(&id)?, language).await?;
    Ok(Json(LanguageResponse {
        user,
        subjects: services.drills().subjects(language),
    }))
}

pub(super) async fn current_session(
    State(services): State<AppServices>,
    Path(id): Path<String>,
) -> Result<Json<Option<LearningSession>>, AppError> {
    Ok(Json(services.progress().current_session(user_id(&id)?).await?))
}

pub(super) async fn start_session(
    State(services): State<AppServices>,
    Path(id): Path<String>,
    body: Option<Json<StartSessionRequest>>,
) -> Result<Json<LearningSession>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let subject = request
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBJECT);
    Ok(Json(
        services
            .progress()
            .start_session(user_id(&id)?, subject)
            .await?,
    ))
}

pub(super) async fn end_session(
    State(services): State<AppServices>,
    Path(id): Path<String>,
) -> Result<Json<LearningSession>, AppError> {
    Ok(Json(services.progress().end_session(user_id(&id)?).await?))
}

pub(super) async fn history(
    State(services): State<AppServices>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LearningSession>>, AppError> {
    Ok(Json(services.progress().history(user_id(&id)?).await?))
}

pub(super) async fn stats(
    State(services): State<AppServices>,
    Path(id): Path<String>,
) -> Result<Json<SessionStats>, AppError> {
    Ok(Json(services.progress().stats(user_id(&id)?).await?))
}
