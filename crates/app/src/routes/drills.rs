use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use services::{AnswerFeedback, AppServices};
use tutor_core::drill::SubjectInfo;

use super::parse_language;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub(super) struct ValidateAnswerRequest {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    drill: String,
    #[serde(default)]
    answer: String,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TutorRequest {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    drill: String,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LanguageQuery {
    language: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct TutorResponse {
    response: String,
}

pub(super) async fn subjects(
    State(services): State<AppServices>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<Vec<SubjectInfo>>, AppError> {
    let language = parse_language(query.language.as_deref())?;
    Ok(Json(services.drills().subjects(language)))
}

pub(super) async fn next_drill(
    State(services): State<AppServices>,
    Path(subject): Path<String>,
) -> Result<Json<Value>, AppError> {
    let (subject, drill) = services.drills().next_drill(&subject)?;
    Ok(Json(json!({ "subject": subject, "drill": drill.question })))
}

pub(super) async fn validate_answer(
    State(services): State<AppServices>,
    body: Result<Json<ValidateAnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerFeedback>, AppError> {
    let Json(request) = body?;
    let language = parse_language(request.language.as_deref())?;
    let feedback = services
        .drills()
        .validate_answer(&request.subject, &request.drill, &request.answer, language)
        .await?;
    Ok(Json(feedback))
}

pub(super) async fn tutor(
    State(services): State<AppServices>,
    body: Result<Json<TutorRequest>, JsonRejection>,
) -> Result<Json<TutorResponse>, AppError> {
    let Json(request) = body?;
    let language = parse_language(request.language.as_deref())?;
    let response = services
        .drills()
        .subject_chat(&request.subject, &request.drill, &request.message, language)
        .await?;
    Ok(Json(TutorResponse { response }))
}
