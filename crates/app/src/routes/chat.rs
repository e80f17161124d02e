use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use services::{AppServices, ChatTurn};
use tutor_core::classify::ExchangeClassification;
use tutor_core::model::{ChatMessage, LearningSession, UserId};

use super::RawId;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatRequest {
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    is_initial: bool,
    user_id: Option<RawId>,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatResponse {
    response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    classification: Option<ExchangeClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<LearningSession>,
}

pub(super) async fn chat(
    State(services): State<AppServices>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = body?;
    let user_id: UserId = request
        .user_id
        .filter(|id| !id.is_blank())
        .ok_or(AppError::Unauthorized("User ID is required"))?
        .parse("userId")?;

    let reply = services
        .tutor()
        .chat(ChatTurn {
            user_id,
            messages: request.messages,
            is_initial: request.is_initial,
        })
        .await?;

    Ok(Json(ChatResponse {
        response: reply.text,
        classification: reply.classification,
        session: reply.session,
    }))
}
