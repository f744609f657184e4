// src/handlers/chat.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    services::{assistant::ChatAssistant, attempt::AttemptService},
    utils::{
        chat_fallback::{NO_RESULTS_REPLY, fallback_reply},
        jwt::Claims,
    },
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Result to discuss; the latest one when absent or not owned.
    pub result_id: Option<i64>,
}

/// Answers a question about one of the candidate's results.
///
/// Tries the configured assistant first; an empty reply falls back to the
/// keyword-based answers.
pub async fn chat(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(assistant): State<Arc<dyn ChatAssistant>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let service = AttemptService::new(pool, config.fallback_minutes_per_question);

    let mut result = match req.result_id {
        Some(id) => service.result_for(user_id, id).await?,
        None => None,
    };
    if result.is_none() {
        result = service.latest_result(user_id).await?;
    }

    let Some(result) = result else {
        return Ok(Json(json!({ "reply": NO_RESULTS_REPLY })));
    };

    let message = req.message.trim();
    let mut reply = assistant.reply(message, &result).await;
    if reply.trim().is_empty() {
        reply = fallback_reply(message, &result);
    }

    Ok(Json(json!({ "reply": reply, "result_id": result.id })))
}
