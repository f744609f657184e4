// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    services::attempt::AttemptService,
    utils::jwt::Claims,
};

/// Lists the current candidate's results, most recent first.
pub async fn list_results(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let history = AttemptService::new(pool, config.fallback_minutes_per_question)
        .history(user_id)
        .await?;

    Ok(Json(history))
}

/// Latest result with full per-question review.
pub async fn latest_result(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let result = AttemptService::new(pool, config.fallback_minutes_per_question)
        .latest_result(user_id)
        .await?
        .ok_or(AppError::NotFound("No results yet".to_string()))?;

    Ok(Json(result))
}

/// One result by id. Results of other candidates are reported as not found.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let result = AttemptService::new(pool, config.fallback_minutes_per_question)
        .result_for(user_id, id)
        .await?
        .ok_or(AppError::NotFound("Result not found".to_string()))?;

    Ok(Json(result))
}
