// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::{StatsResponse, User},
    utils::jwt::Claims,
};

/// Get the current candidate's profile, including attempt count and average score.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let me = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, name, role, attempts_count, average_score, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(me))
}

/// Result statistics of the current candidate.
pub async fn get_stats(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(student_stats(&pool, user_id).await?))
}

pub(crate) async fn student_stats(pool: &SqlitePool, user_id: i64) -> Result<StatsResponse, AppError> {
    let (attempts_count, average_score) = sqlx::query_as::<_, (i64, f64)>(
        "SELECT attempts_count, average_score FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let (average_percentage, best_percentage) = sqlx::query_as::<_, (Option<f64>, Option<i64>)>(
        "SELECT AVG(percentage), MAX(percentage) FROM results WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(StatsResponse {
        total_tests: attempts_count,
        average_score,
        average_percentage: average_percentage.unwrap_or(0.0),
        best_percentage: best_percentage.unwrap_or(0),
    })
}
