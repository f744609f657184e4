// src/handlers/subjects.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{error::AppError, models::subject::Subject};

/// Lists all subjects with their question counts.
pub async fn list_subjects(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT
            s.id, s.name, s.description,
            (SELECT COUNT(*) FROM questions q WHERE q.subject_id = s.id) AS question_count
        FROM subjects s
        ORDER BY s.name
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list subjects: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(subjects))
}
