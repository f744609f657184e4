// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        duration_policy::{DurationPolicy, UpdateDurationPolicyRequest},
        question::{CreateQuestionRequest, Question},
        subject::CreateSubjectRequest,
        test_result::ResultSummary,
        user::User,
    },
    utils::html::clean_html,
};

/// Lists every question in the bank, correct options included.
/// Admin only.
pub async fn list_questions(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, subject_id, prompt, option_a, option_b, option_c, option_d,
               correct_option, explanation, created_at
        FROM questions
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(questions))
}

/// Adds a question to the bank.
/// Admin only. Text fields are sanitized; the correct option is stored uppercase.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if let Some(subject_id) = payload.subject_id {
        sqlx::query_scalar::<_, i64>("SELECT id FROM subjects WHERE id = ?")
            .bind(subject_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::BadRequest(format!("Subject {} does not exist", subject_id)))?;
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions
            (subject_id, prompt, option_a, option_b, option_c, option_d,
             correct_option, explanation, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(payload.subject_id)
    .bind(clean_html(&payload.prompt))
    .bind(clean_html(&payload.option_a))
    .bind(clean_html(&payload.option_b))
    .bind(clean_html(&payload.option_c))
    .bind(clean_html(&payload.option_d))
    .bind(payload.correct_option.trim().to_ascii_uppercase())
    .bind(payload.explanation.as_deref().map(clean_html))
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Deletes a question. Stored results keep their own copy of it.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates a subject.
/// Admin only.
pub async fn create_subject(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let name = clean_html(&payload.name);
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO subjects (name, description, created_at) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(&name)
    .bind(clean_html(&payload.description))
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint") {
            AppError::Conflict(format!("Subject '{}' already exists", name))
        } else {
            tracing::error!("Failed to create subject: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Current duration policy, or 404 while the fallback rate is in effect.
/// Admin only.
pub async fn get_duration_policy(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let policy = sqlx::query_as::<_, DurationPolicy>(
        r#"
        SELECT minutes_short, minutes_medium, minutes_long,
               fallback_minutes_per_question, show_leave_warning
        FROM duration_policy
        WHERE id = 1
        "#,
    )
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("No duration policy configured".to_string()))?;

    Ok(Json(policy))
}

/// Replaces the duration policy. Running timers keep their original length.
/// Admin only.
pub async fn update_duration_policy(
    State(pool): State<SqlitePool>,
    Json(payload): Json<UpdateDurationPolicyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let policy = sqlx::query_as::<_, DurationPolicy>(
        r#"
        INSERT INTO duration_policy
            (id, minutes_short, minutes_medium, minutes_long,
             fallback_minutes_per_question, show_leave_warning, updated_at)
        VALUES (1, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            minutes_short = excluded.minutes_short,
            minutes_medium = excluded.minutes_medium,
            minutes_long = excluded.minutes_long,
            fallback_minutes_per_question = excluded.fallback_minutes_per_question,
            show_leave_warning = excluded.show_leave_warning,
            updated_at = excluded.updated_at
        RETURNING minutes_short, minutes_medium, minutes_long,
                  fallback_minutes_per_question, show_leave_warning
        "#,
    )
    .bind(payload.minutes_short)
    .bind(payload.minutes_medium)
    .bind(payload.minutes_long)
    .bind(payload.fallback_minutes_per_question)
    .bind(payload.show_leave_warning)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save duration policy: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(?policy, "Duration policy updated");

    Ok(Json(policy))
}

/// Global counts for the admin dashboard.
/// Admin only.
pub async fn get_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let (total_students, total_subjects, total_questions, total_tests) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE role = 'student'),
                (SELECT COUNT(*) FROM subjects),
                (SELECT COUNT(*) FROM questions),
                (SELECT COUNT(*) FROM results)
            "#,
        )
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "total_students": total_students,
        "total_subjects": total_subjects,
        "total_questions": total_questions,
        "total_tests": total_tests
    })))
}

/// Every student with their attempt count and average score.
/// Admin only.
pub async fn list_students(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let students = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, name, role, attempts_count, average_score, created_at
        FROM users
        WHERE role = 'student'
        ORDER BY username
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list students: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(students))
}

/// Deletes a student. Their results and running test go with them.
/// Admin only. Administrators cannot be deleted here.
pub async fn delete_student(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'student'")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    tracing::info!(student_id = id, "Student deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// A student's results, most recent first.
/// Admin only.
pub async fn list_student_results(
    State(pool): State<SqlitePool>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = crate::handlers::profile::student_stats(&pool, student_id).await?;

    let results = sqlx::query_as::<_, ResultSummary>(
        r#"
        SELECT id, subject_id, submitted_at, attempted, right_count, wrong_count,
               total_questions, points, percentage, grade
        FROM results
        WHERE user_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "stats": stats,
        "results": results
    })))
}
