// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::test_result::SubmitTestRequest,
    services::attempt::{AttemptService, PaperRequest},
    utils::jwt::Claims,
};

/// Question count used when `n` is missing or malformed.
pub const DEFAULT_QUESTION_COUNT: i64 = 5;

/// Raw query parameters; parsed leniently.
#[derive(Debug, Deserialize)]
pub struct PaperParams {
    pub n: Option<String>,
    pub subject_id: Option<String>,
}

/// Parses the requested question count, falling back to 5 on anything that
/// is not a positive integer.
pub fn parse_question_count(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_QUESTION_COUNT)
}

/// An unparsable subject id means "any subject".
pub fn parse_subject_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Starts a new test or continues the running one.
///
/// * Draws `n` random questions (all of them if the bank is smaller).
/// * Reuses the session's timer while it runs for the same `n`.
/// * Never exposes the correct option.
pub async fn get_paper(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PaperParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let request = PaperRequest {
        question_count: parse_question_count(params.n.as_deref()),
        subject_id: parse_subject_id(params.subject_id.as_deref()),
    };

    let paper = AttemptService::new(pool, config.fallback_minutes_per_question)
        .start_or_resume(user_id, &claims.sid, request, chrono::Utc::now())
        .await?;

    Ok(Json(paper))
}

/// Submits the answers for the session's running test.
///
/// * Grades only the questions of the issued paper.
/// * Stores the result and clears the timer.
/// * Updates the candidate's attempt count and average.
pub async fn submit_paper(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let summary = AttemptService::new(pool, config.fallback_minutes_per_question)
        .submit(user_id, &claims.sid, &req.answers, chrono::Utc::now())
        .await?;

    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_count() {
        assert_eq!(parse_question_count(Some("12")), 12);
        assert_eq!(parse_question_count(Some(" 7 ")), 7);
        assert_eq!(parse_question_count(Some("abc")), 5);
        assert_eq!(parse_question_count(Some("")), 5);
        assert_eq!(parse_question_count(Some("0")), 5);
        assert_eq!(parse_question_count(Some("-3")), 5);
        assert_eq!(parse_question_count(None), 5);
    }

    #[test]
    fn test_parse_subject_id() {
        assert_eq!(parse_subject_id(Some("3")), Some(3));
        assert_eq!(parse_subject_id(Some("x")), None);
        assert_eq!(parse_subject_id(None), None);
    }
}
