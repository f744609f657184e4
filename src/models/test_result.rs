// src/models/test_result.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use crate::utils::scoring::QuestionReview;

/// Represents the 'results' table in the database.
/// One immutable row per submitted attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    pub subject_id: Option<i64>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub attempted: i64,
    #[sqlx(rename = "right_count")]
    pub right: i64,
    #[sqlx(rename = "wrong_count")]
    pub wrong: i64,
    pub total_questions: i64,
    /// Penalised score in `[-10, 10]`.
    pub points: f64,
    pub percentage: i64,
    pub grade: String,
    pub time_taken_seconds: i64,
    /// Per-question review, in the order the questions were presented.
    pub details: Json<Vec<QuestionReview>>,
}

/// Lightweight row for history listings.
#[derive(Debug, Serialize, FromRow)]
pub struct ResultSummary {
    pub id: i64,
    pub subject_id: Option<i64>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub attempted: i64,
    #[sqlx(rename = "right_count")]
    pub right: i64,
    #[sqlx(rename = "wrong_count")]
    pub wrong: i64,
    pub total_questions: i64,
    pub points: f64,
    pub percentage: i64,
    pub grade: String,
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitTestRequest {
    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: selected option label, or null/empty when skipped
    #[serde(default)]
    pub answers: HashMap<i64, Option<String>>,
}

/// DTO returned after a successful submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTestResponse {
    pub result_id: i64,
    pub attempted: i64,
    pub right: i64,
    pub wrong: i64,
    pub total_questions: i64,
    pub points: f64,
    pub percentage: i64,
    pub grade: String,
    pub time_taken_seconds: i64,
}
