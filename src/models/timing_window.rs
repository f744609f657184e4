// src/models/timing_window.rs

use serde::Serialize;
use sqlx::{FromRow, types::Json};

use crate::{models::question::AnswerKey, utils::timer::TimingWindow};

/// Represents the 'timing_windows' table: the in-flight attempt of one login session.
#[derive(Debug, Clone, FromRow)]
pub struct ActiveAttempt {
    pub session_id: String,
    pub user_id: i64,
    pub subject_id: Option<i64>,
    #[sqlx(flatten)]
    pub window: TimingWindow,
    /// Answer keys of the most recently issued paper.
    pub questions: Json<Vec<AnswerKey>>,
}

/// DTO returned when a paper is issued or resumed.
#[derive(Debug, Serialize)]
pub struct PaperResponse {
    pub questions: Vec<crate::models::question::PublicQuestion>,
    /// Number of questions requested; may exceed `questions.len()` on a small bank.
    pub question_count: i64,
    pub remaining_seconds: i64,
    pub total_seconds: i64,
    pub time_limit_minutes: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub show_leave_warning: bool,
}
