// src/services/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, types::Json};

use crate::{
    error::AppError,
    models::{
        duration_policy::DurationPolicy,
        question::{AnswerKey, Question},
        test_result::{ResultSummary, SubmitTestResponse, TestResult},
        timing_window::{ActiveAttempt, PaperResponse},
    },
    utils::{
        scoring::{rolling_average, score_attempt},
        timer::{duration_minutes, resolve_window},
    },
};

/// Lost-update retries before the aggregate update gives up.
const MAX_AGGREGATE_RETRIES: usize = 16;

const RESULT_COLUMNS: &str = "id, user_id, subject_id, submitted_at, attempted, right_count, \
     wrong_count, total_questions, points, percentage, grade, time_taken_seconds, details";

/// What the candidate asked for when opening a paper.
#[derive(Debug, Clone, Copy)]
pub struct PaperRequest {
    pub question_count: i64,
    pub subject_id: Option<i64>,
}

/// Candidate counters after a score has been folded in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateAggregate {
    pub attempts_count: i64,
    pub average_score: f64,
}

/// Test session and scoring lifecycle: issue papers, keep the timer, grade
/// submissions, store results and maintain the candidate average.
#[derive(Clone)]
pub struct AttemptService {
    pool: SqlitePool,
    fallback_minutes_per_question: i64,
}

impl AttemptService {
    pub fn new(pool: SqlitePool, fallback_minutes_per_question: i64) -> Self {
        Self {
            pool,
            fallback_minutes_per_question,
        }
    }

    pub async fn duration_policy(&self) -> Result<Option<DurationPolicy>, AppError> {
        let policy = sqlx::query_as::<_, DurationPolicy>(
            r#"
            SELECT minutes_short, minutes_medium, minutes_long,
                   fallback_minutes_per_question, show_leave_warning
            FROM duration_policy
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(policy)
    }

    /// Draws up to `n` distinct questions in random order.
    /// A bank smaller than `n` yields every available question.
    pub async fn sample_questions(&self, n: i64, subject_id: Option<i64>) -> Result<Vec<Question>, AppError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, subject_id, prompt, option_a, option_b, option_c, option_d, \
             correct_option, explanation, created_at FROM questions",
        );
        if let Some(subject_id) = subject_id {
            query_builder.push(" WHERE subject_id = ").push_bind(subject_id);
        }
        query_builder.push(" ORDER BY RANDOM() LIMIT ").push_bind(n);

        let questions = query_builder
            .build_query_as::<Question>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to sample questions: {:?}", e);
                AppError::from(e)
            })?;

        Ok(questions)
    }

    /// The in-flight attempt of a login session, if it belongs to `user_id`.
    pub async fn active_attempt(&self, user_id: i64, session_id: &str) -> Result<Option<ActiveAttempt>, AppError> {
        let attempt = sqlx::query_as::<_, ActiveAttempt>(
            r#"
            SELECT session_id, user_id, subject_id, question_count, started_at,
                   duration_seconds, questions
            FROM timing_windows
            WHERE session_id = ? AND user_id = ?
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    /// Issues a paper and returns the remaining time of the session's window.
    ///
    /// The window is reused while it is running for the same question count;
    /// otherwise a new one starts at `now`. Every call draws a fresh sample.
    pub async fn start_or_resume(
        &self,
        user_id: i64,
        session_id: &str,
        request: PaperRequest,
        now: DateTime<Utc>,
    ) -> Result<PaperResponse, AppError> {
        let policy = self.duration_policy().await?;
        let minutes = duration_minutes(
            request.question_count,
            policy.as_ref(),
            self.fallback_minutes_per_question,
        );

        let existing = self
            .active_attempt(user_id, session_id)
            .await?
            .map(|attempt| attempt.window);
        let (window, created) = resolve_window(
            existing,
            request.question_count,
            minutes.saturating_mul(60),
            now,
        );

        let questions = self
            .sample_questions(request.question_count, request.subject_id)
            .await?;
        let answer_keys: Vec<AnswerKey> = questions.iter().map(Question::answer_key).collect();

        sqlx::query(
            r#"
            INSERT INTO timing_windows
                (session_id, user_id, question_count, subject_id, started_at, duration_seconds, questions)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                user_id = excluded.user_id,
                question_count = excluded.question_count,
                subject_id = excluded.subject_id,
                started_at = excluded.started_at,
                duration_seconds = excluded.duration_seconds,
                questions = excluded.questions
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(window.question_count)
        .bind(request.subject_id)
        .bind(window.started_at)
        .bind(window.duration_seconds)
        .bind(Json(&answer_keys))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store timing window: {:?}", e);
            AppError::from(e)
        })?;

        if created {
            tracing::info!(
                user_id,
                question_count = window.question_count,
                duration_seconds = window.duration_seconds,
                "Started new test window"
            );
        } else {
            tracing::debug!(user_id, "Resumed running test window");
        }

        Ok(PaperResponse {
            questions: questions.iter().map(Question::to_public).collect(),
            question_count: window.question_count,
            remaining_seconds: window.remaining_seconds(now),
            total_seconds: window.duration_seconds,
            time_limit_minutes: window.duration_seconds / 60,
            started_at: window.started_at,
            show_leave_warning: policy.map(|p| p.show_leave_warning).unwrap_or(true),
        })
    }

    /// Grades the session's current paper, stores the result, clears the
    /// window and folds the points into the candidate average.
    ///
    /// The window is claimed by deleting it inside the same transaction that
    /// stores the result and updates the aggregate, so a paper is graded once.
    pub async fn submit(
        &self,
        user_id: i64,
        session_id: &str,
        answers: &HashMap<i64, Option<String>>,
        now: DateTime<Utc>,
    ) -> Result<SubmitTestResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, ActiveAttempt>(
            r#"
            DELETE FROM timing_windows
            WHERE session_id = ? AND user_id = ?
            RETURNING session_id, user_id, subject_id, question_count, started_at,
                      duration_seconds, questions
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::BadRequest("No test in progress".to_string()))?;

        // Dropping `tx` rolls the claim back and keeps the window.
        if attempt.questions.is_empty() {
            return Err(AppError::BadRequest("The test has no questions".to_string()));
        }

        let ignored = answers
            .keys()
            .filter(|id| !attempt.questions.iter().any(|q| q.question_id == **id))
            .count();
        if ignored > 0 {
            tracing::debug!(user_id, ignored, "Ignoring answers for questions not in the paper");
        }

        let card = score_attempt(&attempt.questions, answers);
        let time_taken_seconds = attempt.window.time_taken_seconds(now);

        let result_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO results
                (user_id, subject_id, submitted_at, attempted, right_count, wrong_count,
                 total_questions, points, percentage, grade, time_taken_seconds, details)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(attempt.subject_id)
        .bind(now)
        .bind(card.attempted)
        .bind(card.right)
        .bind(card.wrong)
        .bind(card.total)
        .bind(card.points)
        .bind(card.percentage)
        .bind(card.grade.as_str())
        .bind(time_taken_seconds)
        .bind(Json(&card.details))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert result: {:?}", e);
            AppError::from(e)
        })?;

        // The claimed window holds the write lock, so nothing can race this update.
        fold_score(&mut *tx, user_id, card.points)
            .await?
            .ok_or(AppError::InternalServerError(format!(
                "Aggregate for user {} changed during submission",
                user_id
            )))?;

        tx.commit().await?;

        tracing::info!(
            user_id,
            result_id,
            right = card.right,
            wrong = card.wrong,
            points = card.points,
            "Test submitted"
        );

        Ok(SubmitTestResponse {
            result_id,
            attempted: card.attempted,
            right: card.right,
            wrong: card.wrong,
            total_questions: card.total,
            points: card.points,
            percentage: card.percentage,
            grade: card.grade.to_string(),
            time_taken_seconds,
        })
    }

    /// Drops the session's window, if any.
    pub async fn clear_window(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM timing_windows WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Folds `score` into the candidate's running average.
    ///
    /// Optimistic read-modify-write: the update only applies if the attempt
    /// counter still holds the value the average was computed from, so two
    /// concurrent updates can never lose each other's score.
    pub async fn record_score(&self, user_id: i64, score: f64) -> Result<CandidateAggregate, AppError> {
        for retry in 0..MAX_AGGREGATE_RETRIES {
            let mut conn = self.pool.acquire().await?;
            if let Some(next) = fold_score(&mut *conn, user_id, score).await? {
                return Ok(next);
            }
            drop(conn);

            tracing::debug!(user_id, retry, "Candidate aggregate changed concurrently, retrying");
            tokio::task::yield_now().await;
        }

        Err(AppError::InternalServerError(format!(
            "Could not update aggregate for user {} after {} attempts",
            user_id, MAX_AGGREGATE_RETRIES
        )))
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<ResultSummary>, AppError> {
        let results = sqlx::query_as::<_, ResultSummary>(
            r#"
            SELECT id, subject_id, submitted_at, attempted, right_count, wrong_count,
                   total_questions, points, percentage, grade
            FROM results
            WHERE user_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    /// A result by id, only if it belongs to `user_id`.
    pub async fn result_for(&self, user_id: i64, result_id: i64) -> Result<Option<TestResult>, AppError> {
        let sql = format!("SELECT {} FROM results WHERE id = ? AND user_id = ?", RESULT_COLUMNS);
        let result = sqlx::query_as::<_, TestResult>(&sql)
            .bind(result_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    pub async fn latest_result(&self, user_id: i64) -> Result<Option<TestResult>, AppError> {
        let sql = format!(
            "SELECT {} FROM results WHERE user_id = ? ORDER BY id DESC LIMIT 1",
            RESULT_COLUMNS
        );
        let result = sqlx::query_as::<_, TestResult>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }
}

/// One compare-and-set round on the candidate aggregate.
/// `None` means another writer got there first.
async fn fold_score(
    conn: &mut SqliteConnection,
    user_id: i64,
    score: f64,
) -> Result<Option<CandidateAggregate>, AppError> {
    let (count, average) = sqlx::query_as::<_, (i64, f64)>(
        "SELECT attempts_count, average_score FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let next = CandidateAggregate {
        attempts_count: count + 1,
        average_score: rolling_average(average, count, score),
    };

    let updated = sqlx::query(
        r#"
        UPDATE users
        SET attempts_count = ?, average_score = ?
        WHERE id = ? AND attempts_count = ?
        "#,
    )
    .bind(next.attempts_count)
    .bind(next.average_score)
    .bind(user_id)
    .bind(count)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok((updated == 1).then_some(next))
}
