// src/utils/timer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::duration_policy::DurationPolicy;

/// Question-count tier that decides how much time an attempt gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Short,
    Medium,
    Long,
}

impl Band {
    /// `n <= 5` is short, `6..=10` is medium, anything larger is long.
    pub fn for_count(n: i64) -> Self {
        match n {
            i64::MIN..=5 => Band::Short,
            6..=10 => Band::Medium,
            _ => Band::Long,
        }
    }
}

/// Minutes allowed for an attempt of `n` questions.
///
/// Without a policy row the allowance is `max(n * fallback_rate, 1)`.
/// A band configured with `0` minutes counts as disabled and uses the
/// policy's own per-question rate instead.
pub fn duration_minutes(n: i64, policy: Option<&DurationPolicy>, fallback_rate: i64) -> i64 {
    let Some(policy) = policy else {
        return per_question_minutes(n, fallback_rate);
    };

    let band_minutes = match Band::for_count(n) {
        Band::Short => policy.minutes_short,
        Band::Medium => policy.minutes_medium,
        Band::Long => policy.minutes_long,
    };

    if band_minutes > 0 {
        band_minutes
    } else {
        per_question_minutes(n, policy.fallback_minutes_per_question)
    }
}

fn per_question_minutes(n: i64, rate: i64) -> i64 {
    n.saturating_mul(rate).max(1)
}

/// The timing state of one in-flight attempt.
///
/// Identity is `(question_count, started_at, duration_seconds)`; the window is
/// never mutated, only replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TimingWindow {
    pub question_count: i64,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl TimingWindow {
    pub fn open(question_count: i64, duration_seconds: i64, now: DateTime<Utc>) -> Self {
        Self {
            question_count,
            started_at: now,
            duration_seconds,
        }
    }

    /// Seconds since the window opened. Clock skew never yields a negative value.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.elapsed_seconds(now) >= self.duration_seconds
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.duration_seconds - self.elapsed_seconds(now)).max(0)
    }

    /// Elapsed time capped at the allowance, used as the recorded time taken.
    pub fn time_taken_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.elapsed_seconds(now).min(self.duration_seconds)
    }

    pub fn can_resume(&self, question_count: i64, now: DateTime<Utc>) -> bool {
        self.question_count == question_count && !self.is_expired(now)
    }
}

/// Picks the window for a start/continue request.
///
/// Returns the existing window when it is still running for the same question
/// count, otherwise a fresh one starting at `now`. The flag is `true` when a
/// new window was opened.
pub fn resolve_window(
    existing: Option<TimingWindow>,
    question_count: i64,
    duration_seconds: i64,
    now: DateTime<Utc>,
) -> (TimingWindow, bool) {
    match existing {
        Some(window) if window.can_resume(question_count, now) => (window, false),
        _ => (TimingWindow::open(question_count, duration_seconds, now), true),
    }
}
