// src/models/duration_policy.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the singleton 'duration_policy' row.
///
/// Maps question-count bands to minute allowances. The row is absent until an
/// administrator saves one; the timer then falls back to a per-question rate.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DurationPolicy {
    /// Minutes when 5 or fewer questions are requested.
    pub minutes_short: i64,
    /// Minutes for 6 to 10 questions.
    pub minutes_medium: i64,
    /// Minutes for more than 10 questions.
    pub minutes_long: i64,
    /// Per-question rate used by bands set to 0.
    pub fallback_minutes_per_question: i64,
    /// Whether clients should warn before leaving a running test.
    pub show_leave_warning: bool,
}

/// DTO for replacing the duration policy.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDurationPolicyRequest {
    #[validate(range(min = 0, max = 600))]
    pub minutes_short: i64,
    #[validate(range(min = 0, max = 600))]
    pub minutes_medium: i64,
    #[validate(range(min = 0, max = 600))]
    pub minutes_long: i64,
    #[validate(range(min = 1, max = 60))]
    pub fallback_minutes_per_question: i64,
    #[serde(default = "default_leave_warning")]
    pub show_leave_warning: bool,
}

fn default_leave_warning() -> bool {
    true
}
