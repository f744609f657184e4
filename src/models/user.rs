// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Display name.
    pub name: String,

    /// User role: 'student' or 'admin'.
    pub role: String,

    /// Number of submitted tests.
    pub attempts_count: i64,

    /// Mean of all recorded test points.
    pub average_score: f64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated statistics for the current candidate.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_tests: i64,
    pub average_score: f64,
    pub average_percentage: f64,
    pub best_percentage: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Username length must be between 3 and 20 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(
        min = 1,
        max = 30,
        message = "Name length must be between 1 and 30 characters."
    ))]
    pub name: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 20))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
