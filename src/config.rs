// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use url::Url;

use crate::error::AppError;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Chat assistant is disabled when unset.
    pub openai_api_key: Option<String>,
    pub openai_base_url: Url,
    pub openai_model: String,
    pub ai_timeout_secs: u64,
    /// Minutes per question when no duration policy has been saved.
    pub fallback_minutes_per_question: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let openai_base_url = optional("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        let openai_base_url = Url::parse(&openai_base_url)
            .map_err(|e| AppError::Config(format!("Invalid OPENAI_BASE_URL: {}", e)))?;

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration: parsed_or("JWT_EXPIRATION", 86_400)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            port: parsed_or("PORT", 3000)?,
            admin_username: optional("ADMIN_USERNAME"),
            admin_password: optional("ADMIN_PASSWORD"),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_base_url,
            openai_model: optional("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            ai_timeout_secs: parsed_or("AI_TIMEOUT_SECS", 20)?,
            fallback_minutes_per_question: parsed_or("FALLBACK_MINUTES_PER_QUESTION", 1)?,
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Config(format!("{} must be set", name)))
}

/// Unset and blank variables are both treated as absent.
fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}
