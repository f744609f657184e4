// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Optional subject the question is filed under.
    pub subject_id: Option<i64>,

    /// The text of the question.
    pub prompt: String,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// Label of the correct option, one of 'A'..'D'.
    pub correct_option: String,

    /// Explanation shown when reviewing a result.
    pub explanation: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// The four labelled options of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

impl QuestionOptions {
    /// Option text for a label, case-insensitive.
    pub fn text_for(&self, label: &str) -> Option<&str> {
        match label.trim().to_ascii_uppercase().as_str() {
            "A" => Some(&self.a),
            "B" => Some(&self.b),
            "C" => Some(&self.c),
            "D" => Some(&self.d),
            _ => None,
        }
    }
}

/// Everything needed to grade and later review one question.
///
/// Snapshotted into the in-flight attempt when a paper is issued so grading
/// does not depend on the bank staying unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub question_id: i64,
    pub prompt: String,
    pub options: QuestionOptions,
    pub correct_label: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// DTO for sending a question to a candidate (excludes the correct label).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub prompt: String,
    pub options: QuestionOptions,
}

impl Question {
    pub fn options(&self) -> QuestionOptions {
        QuestionOptions {
            a: self.option_a.clone(),
            b: self.option_b.clone(),
            c: self.option_c.clone(),
            d: self.option_d.clone(),
        }
    }

    pub fn answer_key(&self) -> AnswerKey {
        AnswerKey {
            question_id: self.id,
            prompt: self.prompt.clone(),
            options: self.options(),
            correct_label: self.correct_option.trim().to_ascii_uppercase(),
            explanation: self.explanation.clone(),
        }
    }

    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            prompt: self.prompt.clone(),
            options: self.options(),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub subject_id: Option<i64>,
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(length(min = 1, max = 255))]
    pub option_a: String,
    #[validate(length(min = 1, max = 255))]
    pub option_b: String,
    #[validate(length(min = 1, max = 255))]
    pub option_c: String,
    #[validate(length(min = 1, max = 255))]
    pub option_d: String,
    #[validate(custom(function = validate_option_label))]
    pub correct_option: String,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

fn validate_option_label(label: &str) -> Result<(), validator::ValidationError> {
    match label.trim().to_ascii_uppercase().as_str() {
        "A" | "B" | "C" | "D" => Ok(()),
        _ => Err(validator::ValidationError::new("correct_option_must_be_a_to_d")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_label_validation() {
        assert!(validate_option_label("b").is_ok());
        assert!(validate_option_label(" D ").is_ok());
        assert!(validate_option_label("E").is_err());
        assert!(validate_option_label("").is_err());
    }

    #[test]
    fn test_text_for_label() {
        let options = QuestionOptions {
            a: "one".into(),
            b: "two".into(),
            c: "three".into(),
            d: "four".into(),
        };
        assert_eq!(options.text_for("c"), Some("three"));
        assert_eq!(options.text_for("-"), None);
    }
}
