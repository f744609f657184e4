// src/utils/chat_fallback.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::models::test_result::TestResult;

static GREETING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(hello|hi|hey)\b").expect("valid greeting regex"));
static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(score|points|result|grade|percentage)\b|how did i do")
        .expect("valid score regex")
});
static MISTAKES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(mistakes?|wrong)\b").expect("valid mistakes regex"));
static EXPLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"explain question\s*#?(\d+)?").expect("valid explain regex"));
static IMPROVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(improve|better)\b").expect("valid improve regex"));

pub const NO_RESULTS_REPLY: &str = "You haven't taken any tests yet. Take a test first!";

/// Deterministic keyword-based reply used whenever the assistant returns nothing.
pub fn fallback_reply(message: &str, result: &TestResult) -> String {
    let lower = message.to_lowercase();

    if GREETING.is_match(&lower) {
        return "Hello! I can explain your score, list mistakes, or explain a specific question. \
                Try: 'show my mistakes' or 'explain question 12'."
            .to_string();
    }

    if SCORE.is_match(&lower) {
        return format!(
            "You attempted {} of {} questions. Correct: {}, Wrong: {}. Points: {:.2} / 10 ({}%, grade {}).",
            result.attempted,
            result.total_questions,
            result.right,
            result.wrong,
            result.points,
            result.percentage,
            result.grade
        );
    }

    if MISTAKES.is_match(&lower) {
        return summarize_mistakes(result);
    }

    if let Some(caps) = EXPLAIN.captures(&lower) {
        return match caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) {
            Some(question_id) => explain_question(result, question_id),
            None => "Please specify the question number, e.g., 'explain question 12'.".to_string(),
        };
    }

    if IMPROVE.is_match(&lower) {
        return "To improve, review the questions you got wrong, read the explanation for each \
                correct option, then retake a test of the same length."
            .to_string();
    }

    "I can help with: 'show my mistakes', 'explain question 7', or 'what is my score?'.".to_string()
}

/// Lists every question that was answered wrongly or skipped, with its correct option.
pub fn summarize_mistakes(result: &TestResult) -> String {
    let lines: Vec<String> = result
        .details
        .iter()
        .filter(|d| !d.is_correct)
        .enumerate()
        .map(|(idx, d)| {
            let correct_text = d.options.text_for(&d.correct_label).unwrap_or_default();
            format!(
                "{}. Q{}: Correct: {}) {}",
                idx + 1,
                d.question_id,
                d.correct_label,
                correct_text
            )
        })
        .collect();

    if lines.is_empty() {
        return "Great job! There are no mistakes in your latest test.".to_string();
    }

    format!(
        "Here are your mistakes and the correct answers:\n{}",
        lines.join("\n")
    )
}

fn explain_question(result: &TestResult, question_id: i64) -> String {
    let Some(detail) = result.details.iter().find(|d| d.question_id == question_id) else {
        return format!(
            "I couldn't find details for question {} in this test.",
            question_id
        );
    };

    let correct_text = detail.options.text_for(&detail.correct_label).unwrap_or_default();
    let (user_label, user_text) = match detail.submitted_label.as_deref() {
        Some(label) => (label, detail.options.text_for(label).unwrap_or_default()),
        None => ("-", ""),
    };
    let verdict = if detail.is_correct {
        "You were correct!".to_string()
    } else {
        detail
            .explanation
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| {
                "This is the correct choice because it best matches the question.".to_string()
            })
    };

    format!(
        "Q{}: {}\nYour answer: {}) {}\nCorrect answer: {}) {}\n{}",
        question_id, detail.prompt, user_label, user_text, detail.correct_label, correct_text, verdict
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionOptions;
    use crate::utils::scoring::QuestionReview;
    use sqlx::types::Json;

    fn review(id: i64, correct: &str, submitted: Option<&str>) -> QuestionReview {
        QuestionReview {
            question_id: id,
            prompt: format!("Prompt {}", id),
            options: QuestionOptions {
                a: "alpha".into(),
                b: "beta".into(),
                c: "gamma".into(),
                d: "delta".into(),
            },
            correct_label: correct.into(),
            submitted_label: submitted.map(str::to_string),
            is_correct: submitted == Some(correct),
            explanation: None,
        }
    }

    fn result(details: Vec<QuestionReview>) -> TestResult {
        TestResult {
            id: 1,
            user_id: 1,
            subject_id: None,
            submitted_at: chrono::Utc::now(),
            attempted: 2,
            right: 1,
            wrong: 1,
            total_questions: 3,
            points: 0.0,
            percentage: 33,
            grade: "F".into(),
            time_taken_seconds: 60,
            details: Json(details),
        }
    }

    #[test]
    fn test_greeting() {
        let r = result(vec![]);
        assert!(fallback_reply("Hi there", &r).starts_with("Hello!"));
        // "this" must not count as a greeting
        assert!(!fallback_reply("this", &r).starts_with("Hello!"));
    }

    #[test]
    fn test_score_reply() {
        let r = result(vec![]);
        let reply = fallback_reply("What is my score?", &r);
        assert!(reply.contains("Correct: 1, Wrong: 1"));
        assert!(reply.contains("0.00 / 10"));
    }

    #[test]
    fn test_mistakes_reply() {
        let r = result(vec![
            review(7, "A", Some("A")),
            review(8, "B", Some("C")),
            review(9, "D", None),
        ]);
        let reply = fallback_reply("show my mistakes", &r);
        assert!(reply.contains("1. Q8: Correct: B) beta"));
        assert!(reply.contains("2. Q9: Correct: D) delta"));
        assert!(!reply.contains("Q7"));
    }

    #[test]
    fn test_no_mistakes() {
        let r = result(vec![review(1, "A", Some("A"))]);
        assert!(summarize_mistakes(&r).starts_with("Great job!"));
    }

    #[test]
    fn test_explain_question() {
        let r = result(vec![review(12, "C", Some("A"))]);
        let reply = fallback_reply("Explain question 12", &r);
        assert!(reply.contains("Your answer: A) alpha"));
        assert!(reply.contains("Correct answer: C) gamma"));

        let missing = fallback_reply("explain question 99", &r);
        assert!(missing.contains("couldn't find details for question 99"));

        let unnumbered = fallback_reply("explain question", &r);
        assert!(unnumbered.contains("specify the question number"));
    }

    #[test]
    fn test_default_reply() {
        let r = result(vec![]);
        assert!(fallback_reply("???", &r).starts_with("I can help with"));
    }
}
