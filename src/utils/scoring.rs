// src/utils/scoring.rs

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::question::{AnswerKey, QuestionOptions};

/// Ceiling of the penalised score, independent of the number of questions.
pub const MAX_POINTS: f64 = 10.0;

/// Letter grade derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a percentage to a grade. Each band includes its lower edge.
pub fn grade_for(percentage: f64) -> Grade {
    match percentage {
        p if p >= 95.0 => Grade::APlus,
        p if p >= 90.0 => Grade::A,
        p if p >= 85.0 => Grade::BPlus,
        p if p >= 80.0 => Grade::B,
        p if p >= 75.0 => Grade::CPlus,
        p if p >= 70.0 => Grade::C,
        p if p >= 60.0 => Grade::D,
        _ => Grade::F,
    }
}

/// `(right - wrong) / max(total, 1) * 10`. Negative when wrong answers dominate.
pub fn penalized_points(right: i64, wrong: i64, total: i64) -> f64 {
    (right - wrong) as f64 / total.max(1) as f64 * MAX_POINTS
}

/// Share of correct answers, rounded half to even. `0` for an empty paper.
pub fn percentage(right: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (right as f64 / total as f64 * 100.0).round_ties_even() as i64
}

/// Mean after appending `new_score` to `old_count` earlier scores.
///
/// `old_count` must be the count *before* this score is added.
pub fn rolling_average(old_average: f64, old_count: i64, new_score: f64) -> f64 {
    let old_count = old_count.max(0) as f64;
    (old_average * old_count + new_score) / (old_count + 1.0)
}

/// Trims and uppercases a submitted or stored option label.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_ascii_uppercase()
}

/// Per-question outcome kept on the result for later review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionReview {
    pub question_id: i64,
    pub prompt: String,
    pub options: QuestionOptions,
    pub correct_label: String,
    /// `None` when the question was left unanswered.
    pub submitted_label: Option<String>,
    pub is_correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Aggregate outcome of one graded attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub attempted: i64,
    pub right: i64,
    pub wrong: i64,
    pub total: i64,
    pub points: f64,
    pub percentage: i64,
    pub grade: Grade,
    pub details: Vec<QuestionReview>,
}

/// Grades the presented questions against the submitted labels.
///
/// Questions missing from `submitted`, or answered with an empty label, count
/// as unattempted. Keys in `submitted` that were never presented are ignored.
pub fn score_attempt(presented: &[AnswerKey], submitted: &HashMap<i64, Option<String>>) -> Scorecard {
    let mut attempted = 0;
    let mut right = 0;
    let mut details = Vec::with_capacity(presented.len());

    for key in presented {
        let correct_label = normalize_label(&key.correct_label);
        let submitted_label = submitted
            .get(&key.question_id)
            .and_then(|label| label.as_deref())
            .map(normalize_label)
            .filter(|label| !label.is_empty());

        let is_correct = submitted_label.as_deref() == Some(correct_label.as_str());
        if submitted_label.is_some() {
            attempted += 1;
            if is_correct {
                right += 1;
            }
        }

        details.push(QuestionReview {
            question_id: key.question_id,
            prompt: key.prompt.clone(),
            options: key.options.clone(),
            correct_label,
            submitted_label,
            is_correct,
            explanation: key.explanation.clone(),
        });
    }

    let total = presented.len() as i64;
    let wrong = attempted - right;
    let percentage = percentage(right, total);

    Scorecard {
        attempted,
        right,
        wrong,
        total,
        points: penalized_points(right, wrong, total),
        percentage,
        grade: grade_for(percentage as f64),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: i64, correct: &str) -> AnswerKey {
        AnswerKey {
            question_id: id,
            prompt: format!("Question {}", id),
            options: QuestionOptions {
                a: "alpha".into(),
                b: "beta".into(),
                c: "gamma".into(),
                d: "delta".into(),
            },
            correct_label: correct.into(),
            explanation: None,
        }
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, Option<String>> {
        pairs
            .iter()
            .map(|(id, label)| (*id, Some(label.to_string())))
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
    }

    #[test]
    fn test_mixed_submission() {
        let paper = vec![key(1, "B"), key(2, "A"), key(3, "C")];
        let submitted = answers(&[(1, "B"), (2, ""), (3, "c")]);

        let card = score_attempt(&paper, &submitted);
        assert_eq!(card.attempted, 2);
        assert_eq!(card.right, 2);
        assert_eq!(card.wrong, 0);
        assert_eq!(card.total, 3);
        assert_close(card.points, 20.0 / 3.0);
        assert_eq!((card.points * 100.0).round() / 100.0, 6.67);
        assert_eq!(card.details.len(), 3);
        assert_eq!(card.details[1].submitted_label, None);
        assert!(!card.details[1].is_correct);
        assert_eq!(card.details[2].submitted_label.as_deref(), Some("C"));
        assert!(card.details[2].is_correct);
    }

    #[test]
    fn test_lowercase_label_matches() {
        let card = score_attempt(&[key(1, "B")], &answers(&[(1, "b")]));
        assert_eq!(card.right, 1);
        assert_close(card.points, 10.0);
    }

    #[test]
    fn test_lowercase_stored_answer_matches() {
        let card = score_attempt(&[key(1, "d")], &answers(&[(1, " D ")]));
        assert_eq!(card.right, 1);
        assert_eq!(card.details[0].correct_label, "D");
    }

    #[test]
    fn test_nothing_attempted_scores_zero() {
        let paper = vec![key(1, "A"), key(2, "B")];
        let mut submitted = HashMap::new();
        submitted.insert(2, None);

        let card = score_attempt(&paper, &submitted);
        assert_eq!(card.attempted, 0);
        assert_eq!(card.right + card.wrong, card.attempted);
        assert_close(card.points, 0.0);
        assert_eq!(card.grade, Grade::F);
    }

    #[test]
    fn test_all_wrong_is_negative() {
        let paper = vec![key(1, "A"), key(2, "B"), key(3, "C"), key(4, "D")];
        let submitted = answers(&[(1, "B"), (2, "C"), (3, "D"), (4, "A")]);

        let card = score_attempt(&paper, &submitted);
        assert_eq!(card.attempted, 4);
        assert_eq!(card.wrong, 4);
        assert_close(card.points, -10.0);
        assert_eq!(card.percentage, 0);
    }

    #[test]
    fn test_counts_invariant_over_mixed_answers() {
        let paper: Vec<AnswerKey> = (1..=10).map(|i| key(i, "A")).collect();
        let labels = ["A", "b", "", "a", "C", " ", "A", "d", "a", ""];
        let submitted: HashMap<i64, Option<String>> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (i as i64 + 1, Some(l.to_string())))
            .collect();

        let card = score_attempt(&paper, &submitted);
        assert_eq!(card.attempted, card.right + card.wrong);
        assert_eq!(card.attempted, 7);
        assert_eq!(card.right, 4);
        assert_close(card.points, (4.0 - 3.0) / 10.0 * 10.0);
    }

    #[test]
    fn test_unknown_question_ids_ignored() {
        let card = score_attempt(&[key(1, "A")], &answers(&[(1, "A"), (99, "B")]));
        assert_eq!(card.attempted, 1);
        assert_eq!(card.details.len(), 1);
    }

    #[test]
    fn test_empty_paper() {
        let card = score_attempt(&[], &HashMap::new());
        assert_eq!(card.total, 0);
        assert_close(card.points, 0.0);
        assert_eq!(card.percentage, 0);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(grade_for(100.0), Grade::APlus);
        assert_eq!(grade_for(95.0), Grade::APlus);
        assert_eq!(grade_for(94.99), Grade::A);
        assert_eq!(grade_for(90.0), Grade::A);
        assert_eq!(grade_for(85.0), Grade::BPlus);
        assert_eq!(grade_for(80.0), Grade::B);
        assert_eq!(grade_for(75.0), Grade::CPlus);
        assert_eq!(grade_for(70.0), Grade::C);
        assert_eq!(grade_for(60.0), Grade::D);
        assert_eq!(grade_for(59.99), Grade::F);
        assert_eq!(grade_for(0.0), Grade::F);
    }

    #[test]
    fn test_grade_serializes_with_plus() {
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(Grade::CPlus.to_string(), "C+");
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_percentage_halves_round_to_even() {
        assert_eq!(percentage(1, 8), 12);
        assert_eq!(percentage(3, 8), 38);
        assert_eq!(percentage(189, 200), 94);
    }

    #[test]
    fn test_grade_uses_rounded_percentage() {
        let paper: Vec<AnswerKey> = (1..=200).map(|i| key(i, "A")).collect();
        let submitted: HashMap<i64, Option<String>> = (1..=200)
            .map(|i| (i, Some(if i <= 189 { "A" } else { "B" }.to_string())))
            .collect();

        let card = score_attempt(&paper, &submitted);
        assert_eq!(card.right, 189);
        assert_eq!(card.percentage, 94);
        assert_eq!(card.grade, Grade::A);
    }

    #[test]
    fn test_rolling_average_sequence() {
        let mut count = 0;
        let mut average = 0.0;
        let mut seen = Vec::new();
        for score in [10.0, -2.0, 6.0] {
            average = rolling_average(average, count, score);
            count += 1;
            seen.push((average * 100.0).round() / 100.0);
        }
        assert_eq!(seen, vec![10.0, 4.0, 4.67]);
    }

    #[test]
    fn test_rolling_average_needs_pre_increment_count() {
        // Using the already-incremented count gives a different, wrong mean.
        let right = rolling_average(10.0, 1, -2.0);
        let wrong = rolling_average(10.0, 2, -2.0);
        assert_close(right, 4.0);
        assert!((wrong - right).abs() > 1.0);
    }
}
