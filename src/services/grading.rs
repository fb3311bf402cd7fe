// src/services/grading.rs

use std::collections::{HashMap, HashSet};

use crate::{
    config::PASSING_SCORE_PERCENTAGE,
    models::{
        attempt::SubmittedAnswer,
        question::{QuestionKind, QuestionWithAnswers},
    },
};

/// Correctness of one graded question, persisted as an attempt answer.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub answer_id: Option<i64>,
    pub true_false: Option<bool>,
    pub text: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub correct_count: usize,
    pub total_questions: usize,
    /// Percentage rounded to two decimals.
    pub score: f64,
    pub passed: bool,
    pub answers: Vec<GradedAnswer>,
}

/// Grades a submission against the full answer key of a quiz.
///
/// The denominator is the number of questions in the quiz, so unanswered
/// questions count as wrong. Items for unknown questions are dropped and
/// only the first item per question is graded.
pub fn grade(questions: &[QuestionWithAnswers], submitted: &[SubmittedAnswer]) -> Grade {
    let by_id: HashMap<i64, &QuestionWithAnswers> =
        questions.iter().map(|q| (q.question.id, q)).collect();

    let mut seen = HashSet::new();
    let mut answers = Vec::new();

    for item in submitted {
        let Some(question) = by_id.get(&item.question_id) else {
            continue;
        };
        if !seen.insert(item.question_id) {
            continue;
        }

        answers.push(GradedAnswer {
            question_id: item.question_id,
            answer_id: item.answer_id,
            true_false: item.true_false,
            text: item.text.clone(),
            is_correct: is_correct(question, item),
        });
    }

    let correct_count = answers.iter().filter(|a| a.is_correct).count();
    let total_questions = questions.len();
    let score = percentage(correct_count, total_questions);

    Grade {
        correct_count,
        total_questions,
        score,
        passed: score >= PASSING_SCORE_PERCENTAGE,
        answers,
    }
}

fn is_correct(question: &QuestionWithAnswers, item: &SubmittedAnswer) -> bool {
    match question.question.kind {
        QuestionKind::MultipleChoice => item.answer_id.is_some_and(|chosen| {
            question
                .answers
                .iter()
                .any(|a| a.id == chosen && a.is_correct)
        }),
        QuestionKind::TrueFalse => match (question.question.correct_value, item.true_false) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        },
        // No semantic check: any non-blank response is accepted.
        QuestionKind::FreeText => item.text.as_deref().is_some_and(|t| !t.trim().is_empty()),
    }
}

fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = correct as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
