// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Correctness comes from the `is_correct` flag of the chosen answer.
    MultipleChoice,
    /// Correctness comes from `correct_value` on the question itself.
    TrueFalse,
    /// Any non-blank text counts as correct.
    FreeText,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    /// The text content of the question.
    pub prompt: String,

    pub kind: QuestionKind,

    /// Expected value for true/false questions, NULL otherwise.
    pub correct_value: Option<bool>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'answers' table: one choice of a multiple-choice question.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Instructor view: the question with its answer key.
#[derive(Debug, Serialize)]
pub struct QuestionWithAnswers {
    #[serde(flatten)]
    pub question: Question,
    pub answers: Vec<Answer>,
}

/// DTO for sending question to learners (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub prompt: String,
    pub kind: QuestionKind,
    pub answers: Vec<PublicAnswer>,
}

#[derive(Debug, Serialize)]
pub struct PublicAnswer {
    pub id: i64,
    pub text: String,
}

impl From<QuestionWithAnswers> for PublicQuestion {
    fn from(full: QuestionWithAnswers) -> Self {
        Self {
            id: full.question.id,
            prompt: full.question.prompt,
            kind: full.question.kind,
            answers: full
                .answers
                .into_iter()
                .map(|a| PublicAnswer { id: a.id, text: a.text })
                .collect(),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub kind: QuestionKind,
    pub correct_value: Option<bool>,
}

impl CreateQuestionRequest {
    /// A true/false question needs its expected value; other kinds must not carry one.
    pub fn check_shape(&self) -> Result<(), AppError> {
        check_correct_value(self.kind, self.correct_value)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: Option<String>,
    pub kind: Option<QuestionKind>,
    pub correct_value: Option<bool>,
}

pub fn check_correct_value(kind: QuestionKind, correct_value: Option<bool>) -> Result<(), AppError> {
    match (kind, correct_value) {
        (QuestionKind::TrueFalse, None) => Err(AppError::BadRequest(
            "correct_value is required for true_false questions".to_string(),
        )),
        (QuestionKind::MultipleChoice | QuestionKind::FreeText, Some(_)) => Err(AppError::BadRequest(
            "correct_value is only allowed on true_false questions".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnswerRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAnswerRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: Option<String>,
    pub is_correct: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_false_requires_expected_value() {
        assert!(check_correct_value(QuestionKind::TrueFalse, None).is_err());
        assert!(check_correct_value(QuestionKind::TrueFalse, Some(false)).is_ok());
    }

    #[test]
    fn other_kinds_reject_expected_value() {
        assert!(check_correct_value(QuestionKind::MultipleChoice, Some(true)).is_err());
        assert!(check_correct_value(QuestionKind::FreeText, None).is_ok());
    }

    #[test]
    fn public_view_hides_answer_key() {
        let full = QuestionWithAnswers {
            question: Question {
                id: 3,
                quiz_id: 1,
                prompt: "Which keyword moves a value?".to_string(),
                kind: QuestionKind::MultipleChoice,
                correct_value: None,
                created_at: chrono::Utc::now(),
            },
            answers: vec![Answer {
                id: 9,
                question_id: 3,
                text: "move".to_string(),
                is_correct: true,
            }],
        };
        let json = serde_json::to_value(PublicQuestion::from(full)).unwrap();
        assert_eq!(json["kind"], "multiple_choice");
        assert_eq!(json["answers"][0]["id"], 9);
        assert!(json["answers"][0].get("is_correct").is_none());
    }
}
