// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'quiz_attempts' table: one learner's participation in a
/// quiz window.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub quiz_id: i64,
    /// Once false, never true again.
    pub is_active: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Percentage with two decimals; NULL when closed by expiry.
    pub score: Option<f64>,
}

/// One item of a submission. Which field is read depends on the kind of the
/// referenced question.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    /// Chosen answer for multiple-choice questions.
    pub answer_id: Option<i64>,
    /// Chosen value for true/false questions.
    pub true_false: Option<bool>,
    /// Free-text response.
    pub text: Option<String>,
}

/// Body of `POST /api/quiz/{id}/submit`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, message = "At least one answer must be submitted."))]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitQuizResponse {
    pub score: f64,
    #[serde(rename = "hasPassedQuiz")]
    pub has_passed_quiz: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartAttemptResponse {
    pub message: String,
    pub attempt_id: i64,
    pub remaining_time: i64,
}
