// src/models/enrollment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Enrolled, not paid yet.
    Pending,
    /// Payment recorded.
    Validated,
    /// Certified by the instructor.
    Completed,
}

/// Represents the 'enrollments' table: links a learner to a course and
/// carries the payment and pass/certification flags.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub status: EnrollmentStatus,
    pub is_paid: bool,
    /// NULL until the learner submits the quiz once.
    pub has_passed_quiz: Option<bool>,
    /// Score of the latest submission.
    pub score: Option<f64>,
    /// Only ever set after `has_passed_quiz` was true.
    pub certified: bool,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn has_passed(&self) -> bool {
        self.has_passed_quiz.unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrollRequest {
    pub course_id: i64,
}

/// One line of an instructor's roster.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: i64,
    pub user: UserSummary,
    pub status: EnrollmentStatus,
    pub is_paid: bool,
    pub has_passed_quiz: Option<bool>,
    /// Score of the most recent attempt, if any.
    pub score: Option<f64>,
    pub is_active_in_quiz: bool,
    pub certified: bool,
}

/// Flat row behind `RosterEntry`.
#[derive(Debug, FromRow)]
pub struct RosterRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub status: EnrollmentStatus,
    pub is_paid: bool,
    pub has_passed_quiz: Option<bool>,
    pub certified: bool,
    pub latest_score: Option<f64>,
    pub latest_active: Option<bool>,
}

impl From<RosterRow> for RosterEntry {
    fn from(row: RosterRow) -> Self {
        Self {
            id: row.id,
            user: UserSummary {
                id: row.user_id,
                name: row.name,
                email: row.email,
            },
            status: row.status,
            is_paid: row.is_paid,
            has_passed_quiz: row.has_passed_quiz,
            score: row.latest_score,
            is_active_in_quiz: row.latest_active.unwrap_or(false),
            certified: row.certified,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CertifyResponse {
    pub message: String,
    pub certified: bool,
    pub already_certified: bool,
}
