// src/models/quiz.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
///
/// `started_at` and `duration_minutes` describe the timed window; they are
/// either both NULL (never opened) or both set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// `None` until an instructor opens the window for the first time.
    pub fn window(&self) -> Option<QuizWindow> {
        match (self.started_at, self.duration_minutes) {
            (Some(started_at), Some(duration_minutes)) => Some(QuizWindow {
                started_at,
                duration_minutes,
            }),
            _ => None,
        }
    }

    pub fn window_status(&self, now: DateTime<Utc>) -> WindowStatus {
        self.window()
            .map_or(WindowStatus::NotStarted, |w| w.status_at(now))
    }
}

/// Time interval during which a quiz accepts submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizWindow {
    pub started_at: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    NotStarted,
    Open { remaining_seconds: i64 },
    Expired { deadline: DateTime<Utc> },
}

impl QuizWindow {
    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(self.duration_minutes)
    }

    /// Open iff `now < started_at + duration`.
    pub fn status_at(&self, now: DateTime<Utc>) -> WindowStatus {
        let deadline = self.deadline();
        if now < deadline {
            WindowStatus::Open {
                remaining_seconds: (deadline - now).num_seconds().max(0),
            }
        } else {
            WindowStatus::Expired { deadline }
        }
    }
}

impl WindowStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, WindowStatus::Open { .. })
    }

    pub fn remaining_seconds(&self) -> i64 {
        match self {
            WindowStatus::Open { remaining_seconds } => *remaining_seconds,
            _ => 0,
        }
    }
}

/// DTO for creating a quiz inside a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 0))]
    pub position: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(range(min = 0))]
    pub position: Option<i64>,
}

/// Body of `POST /api/courses/{id}/start-quiz`.
/// The upper bound mirrors `config::MAX_QUIZ_DURATION_MINUTES`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartQuizRequest {
    /// Window length in minutes.
    #[validate(range(
        min = 1,
        max = 1440,
        message = "Duration must be between 1 minute and one day."
    ))]
    pub duration: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartQuizResponse {
    pub message: String,
    pub quiz_id: i64,
    /// Seconds until the deadline, `duration * 60` right after opening.
    pub remaining_time: i64,
}

/// Polled by clients every few seconds; advisory only.
#[derive(Debug, Serialize, ToSchema)]
pub struct WindowStatusResponse {
    pub quiz_started: bool,
    pub remaining_time: i64,
}

impl From<WindowStatus> for WindowStatusResponse {
    fn from(status: WindowStatus) -> Self {
        Self {
            quiz_started: status.is_open(),
            remaining_time: status.remaining_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_QUIZ_DURATION_MINUTES;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 19, 10, 0, 0).unwrap()
    }

    fn window(minutes: i64) -> QuizWindow {
        QuizWindow {
            started_at: t0(),
            duration_minutes: minutes,
        }
    }

    #[test]
    fn freshly_opened_window_reports_full_duration() {
        for minutes in [1, 5, 90, MAX_QUIZ_DURATION_MINUTES] {
            let status = window(minutes).status_at(t0());
            assert_eq!(status, WindowStatus::Open { remaining_seconds: minutes * 60 });
        }
    }

    #[test]
    fn remaining_time_counts_down() {
        let status = window(1).status_at(t0() + Duration::seconds(10));
        assert_eq!(status.remaining_seconds(), 50);
        assert!(status.is_open());
    }

    #[test]
    fn deadline_itself_is_closed() {
        let w = window(1);
        let status = w.status_at(w.deadline());
        assert_eq!(status, WindowStatus::Expired { deadline: w.deadline() });
        assert_eq!(status.remaining_seconds(), 0);
        assert!(!status.is_open());
    }

    #[test]
    fn partial_second_rounds_down() {
        let status = window(1).status_at(t0() + Duration::milliseconds(59_500));
        assert_eq!(status, WindowStatus::Open { remaining_seconds: 0 });
    }

    #[test]
    fn quiz_without_window_is_not_started() {
        let quiz = Quiz {
            id: 1,
            course_id: 1,
            title: "Final".to_string(),
            position: 0,
            started_at: None,
            duration_minutes: None,
            created_at: t0(),
        };
        assert_eq!(quiz.window_status(t0()), WindowStatus::NotStarted);
        let response = WindowStatusResponse::from(quiz.window_status(t0()));
        assert!(!response.quiz_started);
        assert_eq!(response.remaining_time, 0);
    }

    #[test]
    fn duration_bounds_are_validated() {
        assert!(StartQuizRequest { duration: 0 }.validate().is_err());
        assert!(StartQuizRequest { duration: -5 }.validate().is_err());
        assert!(StartQuizRequest { duration: MAX_QUIZ_DURATION_MINUTES + 1 }.validate().is_err());
        assert!(StartQuizRequest { duration: 30 }.validate().is_ok());
    }
}
