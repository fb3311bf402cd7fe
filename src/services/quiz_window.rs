// src/services/quiz_window.rs

//! Start/stop/expiry of a course's timed quiz window and the attempts that
//! live inside it.
//!
//! There is no background job: expiry is evaluated lazily whenever the
//! status is polled, a learner starts, or a learner submits. Every function
//! takes `now` so callers (and tests) decide the clock.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, StartAttemptResponse, SubmitQuizRequest, SubmitQuizResponse},
        quiz::{StartQuizResponse, WindowStatus},
        user::Role,
    },
    services::{grading, lookup},
    utils::jwt::Claims,
};

/// Opens (or re-opens) the window of the course's quiz.
///
/// Re-opening an open window overwrites its deadline; the last call wins.
/// Every enrolled learner ends up with exactly one active attempt.
pub async fn open(
    pool: &SqlitePool,
    caller: &Claims,
    course_id: i64,
    duration_minutes: i64,
    now: DateTime<Utc>,
) -> Result<StartQuizResponse, AppError> {
    let instructor_id = caller.require_role(Role::Instructor)?;
    let course = lookup::find_course(pool, course_id).await?;
    lookup::ensure_owner(&course, instructor_id)?;

    let mut tx = pool.begin().await?;
    let quiz = lookup::course_quiz(&mut *tx, course_id).await?;

    // Attempts left active by a previous, already expired window are closed
    // first so they are not carried into the new one.
    if let WindowStatus::Expired { deadline } = quiz.window_status(now) {
        close_active_attempts(&mut *tx, quiz.id, deadline).await?;
    }

    sqlx::query("UPDATE quizzes SET started_at = ?, duration_minutes = ? WHERE id = ?")
        .bind(now)
        .bind(duration_minutes)
        .bind(quiz.id)
        .execute(&mut *tx)
        .await?;

    let created = sqlx::query(
        r#"
        INSERT INTO quiz_attempts (user_id, course_id, quiz_id, is_active, started_at)
        SELECT e.user_id, e.course_id, ?, 1, ?
        FROM enrollments e
        WHERE e.course_id = ?
          AND NOT EXISTS (
            SELECT 1 FROM quiz_attempts a
            WHERE a.user_id = e.user_id AND a.quiz_id = ? AND a.is_active = 1
          )
        "#,
    )
    .bind(quiz.id)
    .bind(now)
    .bind(course_id)
    .bind(quiz.id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::info!(
        course_id,
        quiz_id = quiz.id,
        duration_minutes,
        attempts_created = created,
        "Quiz window opened"
    );

    Ok(StartQuizResponse {
        message: "Quiz started".to_string(),
        quiz_id: quiz.id,
        remaining_time: duration_minutes * 60,
    })
}

/// Current state of the course's quiz window.
///
/// When the window has expired, still-active attempts are closed as a side
/// effect (their score stays NULL).
pub async fn status(
    pool: &SqlitePool,
    course_id: i64,
    now: DateTime<Utc>,
) -> Result<WindowStatus, AppError> {
    lookup::find_course(pool, course_id).await?;
    let quiz = lookup::course_quiz(pool, course_id).await?;

    let status = quiz.window_status(now);
    if let WindowStatus::Expired { deadline } = status {
        close_active_attempts(pool, quiz.id, deadline).await?;
    }

    Ok(status)
}

/// Lets an enrolled, paid learner join the open window.
/// Repeated calls return the same active attempt.
pub async fn start_for_learner(
    pool: &SqlitePool,
    caller: &Claims,
    course_id: i64,
    now: DateTime<Utc>,
) -> Result<StartAttemptResponse, AppError> {
    let learner_id = caller.require_role(Role::Learner)?;
    lookup::find_course(pool, course_id).await?;
    let quiz = lookup::course_quiz(pool, course_id).await?;

    let enrollment = lookup::find_enrollment(pool, learner_id, course_id).await?;
    if !enrollment.is_some_and(|e| e.is_paid) {
        return Err(AppError::Forbidden(
            "You must be enrolled and have paid to start this quiz".to_string(),
        ));
    }

    let remaining_seconds = match quiz.window_status(now) {
        WindowStatus::NotStarted => {
            return Err(AppError::PreconditionFailed(
                "The quiz has not been started by the instructor yet".to_string(),
            ));
        }
        WindowStatus::Expired { deadline } => {
            close_active_attempts(pool, quiz.id, deadline).await?;
            return Err(AppError::PreconditionFailed(
                "The time for this quiz has expired".to_string(),
            ));
        }
        WindowStatus::Open { remaining_seconds } => remaining_seconds,
    };

    let attempt_id = match active_attempt(pool, learner_id, quiz.id).await? {
        Some(attempt) => attempt.id,
        None => {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO quiz_attempts (user_id, course_id, quiz_id, is_active, started_at)
                VALUES (?, ?, ?, 1, ?)
                RETURNING id
                "#,
            )
            .bind(learner_id)
            .bind(course_id)
            .bind(quiz.id)
            .bind(now)
            .fetch_one(pool)
            .await?;
            id
        }
    };

    tracing::info!(learner_id, quiz_id = quiz.id, attempt_id, "Quiz started for learner");

    Ok(StartAttemptResponse {
        message: "Quiz started for learner".to_string(),
        attempt_id,
        remaining_time: remaining_seconds,
    })
}

/// Grades and closes the learner's active attempt.
///
/// The window is checked again here; this is the authoritative check; the
/// client's countdown is not. A late submission closes the attempt without a
/// score and is rejected.
pub async fn submit(
    pool: &SqlitePool,
    caller: &Claims,
    quiz_id: i64,
    req: &SubmitQuizRequest,
    now: DateTime<Utc>,
) -> Result<SubmitQuizResponse, AppError> {
    let learner_id = caller.require_role(Role::Learner)?;
    let quiz = lookup::find_quiz(pool, quiz_id).await?;

    let enrollment = lookup::find_enrollment(pool, learner_id, quiz.course_id).await?;
    if !enrollment.is_some_and(|e| e.is_paid) {
        return Err(AppError::Forbidden(
            "You must be enrolled and have paid to submit this quiz".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let attempt = active_attempt(&mut *tx, learner_id, quiz.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No active attempt found for this quiz".to_string()))?;

    match quiz.window_status(now) {
        WindowStatus::NotStarted => {
            return Err(AppError::PreconditionFailed(
                "The quiz has not been started by the instructor yet".to_string(),
            ));
        }
        WindowStatus::Expired { deadline } => {
            sqlx::query(
                "UPDATE quiz_attempts SET is_active = 0, completed_at = ? WHERE id = ? AND is_active = 1",
            )
            .bind(deadline)
            .bind(attempt.id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            tracing::warn!(learner_id, quiz_id, attempt_id = attempt.id, "Late submission rejected");
            return Err(AppError::PreconditionFailed(
                "The time for this quiz has expired".to_string(),
            ));
        }
        WindowStatus::Open { .. } => {}
    }

    let questions = lookup::load_questions(&mut *tx, quiz.id).await?;
    let grade = grading::grade(&questions, &req.answers);

    let closed = sqlx::query(
        r#"
        UPDATE quiz_attempts
        SET is_active = 0, completed_at = ?, score = ?
        WHERE id = ? AND is_active = 1
        "#,
    )
    .bind(now)
    .bind(grade.score)
    .bind(attempt.id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if closed == 0 {
        // Closed by a concurrent request between the read and this write.
        return Err(AppError::NotFound(
            "No active attempt found for this quiz".to_string(),
        ));
    }

    for answer in &grade.answers {
        sqlx::query(
            r#"
            INSERT INTO attempt_answers (attempt_id, question_id, answer_id, true_false, text, is_correct)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.id)
        .bind(answer.question_id)
        .bind(answer.answer_id)
        .bind(answer.true_false)
        .bind(answer.text.as_deref())
        .bind(answer.is_correct)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "UPDATE enrollments SET has_passed_quiz = ?, score = ? WHERE user_id = ? AND course_id = ?",
    )
    .bind(grade.passed)
    .bind(grade.score)
    .bind(learner_id)
    .bind(quiz.course_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        learner_id,
        quiz_id,
        attempt_id = attempt.id,
        score = grade.score,
        correct = grade.correct_count,
        total = grade.total_questions,
        "Quiz submitted"
    );

    Ok(SubmitQuizResponse {
        score: grade.score,
        has_passed_quiz: grade.passed,
    })
}

async fn active_attempt<'e, E>(
    executor: E,
    learner_id: i64,
    quiz_id: i64,
) -> Result<Option<Attempt>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let attempt = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT * FROM quiz_attempts
        WHERE user_id = ? AND quiz_id = ? AND is_active = 1
        ORDER BY started_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(learner_id)
    .bind(quiz_id)
    .fetch_optional(executor)
    .await?;

    Ok(attempt)
}

async fn close_active_attempts<'e, E>(
    executor: E,
    quiz_id: i64,
    deadline: DateTime<Utc>,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let closed = sqlx::query(
        "UPDATE quiz_attempts SET is_active = 0, completed_at = ? WHERE quiz_id = ? AND is_active = 1",
    )
    .bind(deadline)
    .bind(quiz_id)
    .execute(executor)
    .await?
    .rows_affected();

    if closed > 0 {
        tracing::info!(quiz_id, closed, "Closed attempts of expired quiz window");
    }

    Ok(closed)
}
