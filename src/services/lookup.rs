// src/services/lookup.rs

use std::collections::HashMap;

use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::{
    error::AppError,
    models::{
        course::Course,
        enrollment::Enrollment,
        question::{Answer, Question, QuestionWithAnswers},
        quiz::Quiz,
    },
    utils::jwt::Claims,
};

pub async fn find_course<'e, E>(executor: E, course_id: i64) -> Result<Course, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
}

pub async fn find_quiz<'e, E>(executor: E, quiz_id: i64) -> Result<Quiz, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
}

/// The quiz whose window a course controls: lowest position, then lowest id.
pub async fn course_quiz<'e, E>(executor: E, course_id: i64) -> Result<Quiz, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Quiz>(
        "SELECT * FROM quizzes WHERE course_id = ? ORDER BY position ASC, id ASC LIMIT 1",
    )
    .bind(course_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound("No quiz found for this course".to_string()))
}

pub async fn find_enrollment<'e, E>(
    executor: E,
    user_id: i64,
    course_id: i64,
) -> Result<Option<Enrollment>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let enrollment = sqlx::query_as::<_, Enrollment>(
        "SELECT * FROM enrollments WHERE user_id = ? AND course_id = ?",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await?;

    Ok(enrollment)
}

/// Loads every question of a quiz together with its answer choices,
/// ordered by question id.
pub async fn load_questions(
    conn: &mut SqliteConnection,
    quiz_id: i64,
) -> Result<Vec<QuestionWithAnswers>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT * FROM questions WHERE quiz_id = ? ORDER BY id ASC",
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT a.* FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE q.quiz_id = ?
        ORDER BY a.id ASC
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_question: HashMap<i64, Vec<Answer>> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id).or_default().push(answer);
    }

    Ok(questions
        .into_iter()
        .map(|question| {
            let answers = by_question.remove(&question.id).unwrap_or_default();
            QuestionWithAnswers { question, answers }
        })
        .collect())
}

/// Course owner check for instructor-only actions (open window, certify).
pub fn ensure_owner(course: &Course, instructor_id: i64) -> Result<(), AppError> {
    if course.instructor_id != instructor_id {
        return Err(AppError::Forbidden(
            "You are not the instructor of this course".to_string(),
        ));
    }
    Ok(())
}

/// Content editing is open to the owning instructor and to admins.
pub fn ensure_can_manage(course: &Course, caller: &Claims) -> Result<(), AppError> {
    if caller.is_admin() {
        return Ok(());
    }
    ensure_owner(course, caller.user_id()?)
}
