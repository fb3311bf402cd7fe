// src/handlers/quiz.rs

//! Quiz authoring: quizzes of a course, their questions and the answer
//! choices of multiple-choice questions.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::Course,
        question::{
            Answer, CreateAnswerRequest, CreateQuestionRequest, PublicQuestion, Question, QuestionKind,
            UpdateAnswerRequest, UpdateQuestionRequest, check_correct_value,
        },
        quiz::{CreateQuizRequest, Quiz, UpdateQuizRequest},
    },
    services::{
        gate::{self, ContentAccess},
        lookup,
    },
    utils::jwt::Claims,
};

async fn find_question(pool: &SqlitePool, id: i64) -> Result<Question, AppError> {
    sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))
}

async fn find_answer(pool: &SqlitePool, id: i64) -> Result<Answer, AppError> {
    sqlx::query_as::<_, Answer>("SELECT * FROM answers WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))
}

/// Resolves the course a quiz belongs to and checks the caller may edit it.
async fn managed_course(pool: &SqlitePool, claims: &Claims, quiz_id: i64) -> Result<Course, AppError> {
    let quiz = lookup::find_quiz(pool, quiz_id).await?;
    let course = lookup::find_course(pool, quiz.course_id).await?;
    lookup::ensure_can_manage(&course, claims)?;
    Ok(course)
}

pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    lookup::find_course(&pool, course_id).await?;

    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT * FROM quizzes WHERE course_id = ? ORDER BY position ASC, id ASC",
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(quizzes))
}

pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let course = lookup::find_course(&pool, course_id).await?;
    lookup::ensure_can_manage(&course, &claims)?;

    let quiz = sqlx::query_as::<_, Quiz>(
        "INSERT INTO quizzes (course_id, title, position) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(course_id)
    .bind(payload.title.trim())
    .bind(payload.position)
    .fetch_one(&pool)
    .await?;

    tracing::info!(course_id, quiz_id = quiz.id, "Quiz created");
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Title and position only; the window columns belong to start-quiz.
pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    managed_course(&pool, &claims, id).await?;

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        UPDATE quizzes
        SET title = COALESCE(?, title), position = COALESCE(?, position)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(payload.title.as_deref().map(str::trim))
    .bind(payload.position)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(quiz))
}

pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = managed_course(&pool, &claims, id).await?;

    sqlx::query("DELETE FROM quizzes WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!(quiz_id = id, course_id = course.id, "Quiz deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Questions of a quiz.
///
/// The owning instructor (or an admin) gets the answer key; an enrolled and
/// paid learner gets the prompts and choices only.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = lookup::find_quiz(&pool, quiz_id).await?;
    let course = lookup::find_course(&pool, quiz.course_id).await?;
    let access = gate::ensure_content_access(&pool, &claims, &course).await?;

    let mut conn = pool.acquire().await?;
    let questions = lookup::load_questions(&mut *conn, quiz_id).await?;

    let response = match access {
        ContentAccess::Manage => Json(questions).into_response(),
        ContentAccess::Learn => {
            let public: Vec<PublicQuestion> = questions.into_iter().map(PublicQuestion::from).collect();
            Json(public).into_response()
        }
    };

    Ok(response)
}

pub async fn create_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.check_shape()?;
    managed_course(&pool, &claims, quiz_id).await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (quiz_id, prompt, kind, correct_value)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(quiz_id)
    .bind(payload.prompt.trim())
    .bind(payload.kind)
    .bind(payload.correct_value)
    .fetch_one(&pool)
    .await?;

    tracing::info!(quiz_id, question_id = question.id, "Question created");
    Ok((StatusCode::CREATED, Json(question)))
}

/// Changing the kind away from multiple choice drops the answer choices.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let question = find_question(&pool, id).await?;
    managed_course(&pool, &claims, question.quiz_id).await?;

    let kind = payload.kind.unwrap_or(question.kind);
    let correct_value = match (payload.correct_value, kind) {
        (Some(value), _) => Some(value),
        (None, QuestionKind::TrueFalse) => question.correct_value,
        (None, _) => None,
    };
    check_correct_value(kind, correct_value)?;

    let mut tx = pool.begin().await?;

    let updated = sqlx::query_as::<_, Question>(
        r#"
        UPDATE questions
        SET prompt = COALESCE(?, prompt), kind = ?, correct_value = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(payload.prompt.as_deref().map(str::trim))
    .bind(kind)
    .bind(correct_value)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if kind != QuestionKind::MultipleChoice {
        sqlx::query("DELETE FROM answers WHERE question_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Json(updated))
}

pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = find_question(&pool, id).await?;
    managed_course(&pool, &claims, question.quiz_id).await?;

    sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Json(payload): Json<CreateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let question = find_question(&pool, question_id).await?;
    managed_course(&pool, &claims, question.quiz_id).await?;

    if question.kind != QuestionKind::MultipleChoice {
        return Err(AppError::BadRequest(
            "Answer choices can only be added to multiple_choice questions".to_string(),
        ));
    }

    let answer = sqlx::query_as::<_, Answer>(
        "INSERT INTO answers (question_id, text, is_correct) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(question_id)
    .bind(payload.text.trim())
    .bind(payload.is_correct)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(answer)))
}

pub async fn update_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let answer = find_answer(&pool, id).await?;
    let question = find_question(&pool, answer.question_id).await?;
    managed_course(&pool, &claims, question.quiz_id).await?;

    let updated = sqlx::query_as::<_, Answer>(
        r#"
        UPDATE answers
        SET text = COALESCE(?, text), is_correct = COALESCE(?, is_correct)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(payload.text.as_deref().map(str::trim))
    .bind(payload.is_correct)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let answer = find_answer(&pool, id).await?;
    let question = find_question(&pool, answer.question_id).await?;
    managed_course(&pool, &claims, question.quiz_id).await?;

    sqlx::query("DELETE FROM answers WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
