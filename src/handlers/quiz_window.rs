// src/handlers/quiz_window.rs

//! HTTP surface of the timed quiz window. The handlers only extract the
//! request, read the clock and delegate to `services::quiz_window`.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{StartAttemptResponse, SubmitQuizRequest, SubmitQuizResponse},
        quiz::{StartQuizRequest, StartQuizResponse, WindowStatusResponse},
    },
    services::quiz_window,
    utils::jwt::Claims,
};

/// Opens the course's quiz window for `duration` minutes.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/start-quiz",
    params(("id" = i64, Path, description = "Course id")),
    request_body = StartQuizRequest,
    responses(
        (status = OK, body = StartQuizResponse, description = "Window opened; every enrolled learner has an active attempt"),
        (status = FORBIDDEN, description = "Caller is not the owning instructor"),
        (status = NOT_FOUND, description = "Course or quiz not found"),
        (status = UNPROCESSABLE_ENTITY, description = "Duration outside 1..=1440"),
    ),
    tag = "quiz-window",
    security(("token" = []))
)]
pub async fn start_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = quiz_window::open(&pool, &claims, course_id, payload.duration, Utc::now()).await?;
    Ok(Json(response))
}

/// Polled by clients; closes leftover attempts once the window has expired.
#[utoipa::path(
    get,
    path = "/api/courses/{id}/can-start-quiz",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = OK, body = WindowStatusResponse, description = "Whether the window is open and the seconds left"),
        (status = NOT_FOUND, description = "Course or quiz not found"),
    ),
    tag = "quiz-window",
    security(("token" = []))
)]
pub async fn can_start_quiz(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let status = quiz_window::status(&pool, course_id, Utc::now()).await?;
    Ok(Json(WindowStatusResponse::from(status)))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/start-user-quiz",
    params(("id" = i64, Path, description = "Course id")),
    responses(
        (status = OK, body = StartAttemptResponse, description = "Active attempt of the caller"),
        (status = FORBIDDEN, description = "Not a learner, or not enrolled and paid"),
        (status = PRECONDITION_FAILED, description = "Window not started or expired"),
    ),
    tag = "quiz-window",
    security(("token" = []))
)]
pub async fn start_user_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let response = quiz_window::start_for_learner(&pool, &claims, course_id, Utc::now()).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/quiz/{id}/submit",
    params(("id" = i64, Path, description = "Quiz id")),
    request_body = SubmitQuizRequest,
    responses(
        (status = OK, body = SubmitQuizResponse, description = "Graded submission"),
        (status = NOT_FOUND, description = "Quiz or active attempt not found"),
        (status = PRECONDITION_FAILED, description = "Window not started or expired"),
        (status = UNPROCESSABLE_ENTITY, description = "No answers submitted"),
    ),
    tag = "quiz-window",
    security(("token" = []))
)]
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let response = quiz_window::submit(&pool, &claims, quiz_id, &payload, Utc::now()).await?;
    Ok(Json(response))
}
