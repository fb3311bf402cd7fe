// src/handlers/lesson.rs

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
    models::lesson::{CreateLessonRequest, Lesson, UpdateLessonRequest},
    services::{gate, lookup},
    utils::{html::clean_html, jwt::Claims},
};

async fn find_lesson(pool: &SqlitePool, id: i64) -> Result<Lesson, AppError> {
    sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))
}

/// Lessons of a course in display order. Behind the access gate.
pub async fn list_lessons(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = lookup::find_course(&pool, course_id).await?;
    gate::ensure_content_access(&pool, &claims, &course).await?;

    let lessons = sqlx::query_as::<_, Lesson>(
        "SELECT * FROM lessons WHERE course_id = ? ORDER BY position ASC, id ASC",
    )
    .bind(course_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(lessons))
}

pub async fn create_lesson(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let course = lookup::find_course(&pool, course_id).await?;
    lookup::ensure_can_manage(&course, &claims)?;

    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
        INSERT INTO lessons (course_id, title, content, position)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(course_id)
    .bind(payload.title.trim())
    .bind(clean_html(&payload.content))
    .bind(payload.position)
    .fetch_one(&pool)
    .await?;

    tracing::info!(course_id, lesson_id = lesson.id, "Lesson created");
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn get_lesson(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = find_lesson(&pool, id).await?;
    let course = lookup::find_course(&pool, lesson.course_id).await?;
    gate::ensure_content_access(&pool, &claims, &course).await?;

    Ok(Json(lesson))
}

pub async fn update_lesson(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let lesson = find_lesson(&pool, id).await?;
    let course = lookup::find_course(&pool, lesson.course_id).await?;
    lookup::ensure_can_manage(&course, &claims)?;

    let updated = sqlx::query_as::<_, Lesson>(
        r#"
        UPDATE lessons
        SET title = COALESCE(?, title),
            content = COALESCE(?, content),
            position = COALESCE(?, position)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(payload.title.as_deref().map(str::trim))
    .bind(payload.content.as_deref().map(clean_html))
    .bind(payload.position)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_lesson(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = find_lesson(&pool, id).await?;
    let course = lookup::find_course(&pool, lesson.course_id).await?;
    lookup::ensure_can_manage(&course, &claims)?;

    sqlx::query("DELETE FROM lessons WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!(lesson_id = id, course_id = course.id, "Lesson deleted");
    Ok(StatusCode::NO_CONTENT)
}
