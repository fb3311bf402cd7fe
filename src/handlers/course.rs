// src/handlers/course.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        course::{Course, CreateCourseRequest, UpdateCourseRequest},
        enrollment::{RosterEntry, RosterRow},
        user::Role,
    },
    services::lookup,
    utils::{html::clean_html, jwt::Claims},
};

/// Public catalogue, newest first.
pub async fn list_courses(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let courses = sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY created_at DESC, id DESC")
        .fetch_all(&pool)
        .await?;

    Ok(Json(courses))
}

pub async fn get_course(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(lookup::find_course(&pool, id).await?))
}

/// Courses owned by the calling instructor.
pub async fn my_courses(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let instructor_id = claims.require_role(Role::Instructor)?;

    let courses = sqlx::query_as::<_, Course>(
        "SELECT * FROM courses WHERE instructor_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(instructor_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(courses))
}

pub async fn create_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let instructor_id = claims.require_role(Role::Instructor)?;
    payload.validate()?;

    let course = sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses (title, description, category, price, duration_hours, image_url, instructor_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(payload.title.trim())
    .bind(clean_html(&payload.description))
    .bind(payload.category)
    .bind(payload.price)
    .bind(payload.duration_hours)
    .bind(payload.image_url)
    .bind(instructor_id)
    .fetch_one(&pool)
    .await?;

    tracing::info!(course_id = course.id, instructor_id, "Course created");
    Ok((StatusCode::CREATED, Json(course)))
}

/// Partial update: only the fields present in the body are written.
pub async fn update_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let course = lookup::find_course(&pool, id).await?;
    lookup::ensure_can_manage(&course, &claims)?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE courses SET ");
    let mut separated = builder.separated(", ");
    let mut changed = false;

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title.trim().to_string());
        changed = true;
    }
    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(clean_html(&description));
        changed = true;
    }
    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
        changed = true;
    }
    if let Some(price) = payload.price {
        separated.push("price = ");
        separated.push_bind_unseparated(price);
        changed = true;
    }
    if let Some(duration_hours) = payload.duration_hours {
        separated.push("duration_hours = ");
        separated.push_bind_unseparated(duration_hours);
        changed = true;
    }
    if let Some(image_url) = payload.image_url {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image_url);
        changed = true;
    }

    if !changed {
        return Ok(Json(course));
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");

    let updated: Course = builder.build_query_as().fetch_one(&pool).await?;

    tracing::info!(course_id = id, "Course updated");
    Ok(Json(updated))
}

pub async fn delete_course(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = lookup::find_course(&pool, id).await?;
    lookup::ensure_can_manage(&course, &claims)?;

    sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!(course_id = id, "Course deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Instructor roster: every enrollment of the course with the state of the
/// learner's most recent attempt.
pub async fn list_learners(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = lookup::find_course(&pool, id).await?;
    lookup::ensure_can_manage(&course, &claims)?;

    let rows = sqlx::query_as::<_, RosterRow>(
        r#"
        SELECT
            e.id, e.user_id, u.name, u.email, e.status, e.is_paid,
            e.has_passed_quiz, e.certified,
            (SELECT a.score FROM quiz_attempts a
             WHERE a.user_id = e.user_id AND a.course_id = e.course_id
             ORDER BY a.started_at DESC, a.id DESC LIMIT 1) AS latest_score,
            (SELECT a.is_active FROM quiz_attempts a
             WHERE a.user_id = e.user_id AND a.course_id = e.course_id
             ORDER BY a.started_at DESC, a.id DESC LIMIT 1) AS latest_active
        FROM enrollments e
        JOIN users u ON u.id = e.user_id
        WHERE e.course_id = ?
        ORDER BY u.name ASC, e.id ASC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let roster: Vec<RosterEntry> = rows.into_iter().map(RosterEntry::from).collect();
    Ok(Json(roster))
}
