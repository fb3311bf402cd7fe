// src/handlers/enrollment.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        certificate::CertificateView,
        enrollment::{CertifyResponse, EnrollRequest, Enrollment},
    },
    services::gate,
    utils::jwt::Claims,
};

#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = EnrollRequest,
    responses(
        (status = CREATED, body = Enrollment, description = "Enrollment created, unpaid"),
        (status = NOT_FOUND, description = "Course not found"),
        (status = CONFLICT, description = "Already enrolled"),
    ),
    tag = "enrollment",
    security(("token" = []))
)]
pub async fn enroll(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EnrollRequest>,
) -> Result<impl IntoResponse, AppError> {
    let enrollment = gate::enroll(&pool, &claims, payload.course_id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/check/{course_id}",
    params(("course_id" = i64, Path, description = "Course id")),
    responses((status = OK, description = "`{\"is_enrolled\": bool}`")),
    tag = "enrollment",
    security(("token" = []))
)]
pub async fn check_enrollment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let is_enrolled = gate::is_enrolled(&pool, &claims, course_id).await?;
    Ok(Json(json!({ "is_enrolled": is_enrolled })))
}

#[utoipa::path(
    get,
    path = "/api/enrollments",
    responses((status = OK, body = Vec<Enrollment>, description = "The caller's enrollments")),
    tag = "enrollment",
    security(("token" = []))
)]
pub async fn my_enrollments(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(gate::my_enrollments(&pool, &claims).await?))
}

/// Certifies a learner of the caller's course.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/certify/{learner_id}",
    params(
        ("id" = i64, Path, description = "Course id"),
        ("learner_id" = i64, Path, description = "User id of the learner"),
    ),
    responses(
        (status = OK, body = CertifyResponse, description = "Certified, or already certified"),
        (status = FORBIDDEN, description = "Caller is not the owning instructor"),
        (status = NOT_FOUND, description = "Course or enrollment not found"),
        (status = PRECONDITION_FAILED, description = "Learner has not passed the quiz"),
    ),
    tag = "enrollment",
    security(("token" = []))
)]
pub async fn certify(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((course_id, learner_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let response = gate::certify(&pool, &claims, course_id, learner_id, Utc::now()).await?;
    Ok(Json(response))
}

/// Certificates issued to the caller.
pub async fn my_certificates(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let certificates = sqlx::query_as::<_, CertificateView>(
        r#"
        SELECT c.id, c.course_id, co.title AS course_title, c.issued_at
        FROM certificates c
        JOIN courses co ON co.id = c.course_id
        WHERE c.user_id = ?
        ORDER BY c.issued_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(certificates))
}
