// src/handlers/payment.rs

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
    models::payment::{Payment, PaymentCheckResponse, RecordPaymentRequest},
    services::gate,
    utils::jwt::Claims,
};

/// Records a payment for a course the caller is enrolled in.
#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = CREATED, body = Payment, description = "Payment stored, enrollment marked paid"),
        (status = FORBIDDEN, description = "Not a learner, or not enrolled"),
        (status = CONFLICT, description = "Transaction id already used"),
        (status = UNPROCESSABLE_ENTITY, description = "Negative amount or malformed transaction id"),
    ),
    tag = "payment",
    security(("token" = []))
)]
pub async fn record_payment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let payment = gate::record_payment(&pool, &claims, &payload).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/payments/check/{course_id}",
    params(("course_id" = i64, Path, description = "Course id")),
    responses(
        (status = OK, body = PaymentCheckResponse, description = "Payment state of the caller's enrollment"),
        (status = FORBIDDEN, description = "Not enrolled"),
    ),
    tag = "payment",
    security(("token" = []))
)]
pub async fn check_payment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(gate::payment_status(&pool, &claims, course_id).await?))
}
