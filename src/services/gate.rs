// src/services/gate.rs

//! Enrollment, payment and certification: the preconditions a learner must
//! satisfy before reaching course content and the quiz.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, conflict_on_unique},
    models::{
        course::Course,
        enrollment::{CertifyResponse, Enrollment, EnrollmentStatus},
        payment::{Payment, PaymentCheckResponse, PaymentStatus, RecordPaymentRequest},
        user::Role,
    },
    services::lookup,
    utils::jwt::Claims,
};

/// How a caller may use a course's lessons and quiz content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAccess {
    /// Owning instructor or admin: sees answer keys, may edit.
    Manage,
    /// Enrolled and paid learner.
    Learn,
}

pub async fn enroll(
    pool: &SqlitePool,
    caller: &Claims,
    course_id: i64,
) -> Result<Enrollment, AppError> {
    let learner_id = caller.require_role(Role::Learner)?;
    lookup::find_course(pool, course_id).await?;

    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments (user_id, course_id, status, is_paid, certified)
        VALUES (?, ?, ?, 0, 0)
        RETURNING *
        "#,
    )
    .bind(learner_id)
    .bind(course_id)
    .bind(EnrollmentStatus::Pending)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Already enrolled in this course"))?;

    tracing::info!(learner_id, course_id, enrollment_id = enrollment.id, "Learner enrolled");
    Ok(enrollment)
}

pub async fn is_enrolled(
    pool: &SqlitePool,
    caller: &Claims,
    course_id: i64,
) -> Result<bool, AppError> {
    let user_id = caller.user_id()?;
    Ok(lookup::find_enrollment(pool, user_id, course_id)
        .await?
        .is_some())
}

pub async fn my_enrollments(pool: &SqlitePool, caller: &Claims) -> Result<Vec<Enrollment>, AppError> {
    let user_id = caller.user_id()?;
    let enrollments = sqlx::query_as::<_, Enrollment>(
        "SELECT * FROM enrollments WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(enrollments)
}

/// Stores a payment and marks the learner's enrollment as paid.
///
/// Amount, method and transaction id are taken as supplied; the only
/// outside-world check is that the transaction id has not been used before.
pub async fn record_payment(
    pool: &SqlitePool,
    caller: &Claims,
    req: &RecordPaymentRequest,
) -> Result<Payment, AppError> {
    let learner_id = caller.require_role(Role::Learner)?;
    lookup::find_course(pool, req.course_id).await?;

    let mut tx = pool.begin().await?;

    if lookup::find_enrollment(&mut *tx, learner_id, req.course_id)
        .await?
        .is_none()
    {
        return Err(AppError::Forbidden(
            "You must be enrolled in this course before paying".to_string(),
        ));
    }

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (user_id, course_id, amount, method, status, transaction_id)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(learner_id)
    .bind(req.course_id)
    .bind(req.amount)
    .bind(req.method)
    .bind(PaymentStatus::Completed)
    .bind(&req.transaction_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_on_unique(e, "Transaction id has already been used"))?;

    // A certified (completed) enrollment keeps its status.
    sqlx::query(
        r#"
        UPDATE enrollments
        SET is_paid = 1,
            status = CASE WHEN status = 'pending' THEN 'validated' ELSE status END
        WHERE user_id = ? AND course_id = ?
        "#,
    )
    .bind(learner_id)
    .bind(req.course_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        learner_id,
        course_id = req.course_id,
        payment_id = payment.id,
        "Payment recorded"
    );
    Ok(payment)
}

pub async fn payment_status(
    pool: &SqlitePool,
    caller: &Claims,
    course_id: i64,
) -> Result<PaymentCheckResponse, AppError> {
    let user_id = caller.user_id()?;
    let enrollment = lookup::find_enrollment(pool, user_id, course_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("You are not enrolled in this course".to_string()))?;

    let message = if enrollment.is_paid {
        "Payment confirmed"
    } else {
        "Payment required to access this course"
    };

    Ok(PaymentCheckResponse {
        is_paid: enrollment.is_paid,
        message: message.to_string(),
    })
}

/// Certifies a learner who passed the course's quiz. Idempotent: a second
/// call reports `already_certified` and writes nothing.
pub async fn certify(
    pool: &SqlitePool,
    caller: &Claims,
    course_id: i64,
    learner_id: i64,
    now: DateTime<Utc>,
) -> Result<CertifyResponse, AppError> {
    let instructor_id = caller.require_role(Role::Instructor)?;
    let course = lookup::find_course(pool, course_id).await?;
    lookup::ensure_owner(&course, instructor_id)?;

    let mut tx = pool.begin().await?;

    let enrollment = lookup::find_enrollment(&mut *tx, learner_id, course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

    if enrollment.certified {
        return Ok(CertifyResponse {
            message: "Learner is already certified".to_string(),
            certified: true,
            already_certified: true,
        });
    }

    if !enrollment.has_passed() {
        tracing::debug!(learner_id, course_id, "Certification refused, quiz not passed");
        return Err(AppError::PreconditionFailed(
            "The learner has not passed the quiz".to_string(),
        ));
    }

    sqlx::query("UPDATE enrollments SET certified = 1, status = ? WHERE id = ?")
        .bind(EnrollmentStatus::Completed)
        .bind(enrollment.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO certificates (user_id, course_id, issued_at)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id, course_id) DO NOTHING
        "#,
    )
    .bind(learner_id)
    .bind(course_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(learner_id, course_id, instructor_id, "Learner certified");
    Ok(CertifyResponse {
        message: "Learner certified".to_string(),
        certified: true,
        already_certified: false,
    })
}

/// The access gate in front of lessons and quiz content.
pub async fn ensure_content_access(
    pool: &SqlitePool,
    caller: &Claims,
    course: &Course,
) -> Result<ContentAccess, AppError> {
    let user_id = caller.user_id()?;
    if caller.is_admin() || course.instructor_id == user_id {
        return Ok(ContentAccess::Manage);
    }

    let paid = lookup::find_enrollment(pool, user_id, course.id)
        .await?
        .is_some_and(|e| e.is_paid);
    if caller.role == Role::Learner && paid {
        return Ok(ContentAccess::Learn);
    }

    Err(AppError::Forbidden(
        "Enroll and pay for this course to access its content".to_string(),
    ))
}
