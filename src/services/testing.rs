// src/services/testing.rs

//! Fixtures for service tests: an in-memory database with the real schema
//! and a few row builders.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::{models::user::Role, utils::jwt::Claims};

pub async fn memory_pool() -> SqlitePool {
    // A single connection that never recycles: each in-memory connection is
    // its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Fixed reference instant used as T0 in window tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

pub fn claims(id: i64, role: Role) -> Claims {
    Claims {
        sub: id.to_string(),
        role,
        exp: usize::MAX,
    }
}

pub async fn user(pool: &SqlitePool, name: &str, role: Role) -> Claims {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password, role) VALUES (?, ?, 'x', ?) RETURNING id",
    )
    .bind(name)
    .bind(format!("{name}@example.com"))
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    claims(id, role)
}

pub async fn course(pool: &SqlitePool, instructor: &Claims) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO courses (title, description, category, price, duration_hours, instructor_id)
        VALUES ('Async Rust', 'Futures and executors', 'development', 30, 8, ?)
        RETURNING id
        "#,
    )
    .bind(instructor.user_id().unwrap())
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn quiz(pool: &SqlitePool, course_id: i64) -> i64 {
    sqlx::query_scalar("INSERT INTO quizzes (course_id, title) VALUES (?, 'Final quiz') RETURNING id")
        .bind(course_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Adds a multiple-choice question; returns (question id, correct answer id).
pub async fn choice_question(pool: &SqlitePool, quiz_id: i64) -> (i64, i64) {
    let question_id: i64 = sqlx::query_scalar(
        "INSERT INTO questions (quiz_id, prompt, kind) VALUES (?, 'Pick one', 'multiple_choice') RETURNING id",
    )
    .bind(quiz_id)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO answers (question_id, text, is_correct) VALUES (?, 'wrong', 0)")
        .bind(question_id)
        .execute(pool)
        .await
        .unwrap();

    let correct_id: i64 = sqlx::query_scalar(
        "INSERT INTO answers (question_id, text, is_correct) VALUES (?, 'right', 1) RETURNING id",
    )
    .bind(question_id)
    .fetch_one(pool)
    .await
    .unwrap();

    (question_id, correct_id)
}

pub async fn enrollment(pool: &SqlitePool, learner: &Claims, course_id: i64, paid: bool) {
    sqlx::query(
        "INSERT INTO enrollments (user_id, course_id, status, is_paid) VALUES (?, ?, ?, ?)",
    )
    .bind(learner.user_id().unwrap())
    .bind(course_id)
    .bind(if paid { "validated" } else { "pending" })
    .bind(paid)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn active_attempts(pool: &SqlitePool, quiz_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = ? AND is_active = 1")
        .bind(quiz_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
