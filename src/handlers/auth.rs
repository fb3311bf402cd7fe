// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, conflict_on_unique},
    models::{
        course::Course,
        user::{LoginRequest, RegisterRequest, Role, User},
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new learner or instructor.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the user (without password) and a token.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;
    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password, role)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(payload.name.trim())
    .bind(&email)
    .bind(hashed_password)
    .bind(payload.role)
    .fetch_one(&pool)
    .await
    .map_err(|e| conflict_on_unique(e, format!("Email '{email}' is already registered")))?;

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "User registered");
    Ok((StatusCode::CREATED, Json(json!({ "user": user, "token": token }))))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(payload.email.trim().to_lowercase())
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "user": user,
        "token": token,
        "type": "Bearer"
    })))
}

/// Current user; instructors also get the courses they own.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role != Role::Instructor {
        return Ok(Json(json!({ "user": user })));
    }

    let courses = sqlx::query_as::<_, Course>(
        "SELECT * FROM courses WHERE instructor_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "user": user, "courses": courses })))
}
