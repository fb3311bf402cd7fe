// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Caller role, as stored in `users.role` and carried in the JWT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub role: Role,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Minimal user info embedded in other responses (roster, certificates).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 2,
        max = 255,
        message = "Name length must be between 2 and 255 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(custom(function = validate_self_service_role))]
    pub role: Role,
}

/// Administrators are seeded from configuration, never self-registered.
fn validate_self_service_role(role: &Role) -> Result<(), validator::ValidationError> {
    if *role == Role::Admin {
        return Err(validator::ValidationError::new("role_not_allowed")
            .with_message("Only learner or instructor accounts can be registered.".into()));
    }
    Ok(())
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
