// src/models/course.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Category {
    Development,
    Design,
    Marketing,
    Business,
}

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,

    pub title: String,

    /// Sanitized HTML.
    pub description: String,

    pub category: Category,

    pub price: f64,

    /// Expected study time in hours.
    pub duration_hours: i64,

    pub image_url: Option<String>,

    /// Owner. Only this instructor may edit the course, open its quiz
    /// window, or certify its learners.
    pub instructor_id: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub description: String,
    pub category: Category,
    #[validate(range(min = 0.0, message = "Price cannot be negative."))]
    pub price: f64,
    #[validate(range(min = 1, max = 10000))]
    pub duration_hours: i64,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
}

/// DTO for updating a course. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub description: Option<String>,
    pub category: Option<Category>,
    #[validate(range(min = 0.0, message = "Price cannot be negative."))]
    pub price: Option<f64>,
    #[validate(range(min = 1, max = 10000))]
    pub duration_hours: Option<i64>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
}

/// Validates that a string is a correctly formatted URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CreateCourseRequest {
        CreateCourseRequest {
            title: "Rust for backend developers".to_string(),
            description: "<p>Ownership, traits, async.</p>".to_string(),
            category: Category::Development,
            price: 49.9,
            duration_hours: 12,
            image_url: Some("https://cdn.example.com/rust.png".to_string()),
        }
    }

    #[test]
    fn accepts_well_formed_course() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_negative_price_and_bad_url() {
        let mut req = valid();
        req.price = -1.0;
        req.image_url = Some("not a url".to_string());
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("image_url"));
    }
}
