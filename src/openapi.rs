// src/openapi.rs

use axum::{Json, response::IntoResponse};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::handlers::{enrollment, payment, quiz_window};

struct SecurityAddon;

#[derive(OpenApi)]
#[openapi(
    paths(
        quiz_window::start_quiz,
        quiz_window::can_start_quiz,
        quiz_window::start_user_quiz,
        quiz_window::submit_quiz,
        enrollment::enroll,
        enrollment::check_enrollment,
        enrollment::my_enrollments,
        enrollment::certify,
        payment::record_payment,
        payment::check_payment,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "quiz-window", description = "Timed quiz window and learner attempts"),
        (name = "enrollment", description = "Enrollment and certification"),
        (name = "payment", description = "Course payments"),
    )
)]
pub struct ApiDoc;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
