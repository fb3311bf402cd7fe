// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, auth, course, enrollment, lesson, payment, quiz, quiz_window},
    openapi,
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: registration, login, the course catalogue, the OpenAPI document.
/// * Authenticated routes: everything else under `/api`.
/// * Admin routes: `/api/admin`, behind both auth and role check.
/// * Global middleware: request tracing and CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.cors_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/courses", get(course::list_courses))
        .route("/api/courses/{id}", get(course::get_course))
        .route("/api/courses/{id}/quiz", get(quiz::list_quizzes))
        .route("/api-docs/openapi.json", get(openapi::openapi_json));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        // Courses and roster
        .route("/api/courses", post(course::create_course))
        .route(
            "/api/courses/{id}",
            put(course::update_course).delete(course::delete_course),
        )
        .route("/api/instructor/courses", get(course::my_courses))
        .route("/api/courses/{id}/learners", get(course::list_learners))
        // Lessons
        .route(
            "/api/courses/{id}/lessons",
            get(lesson::list_lessons).post(lesson::create_lesson),
        )
        .route(
            "/api/lessons/{id}",
            get(lesson::get_lesson)
                .put(lesson::update_lesson)
                .delete(lesson::delete_lesson),
        )
        // Quiz authoring
        .route("/api/courses/{id}/quiz", post(quiz::create_quiz))
        .route("/api/quiz/{id}", put(quiz::update_quiz).delete(quiz::delete_quiz))
        .route(
            "/api/quiz/{id}/questions",
            get(quiz::list_questions).post(quiz::create_question),
        )
        .route(
            "/api/questions/{id}",
            put(quiz::update_question).delete(quiz::delete_question),
        )
        .route("/api/questions/{id}/answers", post(quiz::create_answer))
        .route(
            "/api/answers/{id}",
            put(quiz::update_answer).delete(quiz::delete_answer),
        )
        // Quiz window
        .route("/api/courses/{id}/start-quiz", post(quiz_window::start_quiz))
        .route("/api/courses/{id}/can-start-quiz", get(quiz_window::can_start_quiz))
        .route(
            "/api/courses/{id}/start-user-quiz",
            post(quiz_window::start_user_quiz),
        )
        .route("/api/quiz/{id}/submit", post(quiz_window::submit_quiz))
        // Enrollment, payment, certification
        .route(
            "/api/enrollments",
            get(enrollment::my_enrollments).post(enrollment::enroll),
        )
        .route(
            "/api/enrollments/check/{course_id}",
            get(enrollment::check_enrollment),
        )
        .route("/api/payments", post(payment::record_payment))
        .route("/api/payments/check/{course_id}", get(payment::check_payment))
        .route(
            "/api/courses/{id}/certify/{learner_id}",
            post(enrollment::certify),
        )
        .route("/api/certificates", get(enrollment::my_certificates))
        // route_layer: unmatched paths fall through to a plain 404
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        // Double middleware protection: Auth first, then Admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// `*` allows any origin; otherwise the exact list, skipping entries that are
/// not valid header values.
fn allowed_origins(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::any();
    }

    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    AllowOrigin::list(values)
}
