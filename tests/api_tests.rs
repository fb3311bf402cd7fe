// tests/api_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn unknown_api_paths_are_not_found_with_or_without_a_token() {
    let app = spawn_app().await;
    let learner = app.register("learner").await;

    for path in ["/api/no-such-resource", "/api/admin/no-such-resource"] {
        let response = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404, "{path} without token");

        let response = app.get(path, &learner).await;
        assert_eq!(response.status().as_u16(), 404, "{path} with token");
    }

    // Known routes still require the token.
    let response = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app().await;
    let email = format!("ada_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "name": "Ada",
            "email": email,
            "password": "password123",
            "role": "instructor"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["user"].get("password").is_none());

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    let token = body["token"].as_str().unwrap().to_string();

    let me: Value = app
        .client
        .get(app.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["email"], email.as_str());
    assert_eq!(me["user"]["role"], "instructor");
    assert!(me["courses"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    let email = format!("alan_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    app.client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "name": "Alan", "email": email, "password": "password123", "role": "learner" }))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Short password and admin role are both rejected.
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "name": "Mallory",
            "email": "mallory@example.com",
            "password": "123",
            "role": "admin"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"].get("password").is_some());
    assert!(body["fields"].get("role").is_some());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = spawn_app().await;
    let payload = json!({
        "name": "Grace",
        "email": "grace@example.com",
        "password": "password123",
        "role": "learner"
    });

    let first = app.client.post(app.url("/api/auth/register")).json(&payload).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = app.client.post(app.url("/api/auth/register")).json(&payload).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/enrollments")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(app.url("/api/enrollments"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn course_crud_is_limited_to_the_owner() {
    let app = spawn_app().await;
    let owner = app.register("instructor").await;
    let other = app.register("instructor").await;
    let learner = app.register("learner").await;

    // Learners cannot create courses.
    let response = app
        .post(
            "/api/courses",
            &learner,
            json!({ "title": "x", "description": "y", "category": "design", "price": 0.0, "duration_hours": 1 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let course_id = app.create_course(&owner).await;

    // Catalogue is public and the description was sanitized on the way in.
    let course: Value = app
        .client
        .get(app.url(&format!("/api/courses/{course_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(course["instructor_id"], owner.id);
    assert!(course["description"].as_str().unwrap().contains("<b>unsafe</b>"));

    let response = app
        .client
        .put(app.url(&format!("/api/courses/{course_id}")))
        .bearer_auth(&other.token)
        .json(&json!({ "price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .put(app.url(&format!("/api/courses/{course_id}")))
        .bearer_auth(&owner.token)
        .json(&json!({ "price": 19.5, "title": "Rust, revised" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["price"], 19.5);
    assert_eq!(updated["title"], "Rust, revised");

    let mine: Value = app.get("/api/instructor/courses", &owner).await.json().await.unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let response = app
        .client
        .delete(app.url(&format!("/api/courses/{course_id}")))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url(&format!("/api/courses/{course_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn question_shape_is_checked() {
    let app = spawn_app().await;
    let instructor = app.register("instructor").await;
    let course_id = app.create_course(&instructor).await;
    let key = app.create_quiz(&instructor, course_id).await;

    // true/false without its expected value
    let response = app
        .post(
            &format!("/api/quiz/{}/questions", key.quiz_id),
            &instructor,
            json!({ "prompt": "Rust has a GC.", "kind": "true_false" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // choices only on multiple-choice questions
    let response = app
        .post(
            &format!("/api/questions/{}/answers", key.free_text_id),
            &instructor,
            json!({ "text": "anything", "is_correct": true }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_routes_reject_non_admins() {
    let app = spawn_app().await;
    let learner = app.register("learner").await;

    let response = app.get("/api/admin/users", &learner).await;
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = spawn_app().await;

    let doc: Value = app
        .client
        .get(app.url("/api-docs/openapi.json"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"].get("/api/courses/{id}/can-start-quiz").is_some());
    assert!(doc["paths"].get("/api/payments/check/{course_id}").is_some());
}
