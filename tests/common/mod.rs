// tests/common/mod.rs

#![allow(dead_code)]

use std::net::SocketAddr;

use course_platform::{config::Config, routes, state::AppState};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub struct TestApp {
    /// Base URL, e.g. "http://127.0.0.1:12345".
    pub address: String,
    /// Same database the server uses; lets tests move the clock by editing rows.
    pub pool: SqlitePool,
    pub client: Client,
}

/// A registered user and its bearer token.
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

/// Spawns the app on a random port backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // 1. One connection that is never recycled, so the in-memory database
    //    lives as long as the pool.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cors_origins: vec!["http://localhost:4200".to_string()],
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        client: Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str, user: &TestUser) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, user: &TestUser, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&user.token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn register(&self, role: &str) -> TestUser {
        let email = format!("{}_{}@example.com", role, &uuid::Uuid::new_v4().to_string()[..8]);
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "name": format!("Test {role}"),
                "email": email,
                "password": "password123",
                "role": role
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_course(&self, instructor: &TestUser) -> i64 {
        let response = self
            .post(
                "/api/courses",
                instructor,
                json!({
                    "title": "Systems programming in Rust",
                    "description": "<p>Memory, ownership and <b>unsafe</b>.</p>",
                    "category": "development",
                    "price": 49.0,
                    "duration_hours": 20
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
    }

    /// Creates the course's quiz with one question of each kind.
    pub async fn create_quiz(&self, instructor: &TestUser, course_id: i64) -> QuizKey {
        let quiz: Value = self
            .post(
                &format!("/api/courses/{course_id}/quiz"),
                instructor,
                json!({ "title": "Final exam", "position": 0 }),
            )
            .await
            .json()
            .await
            .unwrap();
        let quiz_id = quiz["id"].as_i64().unwrap();

        let question = |body: Value| async move {
            let response = self
                .post(&format!("/api/quiz/{quiz_id}/questions"), instructor, body)
                .await;
            assert_eq!(response.status().as_u16(), 201);
            response.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
        };

        let choice_id = question(json!({ "prompt": "Which trait enables `?` on errors?", "kind": "multiple_choice" })).await;
        let true_false_id = question(json!({ "prompt": "Box<T> is heap allocated.", "kind": "true_false", "correct_value": true })).await;
        let free_text_id = question(json!({ "prompt": "Explain borrowing.", "kind": "free_text" })).await;

        let answer = |text: &'static str, is_correct: bool| async move {
            let response = self
                .post(
                    &format!("/api/questions/{choice_id}/answers"),
                    instructor,
                    json!({ "text": text, "is_correct": is_correct }),
                )
                .await;
            assert_eq!(response.status().as_u16(), 201);
            response.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
        };

        let wrong_answer_id = answer("Display", false).await;
        let right_answer_id = answer("From", true).await;

        QuizKey {
            quiz_id,
            choice_id,
            true_false_id,
            free_text_id,
            right_answer_id,
            wrong_answer_id,
        }
    }

    /// Enrolls and pays; returns the learner ready to take the quiz.
    pub async fn paid_learner(&self, course_id: i64) -> TestUser {
        let learner = self.register("learner").await;
        let enrolled = self
            .post("/api/enrollments", &learner, json!({ "course_id": course_id }))
            .await;
        assert_eq!(enrolled.status().as_u16(), 201);

        let paid = self
            .post(
                "/api/payments",
                &learner,
                json!({
                    "course_id": course_id,
                    "amount": 49.0,
                    "method": "card",
                    "transaction_id": format!("txn_{}", uuid::Uuid::new_v4().simple())
                }),
            )
            .await;
        assert_eq!(paid.status().as_u16(), 201);
        learner
    }

    /// Moves the course's quiz window back in time by `minutes`.
    pub async fn rewind_window(&self, quiz_id: i64, minutes: i64) {
        let started_at: chrono::DateTime<chrono::Utc> =
            sqlx::query_scalar("SELECT started_at FROM quizzes WHERE id = ?")
                .bind(quiz_id)
                .fetch_one(&self.pool)
                .await
                .unwrap();

        sqlx::query("UPDATE quizzes SET started_at = ? WHERE id = ?")
            .bind(started_at - chrono::Duration::minutes(minutes))
            .bind(quiz_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

pub struct QuizKey {
    pub quiz_id: i64,
    pub choice_id: i64,
    pub true_false_id: i64,
    pub free_text_id: i64,
    pub right_answer_id: i64,
    pub wrong_answer_id: i64,
}
