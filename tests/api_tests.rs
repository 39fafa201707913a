// tests/api_tests.rs

use std::sync::Arc;

use axum::{body::Body, http::Request};
use serde_json::{Value, json};
use study_backend::{
    config::{Config, ProgressSettings},
    models::question::QuizQuestion,
    repository::{MemoryProgressRepository, MemoryQuizRepository},
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use tower::ServiceExt;

const SECRET: &str = "test_secret_for_integration_tests";

fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        history_default_limit: 20,
        topic_weights: Default::default(),
        progress: ProgressSettings::default(),
    }
}

fn question(id: i64, kind: &str, options: Value, answers: Value) -> QuizQuestion {
    QuizQuestion {
        id,
        topic: "variables".to_string(),
        chapter: "storage".to_string(),
        question_type: kind.to_string(),
        difficulty: "easy".to_string(),
        question: format!("Question {}", id),
        options: options.to_string(),
        correct_answers: answers.to_string(),
        explanation: "Analysis".to_string(),
        code_snippet: None,
    }
}

fn test_state() -> AppState {
    let quiz_repo = MemoryQuizRepository::with_questions(vec![
        question(1, "single", json!(["stack", "heap", "register"]), json!(["A"])),
        question(2, "multiple", json!(["zero", "nil", "panic"]), json!([0, 1])),
    ]);
    AppState::new(
        test_config(),
        Arc::new(quiz_repo),
        Arc::new(MemoryProgressRepository::new()),
    )
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let app = routes::create_router(test_state());

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn bearer(user_id: i64) -> String {
    format!("Bearer {}", sign_jwt(user_id, SECRET, 600).unwrap())
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["/api/quiz/variables/storage", "/api/progress", "/api/quiz/history"] {
        let response = client
            .get(&format!("{}{}", address, path))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 401, "{}", path);
    }

    let response = client
        .get(&format!("{}/api/progress", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn stats_are_public() {
    let app = routes::create_router(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/quiz/variables/storage/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let stats: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["by_type"]["multiple"], 1);
}

#[tokio::test]
async fn test_quiz_flow() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = bearer(11);

    // 1. Fetch quiz
    let quiz_resp = client
        .get(&format!("{}/api/quiz/variables/storage", address))
        .header("Authorization", &token)
        .send()
        .await
        .expect("Fetch quiz failed");
    assert_eq!(quiz_resp.status().as_u16(), 200);

    let quiz: Value = quiz_resp.json().await.unwrap();
    let session_id = quiz["session_id"].as_str().expect("session id").to_string();
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert!(questions.iter().all(|q| q.get("correct_answers").is_none()));

    // 2. Submit correct answers
    let submission = json!({
        "session_id": session_id,
        "answers": [
            { "question_id": 1, "user_answers": ["a"] },
            { "question_id": 2, "user_answers": ["B", "A"] }
        ]
    });
    let submit_resp = client
        .post(&format!("{}/api/quiz/variables/storage/submit", address))
        .header("Authorization", &token)
        .json(&submission)
        .send()
        .await
        .expect("Submit failed");
    assert_eq!(submit_resp.status().as_u16(), 200);

    let result: Value = submit_resp.json().await.unwrap();
    assert_eq!(result["score"], 100);
    assert_eq!(result["passed"], true);
    assert_eq!(result["correct_answers"], 2);

    // 3. Resubmit is a conflict
    let again = client
        .post(&format!("{}/api/quiz/variables/storage/submit", address))
        .header("Authorization", &token)
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);
    let body: Value = again.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("already been submitted"));

    // 4. History and review
    let history: Value = client
        .get(&format!("{}/api/quiz/history?topic=variables", address))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["session_id"], session_id.as_str());

    let review: Value = client
        .get(&format!("{}/api/quiz/review/{}", address, session_id))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(review["items"].as_array().unwrap().len(), 2);

    // 5. The graded quiz reached the progress record
    let topic: Value = client
        .get(&format!("{}/api/progress/variables", address))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let chapter = &topic["chapters"][0];
    assert_eq!(chapter["chapter"], "storage");
    assert_eq!(chapter["quiz_score"], 100);
    assert_eq!(chapter["quiz_passed"], true);
    assert_eq!(chapter["status"], "tested");
}

#[tokio::test]
async fn submit_rejects_unknown_topic() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/quiz/generics/basics/submit", address))
        .header("Authorization", bearer(11))
        .json(&json!({
            "session_id": "whatever",
            "answers": [{ "question_id": 1, "user_answers": ["A"] }]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_progress_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = bearer(21);

    for (read, scroll) in [(10, 40), (20, 95)] {
        let response = client
            .post(&format!("{}/api/progress", address))
            .header("Authorization", &token)
            .json(&json!({
                "topic": "lexical_elements",
                "chapter": "comments",
                "read_duration": read,
                "scroll_progress": scroll,
                "last_position": "#line-comments"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let overall: Value = client
        .get(&format!("{}/api/progress", address))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(overall["overall"]["total_study_time"], 30);
    assert_eq!(overall["overall"]["total_chapters"], 41);
    assert_eq!(overall["topics"].as_array().unwrap().len(), 4);

    let chapters: Value = client
        .get(&format!("{}/api/progress/chapters", address))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(chapters[0]["scroll_progress"], 95);
    assert_eq!(chapters[0]["status"], "in_progress");
    assert_eq!(chapters[0]["percent"], 95);

    let next: Value = client
        .get(&format!("{}/api/progress/next", address))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(next["next"]["chapter"], "comments");
    assert_eq!(next["next"]["status"], "in_progress");
}

#[tokio::test]
async fn progress_validation_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/progress", address))
        .header("Authorization", bearer(21))
        .json(&json!({
            "topic": "variables",
            "chapter": "Not A Slug"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}
