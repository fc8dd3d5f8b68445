// tests/api_tests.rs
//
// Integration tests against a live Postgres. They are #[ignore]d by default;
// run them with a database available:
//
//   DATABASE_URL=postgres://... cargo test -- --ignored --test-threads=1
//
// Single-threaded because the tests truncate and reseed shared tables.

use std::collections::HashMap;

use lingua_backend::bank::QuestionBank;
use lingua_backend::config::Config;
use lingua_backend::models::level::Level;
use lingua_backend::models::question::CreateQuestionRequest;
use lingua_backend::routes;
use lingua_backend::state::AppState;
use lingua_backend::utils::jwt::sign_jwt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const TEST_JWT_SECRET: &str = "test_secret_for_integration_tests";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL and a pool for seeding.
async fn spawn_app() -> (String, PgPool) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn reset_tables(pool: &PgPool) {
    sqlx::query(
        "TRUNCATE placement_results, exam_attempts, placement_questions, questions RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await
    .expect("Failed to truncate tables");
}

fn en_options() -> HashMap<String, Vec<String>> {
    let mut options = HashMap::new();
    options.insert(
        "en".to_string(),
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
    );
    options
}

/// Seeds `n` exam questions at the level, alternating categories, with the
/// correct answer always at index 1. Returns the new ids.
async fn seed_questions(pool: &PgPool, level: &str, n: usize) -> Vec<i64> {
    let bank = QuestionBank::new(pool.clone());
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let payload = CreateQuestionRequest {
            level: level.to_string(),
            category: if i % 2 == 0 { "syntax" } else { "morphology" }.to_string(),
            text: format!("{} question {}", level, i),
            options: en_options(),
            correct_index: 1,
            explanation: None,
        };
        ids.push(bank.insert_question(&payload).await.expect("seed failed"));
    }
    ids
}

async fn seed_placement_questions(pool: &PgPool, per_level: usize) {
    for level in Level::ALL {
        for i in 0..per_level {
            sqlx::query(
                r#"
                INSERT INTO placement_questions (level, text, options, correct_index)
                VALUES ($1, $2, $3, 1)
                "#,
            )
            .bind(level)
            .bind(format!("{} placement {}", level, i))
            .bind(sqlx::types::Json(en_options()))
            .execute(pool)
            .await
            .expect("placement seed failed");
        }
    }
}

fn token_for(user_id: i64) -> String {
    sign_jwt(user_id, TEST_JWT_SECRET, 600).expect("failed to sign test token")
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn unknown_route_is_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn exam_routes_require_a_token() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/exam/generate", address))
        .json(&serde_json::json!({ "level": "A1" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn generate_returns_35_unique_questions() {
    let (address, pool) = spawn_app().await;
    reset_tables(&pool).await;
    seed_questions(&pool, "A1", 35).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/exam/generate", address))
        .header("Authorization", format!("Bearer {}", token_for(1)))
        .json(&serde_json::json!({ "level": "A1" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 35);

    let mut ids: Vec<i64> = questions
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 35);

    // Answer key must not leak.
    assert!(questions[0].get("correct_index").is_none());
    assert_eq!(questions[0]["options"].as_array().unwrap().len(), 4);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn generate_fails_when_bank_is_too_small() {
    let (address, pool) = spawn_app().await;
    reset_tables(&pool).await;
    seed_questions(&pool, "B2", 10).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/exam/generate", address))
        .header("Authorization", format!("Bearer {}", token_for(1)))
        .json(&serde_json::json!({ "level": "B2" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_questions");
    assert_eq!(body["available"], 10);
    assert_eq!(body["required"], 35);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn invalid_level_is_422() {
    let (address, _pool) = spawn_app().await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/exam/generate", address))
        .header("Authorization", format!("Bearer {}", token_for(1)))
        .json(&serde_json::json!({ "level": "Z9" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_level");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn empty_submission_is_422() {
    let (address, _pool) = spawn_app().await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/api/exam/submit", address))
        .header("Authorization", format!("Bearer {}", token_for(1)))
        .json(&serde_json::json!({ "level": "A1", "answers": [] }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 422);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "empty_answers");
}

/// Submits all 35 seeded questions with `correct` of them answered right
/// (the key is always index 1) and returns the response body.
async fn submit_sheet(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    ids: &[i64],
    correct: usize,
) -> serde_json::Value {
    let answers: Vec<serde_json::Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            serde_json::json!({
                "question_id": id,
                "selected_index": if i < correct { 1 } else { 0 },
            })
        })
        .collect();

    let response = client
        .post(format!("{}/api/exam/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "level": "A1",
            "answers": answers,
            "time_spent_seconds": 480,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn full_exam_flow_scores_and_tracks_history() {
    let (address, pool) = spawn_app().await;
    reset_tables(&pool).await;
    let ids = seed_questions(&pool, "A1", 35).await;

    let client = reqwest::Client::new();
    let token = token_for(7);

    // 24/35 rounds to 69: just under the pass mark.
    let result = submit_sheet(&client, &address, &token, &ids, 24).await;
    assert_eq!(result["score"], 69);
    assert_eq!(result["correct_count"], 24);
    assert_eq!(result["total_count"], 35);
    assert_eq!(result["passed"], false);
    let first_exam_id = result["exam_id"].as_i64().unwrap();

    // 25/35 rounds to 71: a pass.
    let result = submit_sheet(&client, &address, &token, &ids, 25).await;
    assert_eq!(result["score"], 71);
    assert_eq!(result["passed"], true);

    let breakdown = &result["category_breakdown"];
    let syntax_total = breakdown["syntax"]["total"].as_u64().unwrap();
    let morphology_total = breakdown["morphology"]["total"].as_u64().unwrap();
    assert_eq!(syntax_total + morphology_total, 35);

    // Metadata reflects both attempts; best score is the maximum.
    let meta: serde_json::Value = client
        .get(format!("{}/api/exam/new?level=A1", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(meta["can_take_exam"], true);
    assert_eq!(meta["best_score"], 71);
    assert_eq!(meta["attempt_count"], 2);
    assert_eq!(meta["previous_attempts"].as_array().unwrap().len(), 2);

    // Results of the first attempt, including the incorrect-answer review.
    let results: serde_json::Value = client
        .get(format!("{}/api/exam/{}/results", address, first_exam_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(results["score"], 69);
    assert_eq!(results["passed"], false);
    assert_eq!(results["answers"].as_array().unwrap().len(), 35);
    assert_eq!(results["incorrect_answers"].as_array().unwrap().len(), 11);

    // Another user must not be able to read the attempt.
    let response = client
        .get(format!("{}/api/exam/{}/results", address, first_exam_id))
        .header("Authorization", format!("Bearer {}", token_for(8)))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn best_score_is_zero_without_attempts() {
    let (address, pool) = spawn_app().await;
    reset_tables(&pool).await;
    seed_questions(&pool, "B1", 35).await;

    let client = reqwest::Client::new();
    let meta: serde_json::Value = client
        .get(format!("{}/api/exam/new?level=B1", address))
        .header("Authorization", format!("Bearer {}", token_for(99)))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    assert_eq!(meta["best_score"], 0);
    assert_eq!(meta["attempt_count"], 0);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn placement_flow_serves_and_records_a_run() {
    let (address, pool) = spawn_app().await;
    reset_tables(&pool).await;
    seed_placement_questions(&pool, 10).await;

    let client = reqwest::Client::new();

    // Serving the questions needs no token.
    let body: serde_json::Value = client
        .get(format!("{}/api/placement-test/questions", address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 20);

    // Four per tier, climbing A1 -> C1 regardless of answers.
    let levels: Vec<&str> = questions
        .iter()
        .map(|q| q["level"].as_str().unwrap())
        .collect();
    assert_eq!(&levels[0..4], &["A1"; 4]);
    assert_eq!(&levels[16..20], &["C1"; 4]);

    // The correct index points at the shuffled position of option "b".
    for q in questions {
        let correct = q["correct_index"].as_u64().unwrap() as usize;
        assert_eq!(q["options"][correct], "b");
    }

    // Recording the client-scored result requires a token.
    let answers: Vec<serde_json::Value> = questions
        .iter()
        .map(|q| {
            serde_json::json!({
                "question_id": q["id"],
                "selected_option": "b",
                "correct": true,
                "level": q["level"],
            })
        })
        .collect();

    let response = client
        .post(format!("{}/api/placement-test/results", address))
        .header("Authorization", format!("Bearer {}", token_for(5)))
        .json(&serde_json::json!({
            "answers": answers,
            "level": "C1",
            "score": 20,
            "total": 20,
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);

    let recorded: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM placement_results WHERE user_id = 5")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(recorded, 1);
}
