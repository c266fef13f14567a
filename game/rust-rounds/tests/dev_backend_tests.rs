mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn fetch_question(app: &Router, game: &str, difficulty: u8) -> Value {
    let (status, body) = send(
        app,
        get(&format!("/api/question?game={}&difficulty={}", game, difficulty)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_reports_catalog() {
    let app = common::create_test_app();

    let (status, body) = send(&app, get("/health")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["catalog_size"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_question_has_requested_option_count() {
    let app = common::create_test_app();

    for difficulty in 2..=6u8 {
        let question = fetch_question(&app, "identify-subject", difficulty).await;
        let options = question["options"].as_array().unwrap();

        assert_eq!(options.len(), difficulty as usize);
        assert_eq!(question["question_type"], "identify-subject");
        assert!(question["token"].as_str().unwrap().contains('.'));
        assert!(question["image_url"].is_string());

        let mut ids: Vec<&str> = options.iter().map(|o| o["id"].as_str().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), difficulty as usize, "options must be distinct");
    }
}

#[tokio::test]
async fn test_category_question_offers_distinct_categories() {
    let app = common::create_test_app();

    let question = fetch_question(&app, "identify-category", 4).await;
    let options = question["options"].as_array().unwrap();

    assert_eq!(question["question_type"], "identify-category");
    assert_eq!(options.len(), 4);
    let token = serde_json::from_value(question["token"].clone()).unwrap();
    let answer = common::answer_in_token(&token);
    assert!(options.iter().any(|o| o["id"] == answer.as_str()));
}

#[tokio::test]
async fn test_invalid_difficulty_is_rejected() {
    let app = common::create_test_app();

    let (status, _) = send(&app, get("/api/question?game=identify-subject&difficulty=9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/question?game=trivia&difficulty=4")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guess_token_is_single_use() {
    let app = common::create_test_app();
    let question = fetch_question(&app, "identify-subject", 4).await;
    let token = serde_json::from_value(question["token"].clone()).unwrap();
    let answer = common::answer_in_token(&token);

    let guess = json!({ "token": question["token"], "answer": answer });
    let (status, body) = send(&app, post_json("/api/guess", guess.clone())).await;
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["correct"], true);
    assert_eq!(json["answer_id"], answer.as_str());

    let (status, body) = send(&app, post_json("/api/guess", guess)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(String::from_utf8(body).unwrap(), "Token already used.");
}

#[tokio::test]
async fn test_wrong_guess_reveals_answer() {
    let app = common::create_test_app();
    let question = fetch_question(&app, "identify-subject", 3).await;
    let token = serde_json::from_value(question["token"].clone()).unwrap();
    let answer = common::answer_in_token(&token);
    let wrong = question["options"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_str().unwrap().to_string())
        .find(|id| *id != answer)
        .unwrap();

    let (status, body) = send(
        &app,
        post_json("/api/guess", json!({ "token": question["token"], "answer": wrong })),
    )
    .await;
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["correct"], false);
    assert_eq!(json["answer_id"], answer.as_str());
}

#[tokio::test]
async fn test_tampered_or_missing_guess_is_bad_request() {
    let app = common::create_test_app();
    let question = fetch_question(&app, "identify-subject", 4).await;
    let token = question["token"].as_str().unwrap();
    let (payload, _) = token.split_once('.').unwrap();

    let (status, body) = send(
        &app,
        post_json(
            "/api/guess",
            json!({ "token": format!("{}.forged", payload), "answer": "101" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Invalid token.");

    let (status, _) = send(&app, post_json("/api/guess", json!({ "answer": "101" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_high_scores_merge_per_partition() {
    let app = common::create_test_app();

    for (initials, score) in [("AAA", 5), ("BBB", 9), ("CCC", 5)] {
        let (status, _) = send(
            &app,
            post_json(
                "/api/high-scores",
                json!({
                    "score": score,
                    "initials": initials,
                    "game": "identify-subject",
                    "difficulty": 4
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/api/high-scores?game=identify-subject&difficulty=4")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::OK);

    let entries: Vec<(String, u64)> = json["high_scores"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["initials"].as_str().unwrap().to_string(),
                e["score"].as_u64().unwrap(),
            )
        })
        .collect();
    // Equal scores keep submission order
    assert_eq!(
        entries,
        vec![
            ("BBB".to_string(), 9),
            ("AAA".to_string(), 5),
            ("CCC".to_string(), 5)
        ]
    );

    let (_, body) = send(&app, get("/api/high-scores?game=identify-subject&difficulty=5")).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["high_scores"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_high_score_validation() {
    let app = common::create_test_app();

    let (status, _) = send(
        &app,
        post_json(
            "/api/high-scores",
            json!({ "score": 3, "initials": "ABCD", "game": "mixed", "difficulty": 4 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        post_json(
            "/api/high-scores",
            json!({ "score": 3, "initials": "ABC", "game": "mixed", "difficulty": 7 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        post_json("/api/high-scores", json!({ "score": 3, "initials": "ABC" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_http_counters() {
    let app = common::create_test_app();
    send(&app, get("/health")).await;

    let (status, body) = send(&app, get("/metrics")).await;
    let text = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("path=\"/health\""));
}
