mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use quizcode::{db::Db, router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> (Db, Router) {
    let db = common::create_test_db().await;
    let app = router(AppState::new(db.clone()));
    (db, app)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, "api-test")
        .header("X-Forwarded-For", "203.0.113.9, 10.0.0.1");
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);

    let resp = app
        .clone()
        .oneshot(req.body(body).expect("request build should succeed"))
        .await
        .expect("router should respond");

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, value)
}

fn quiz_body() -> String {
    json!({
        "title": "Capitals",
        "description": "European capitals",
        "questions": [
            {"text": "France?", "answers": [{"text": "Paris"}, {"text": "Lyon"}], "correct_index": 0},
            {"text": "Spain?", "answers": [{"text": "Barcelona"}, {"text": "Madrid"}], "correct_index": 1}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn authoring_routes_reject_requests_without_a_valid_token() {
    let (_, app) = app().await;

    let cases = [
        (Method::GET, "/api/quizzes"),
        (Method::POST, "/api/quizzes"),
        (Method::GET, "/api/quizzes/1"),
        (Method::PUT, "/api/quizzes/1"),
        (Method::DELETE, "/api/quizzes/1"),
        (Method::PUT, "/api/quizzes/1/status"),
        (Method::PUT, "/api/quizzes/1/order"),
        (Method::GET, "/api/quizzes/1/results"),
        (Method::DELETE, "/api/questions/1"),
    ];

    for (method, uri) in cases {
        for token in [None, Some("not-a-token")] {
            let (status, body) = send(&app, method.clone(), uri, token, Some("{}")).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "expected UNAUTHORIZED for {uri}");
            assert_eq!(body["error"], "unauthorized");
        }
    }
}

#[tokio::test]
async fn author_and_participant_round_trip() {
    let (db, app) = app().await;
    let (_, token) = common::create_owner(&db, "author").await;

    let (status, created) =
        send(&app, Method::POST, "/api/quizzes", Some(&token), Some(&quiz_body())).await;
    assert_eq!(status, StatusCode::CREATED);
    let code = created["code"].as_str().unwrap().to_string();

    let (_, list) = send(&app, Method::GET, "/api/quizzes", Some(&token), None).await;
    assert_eq!(list[0]["code"], code.as_str());
    assert_eq!(list[0]["status"], "draft");
    assert_eq!(list[0]["question_count"], 2);
    let quiz_id = list[0]["id"].as_i64().unwrap();

    // Draft quizzes are invisible to participants
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/quiz-questions?code={code}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/quizzes/{quiz_id}/status"),
        Some(&token),
        Some(r#"{"status": "active"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, questions) = send(
        &app,
        Method::GET,
        &format!("/api/quiz-questions?code={}", code.to_lowercase()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(questions.as_array().unwrap().len(), 2);
    assert!(!questions.to_string().contains("is_correct"));

    let (status, registered) = send(
        &app,
        Method::POST,
        "/api/participant-register",
        None,
        Some(&json!({"quiz_code": code, "nickname": "Alice"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let participant_id = registered["participant_id"].as_i64().unwrap();

    let (_, edit) =
        send(&app, Method::GET, &format!("/api/quizzes/{quiz_id}"), Some(&token), None).await;
    let france = &edit["questions"][0];
    let paris = france["answers"][0]["id"].as_i64().unwrap();
    let spain = &edit["questions"][1];
    let barcelona = spain["answers"][0]["id"].as_i64().unwrap();
    assert_eq!(france["answers"][0]["is_correct"], true);

    // Ids may arrive as strings from form-encoded clients
    let (status, answered) = send(
        &app,
        Method::POST,
        "/api/participant-answer",
        None,
        Some(
            &json!({
                "participant_id": participant_id.to_string(),
                "question_id": france["id"],
                "answer_id": paris
            })
            .to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered, json!({"success": true, "completed": false}));

    // An answer from another question is refused with 422
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/participant-answer",
        None,
        Some(
            &json!({"participant_id": participant_id, "question_id": spain["id"], "answer_id": paris})
                .to_string(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["timestamp"].is_string());

    let (_, answered) = send(
        &app,
        Method::POST,
        "/api/participant-answer",
        None,
        Some(
            &json!({"participant_id": participant_id, "question_id": spain["id"], "answer_id": barcelona})
                .to_string(),
        ),
    )
    .await;
    assert_eq!(answered["completed"], true);

    let (_, score) = send(
        &app,
        Method::GET,
        &format!("/api/participant-score?participant_id={participant_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(
        score,
        json!({"total_questions": 2, "answered_questions": 2, "correct_answers": 1})
    );

    let (_, wrong) = send(
        &app,
        Method::GET,
        &format!("/api/participant-wrong-answers?participant_id={participant_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(
        wrong,
        json!([{"question": "Spain?", "your_answer": "Barcelona", "correct_answer": "Madrid", "comment": ""}])
    );

    let (_, results) = send(
        &app,
        Method::GET,
        &format!("/api/quizzes/{quiz_id}/results"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(results[0]["nickname"], "Alice");
    assert_eq!(results[0]["correct_answers"], 1);
    assert!(!results[0]["completed_at"].is_null());

    let participant = db.participant(participant_id).await.unwrap().unwrap();
    assert!(participant.is_completed());
}

#[tokio::test]
async fn registration_records_client_info() {
    let (db, sql) = common::create_test_db_with_sql().await;
    let app = router(AppState::new(db.clone()));
    let (owner, _) = common::create_owner(&db, "author").await;
    db.seed_demo_quiz(owner).await.unwrap();

    let (_, registered) = send(
        &app,
        Method::POST,
        "/api/participant-register",
        None,
        Some(r#"{"quiz_code": "DEMO01", "nickname": "Alice"}"#),
    )
    .await;
    let participant_id = registered["participant_id"].as_i64().unwrap();

    let (ip, ua) = common::participant_client(&sql, participant_id)
        .await
        .expect("participant row");
    assert_eq!(ip, "203.0.113.9");
    assert_eq!(ua, "api-test");
}

#[tokio::test]
async fn participant_input_errors_use_the_error_envelope() {
    let (db, app) = app().await;
    let (owner, _) = common::create_owner(&db, "author").await;
    db.seed_demo_quiz(owner).await.unwrap();

    let cases = [
        (Method::POST, "/api/participant-register", Some(r#"{"quiz_code": "DEMO01", "nickname": " "}"#), StatusCode::BAD_REQUEST),
        (Method::POST, "/api/participant-register", Some(r#"{"quiz_code": "NOPE99", "nickname": "A"}"#), StatusCode::NOT_FOUND),
        (Method::POST, "/api/participant-register", Some("{not json"), StatusCode::BAD_REQUEST),
        (Method::POST, "/api/participant-answer", Some(r#"{"participant_id": 1}"#), StatusCode::BAD_REQUEST),
        (Method::POST, "/api/participant-answer", Some(r#"{"participant_id": 999, "question_id": 1, "answer_id": 1}"#), StatusCode::NOT_FOUND),
        (Method::GET, "/api/quiz-questions", None, StatusCode::BAD_REQUEST),
        (Method::GET, "/api/quiz-questions?code=NOPE99", None, StatusCode::NOT_FOUND),
        (Method::GET, "/api/participant-score", None, StatusCode::BAD_REQUEST),
        (Method::GET, "/api/participant-score?participant_id=abc", None, StatusCode::BAD_REQUEST),
        (Method::GET, "/api/participant-score?participant_id=999", None, StatusCode::NOT_FOUND),
        (Method::GET, "/api/no-such-route", None, StatusCode::NOT_FOUND),
    ];

    for (method, uri, body, expected) in cases {
        let (status, value) = send(&app, method, uri, None, body).await;
        assert_eq!(status, expected, "{uri} {body:?}");
        assert!(value["error"].is_string(), "{uri}: {value}");
        assert!(value["timestamp"].is_string(), "{uri}: {value}");
    }

    let (status, wrong) = send(
        &app,
        Method::GET,
        "/api/participant-wrong-answers?participant_id=999",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wrong, json!([]));
}

#[tokio::test]
async fn invalid_submissions_and_foreign_ids_are_input_errors() {
    let (db, app) = app().await;
    let (_, token) = common::create_owner(&db, "author").await;
    let (_, other_token) = common::create_owner(&db, "other").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/quizzes",
        Some(&token),
        Some(r#"{"title": "  ", "questions": []}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("title"));

    send(&app, Method::POST, "/api/quizzes", Some(&token), Some(&quiz_body())).await;
    let (_, list) = send(&app, Method::GET, "/api/quizzes", Some(&token), None).await;
    let quiz_id = list[0]["id"].as_i64().unwrap();

    let update = json!({
        "title": "Capitals",
        "questions": [
            {"id": 987654, "text": "Ghost", "answers": [{"text": "A"}, {"text": "B"}], "correct_index": 0}
        ]
    })
    .to_string();
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/quizzes/{quiz_id}"),
        Some(&token),
        Some(&update),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Another owner gets a soft failure, and the quiz is untouched
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/quizzes/{quiz_id}"),
        Some(&other_token),
        Some(&quiz_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/quizzes/{quiz_id}"),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/quizzes/{quiz_id}/status"),
        Some(&token),
        Some(r#"{"status": "published"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/quizzes/not-a-number",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reorder_and_delete_through_the_api() {
    let (db, app) = app().await;
    let (_, token) = common::create_owner(&db, "author").await;

    send(&app, Method::POST, "/api/quizzes", Some(&token), Some(&quiz_body())).await;
    let (_, list) = send(&app, Method::GET, "/api/quizzes", Some(&token), None).await;
    let quiz_id = list[0]["id"].as_i64().unwrap();
    let (_, edit) =
        send(&app, Method::GET, &format!("/api/quizzes/{quiz_id}"), Some(&token), None).await;
    let first = edit["questions"][0]["id"].as_i64().unwrap();
    let second = edit["questions"][1]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        Method::PUT,
        &format!("/api/quizzes/{quiz_id}/order"),
        Some(&token),
        Some(&json!({"question_ids": [second, first]}).to_string()),
    )
    .await;
    assert_eq!(body["success"], true);
    let (_, edit) =
        send(&app, Method::GET, &format!("/api/quizzes/{quiz_id}"), Some(&token), None).await;
    assert_eq!(edit["questions"][0]["id"], second);

    let (_, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/questions/{second}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["success"], true);

    let (_, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/quizzes/{quiz_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["success"], true);

    let (_, list) = send(&app, Method::GET, "/api/quizzes", Some(&token), None).await;
    assert_eq!(list, json!([]));
}
