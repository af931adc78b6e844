#![allow(dead_code)]

use quizcode::db::{Db, QuizStatus};
use quizcode::models::{AnswerSubmission, QuestionSubmission, QuizSubmission};
use sqlx::SqlitePool;

pub async fn create_test_db() -> Db {
    create_test_db_with_sql().await.0
}

/// A fresh database plus a second pool on the same file, for assertions on
/// rows the API never returns.
pub async fn create_test_db_with_sql() -> (Db, SqlitePool) {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("quizcode_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}", path.display());
    let db = Db::new(&url).await.expect("failed to create test database");
    let sql = SqlitePool::connect(&url).await.expect("second pool");
    (db, sql)
}

pub async fn migration_applied(sql: &SqlitePool, version: &str) -> bool {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?)")
        .bind(version)
        .fetch_one(sql)
        .await
        .expect("schema_migrations query")
}

pub async fn chosen_answer(sql: &SqlitePool, participant_id: i64, question_id: i64) -> Option<i64> {
    sqlx::query_scalar(
        "SELECT chosen_answer_id FROM participant_progress \
         WHERE participant_id = ? AND question_id = ?",
    )
    .bind(participant_id)
    .bind(question_id)
    .fetch_optional(sql)
    .await
    .expect("progress query")
}

/// `(ip_address, user_agent)` captured at registration.
pub async fn participant_client(sql: &SqlitePool, participant_id: i64) -> Option<(String, String)> {
    sqlx::query_as("SELECT ip_address, user_agent FROM participants WHERE id = ?")
        .bind(participant_id)
        .fetch_optional(sql)
        .await
        .expect("participant query")
}

/// Owner account plus a bearer token for it.
pub async fn create_owner(db: &Db, username: &str) -> (i64, String) {
    let user_id = db
        .create_user(username, &format!("{username}@example.com"))
        .await
        .expect("create user");
    let token = db.create_user_token(user_id).await.expect("create token");
    (user_id, token)
}

pub fn question(text: &str, answers: &[&str], correct_index: usize) -> QuestionSubmission {
    QuestionSubmission {
        id: None,
        text: text.to_string(),
        comment: String::new(),
        answers: answers
            .iter()
            .map(|a| AnswerSubmission {
                id: None,
                text: a.to_string(),
            })
            .collect(),
        correct_index,
    }
}

pub fn submission(title: &str, questions: Vec<QuestionSubmission>) -> QuizSubmission {
    QuizSubmission {
        title: title.to_string(),
        description: String::new(),
        randomize_questions: false,
        randomize_answers: false,
        questions,
    }
}

/// Three questions with four answers each; the first answer is always correct.
pub fn three_questions() -> Vec<QuestionSubmission> {
    (1..=3)
        .map(|i| {
            let answers = [
                format!("Right {i}"),
                format!("Wrong {i}a"),
                format!("Wrong {i}b"),
                format!("Wrong {i}c"),
            ];
            let answers: Vec<&str> = answers.iter().map(String::as_str).collect();
            question(&format!("Question {i}"), &answers, 0)
        })
        .collect()
}

/// Create a quiz from `questions` and return `(quiz_id, code)`.
pub async fn create_quiz(
    db: &Db,
    owner_id: i64,
    questions: Vec<QuestionSubmission>,
) -> (i64, String) {
    let draft = submission("Test quiz", questions)
        .validate()
        .expect("valid submission");
    let code = db.create_quiz(owner_id, &draft).await.expect("create quiz");
    let quiz_id = db
        .quizzes(owner_id)
        .await
        .expect("list quizzes")
        .into_iter()
        .find(|q| q.code == code)
        .expect("created quiz is listed")
        .id;
    (quiz_id, code)
}

/// Same as `create_quiz`, but already open for participants.
pub async fn create_active_quiz(
    db: &Db,
    owner_id: i64,
    questions: Vec<QuestionSubmission>,
) -> (i64, String) {
    let (quiz_id, code) = create_quiz(db, owner_id, questions).await;
    assert!(db
        .set_quiz_status(quiz_id, owner_id, QuizStatus::Active)
        .await
        .expect("activate quiz"));
    (quiz_id, code)
}
