use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{ParticipantResult, QuizEditModel, QuizStatus, QuizSummary, UpdateOutcome},
    extractors::AuthGuard,
    models::QuizSubmission,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quizzes", get(list_quizzes).post(create_quiz))
        .route(
            "/api/quizzes/{id}",
            get(edit_quiz).put(update_quiz).delete(delete_quiz),
        )
        .route("/api/quizzes/{id}/status", put(set_status))
        .route("/api/quizzes/{id}/order", put(reorder_questions))
        .route("/api/quizzes/{id}/results", get(quiz_results))
        .route("/api/questions/{id}", delete(delete_question))
}

#[derive(Deserialize)]
struct StatusBody {
    status: QuizStatus,
}

#[derive(Deserialize)]
struct OrderBody {
    question_ids: Vec<i64>,
}

fn success(ok: bool) -> Json<Value> {
    Json(json!({ "success": ok }))
}

async fn list_quizzes(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizSummary>>, AppError> {
    let quizzes = state
        .db
        .quizzes(user.id)
        .await
        .reject("failed to get quizzes")?;
    Ok(Json(quizzes))
}

async fn create_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    body: Result<Json<QuizSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(submission) = body?;
    let draft = submission.validate().reject_input("invalid quiz")?;

    let code = state
        .db
        .create_quiz(user.id, &draft)
        .await
        .reject("failed to create quiz")?;

    Ok((StatusCode::CREATED, Json(json!({ "code": code }))))
}

async fn edit_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<QuizEditModel>, AppError> {
    let Path(quiz_id) = path?;

    state
        .db
        .quiz_for_edit(quiz_id, user.id)
        .await
        .reject("failed to load quiz")?
        .map(Json)
        .ok_or(AppError::NotFound("quiz not found"))
}

async fn update_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<QuizSubmission>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(quiz_id) = path?;
    let Json(submission) = body?;
    let draft = submission.validate().reject_input("invalid quiz")?;

    let outcome = state
        .db
        .update_quiz(quiz_id, user.id, &draft)
        .await
        .reject("failed to update quiz")?;

    match outcome {
        UpdateOutcome::Updated => Ok(success(true)),
        UpdateOutcome::Denied => Ok(success(false)),
        UpdateOutcome::UnknownQuestion(id) => Err(AppError::Input(format!(
            "question {id} does not belong to this quiz"
        ))),
        UpdateOutcome::ForeignAnswer(id) => Err(AppError::Input(format!(
            "answer {id} does not belong to its question"
        ))),
    }
}

async fn delete_quiz(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(quiz_id) = path?;

    let deleted = state
        .db
        .delete_quiz(quiz_id, user.id)
        .await
        .reject("failed to delete quiz")?;
    Ok(success(deleted))
}

async fn set_status(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(quiz_id) = path?;
    let Json(body) = body?;

    let updated = state
        .db
        .set_quiz_status(quiz_id, user.id, body.status)
        .await
        .reject("failed to change quiz status")?;
    Ok(success(updated))
}

async fn reorder_questions(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<OrderBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(quiz_id) = path?;
    let Json(body) = body?;

    let reordered = state
        .db
        .reorder_questions(quiz_id, user.id, &body.question_ids)
        .await
        .reject("failed to reorder questions")?;
    Ok(success(reordered))
}

async fn quiz_results(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<ParticipantResult>>, AppError> {
    let Path(quiz_id) = path?;

    state
        .db
        .quiz_results(quiz_id, user.id)
        .await
        .reject("failed to load results")?
        .map(Json)
        .ok_or(AppError::NotFound("quiz not found"))
}

async fn delete_question(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(question_id) = path?;

    let deleted = state
        .db
        .delete_question(question_id, user.id)
        .await
        .reject("failed to delete question")?;
    Ok(success(deleted))
}
