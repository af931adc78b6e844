use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::{ScoreModel, WrongAnswerModel},
    extractors::ClientInfo,
    randomize::PublicQuestion,
    rejections::{AppError, ResultExt},
    services::session::{AnswerOutcome, QuestionsOutcome, RegisterOutcome},
    AppState,
};

use super::deserialize_string_or_i64;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quiz-questions", get(quiz_questions))
        .route("/api/participant-register", post(register))
        .route("/api/participant-answer", post(record_answer))
        .route("/api/participant-score", get(score))
        .route("/api/participant-wrong-answers", get(wrong_answers))
}

#[derive(Deserialize)]
struct CodeQuery {
    #[serde(default)]
    code: String,
}

#[derive(Deserialize)]
struct ParticipantQuery {
    participant_id: Option<i64>,
}

impl ParticipantQuery {
    fn id(&self) -> Result<i64, AppError> {
        self.participant_id
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Input("participant_id is required".to_string()))
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    #[serde(default)]
    quiz_code: String,
    #[serde(default)]
    nickname: String,
}

#[derive(Deserialize)]
struct AnswerBody {
    #[serde(default, deserialize_with = "deserialize_string_or_i64")]
    participant_id: i64,
    #[serde(default, deserialize_with = "deserialize_string_or_i64")]
    question_id: i64,
    #[serde(default, deserialize_with = "deserialize_string_or_i64")]
    answer_id: i64,
}

async fn quiz_questions(
    State(state): State<AppState>,
    query: Result<Query<CodeQuery>, QueryRejection>,
) -> Result<Json<Vec<PublicQuestion>>, AppError> {
    let Query(query) = query?;

    if query.code.trim().is_empty() {
        return Err(AppError::Input("quiz code is required".to_string()));
    }

    let outcome = state
        .sessions
        .questions(&query.code)
        .await
        .reject("failed to load questions")?;

    match outcome {
        QuestionsOutcome::Questions(questions) => Ok(Json(questions)),
        QuestionsOutcome::QuizNotFound => Err(AppError::NotFound("quiz not found or not active")),
        QuestionsOutcome::NoQuestions => Err(AppError::NotFound("quiz has no questions")),
    }
}

async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body?;

    let outcome = state
        .sessions
        .register(
            &body.quiz_code,
            &body.nickname,
            &client.ip_address,
            &client.user_agent,
        )
        .await
        .reject("failed to register participant")?;

    match outcome {
        RegisterOutcome::Registered(participant_id) => {
            Ok(Json(json!({ "participant_id": participant_id })))
        }
        RegisterOutcome::EmptyFields => Err(AppError::Input(
            "quiz_code and nickname are required".to_string(),
        )),
        RegisterOutcome::QuizNotFound => Err(AppError::NotFound("quiz not found or not active")),
    }
}

async fn record_answer(
    State(state): State<AppState>,
    body: Result<Json<AnswerBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body?;

    if body.participant_id <= 0 || body.question_id <= 0 || body.answer_id <= 0 {
        return Err(AppError::Input(
            "participant_id, question_id and answer_id are required".to_string(),
        ));
    }

    let outcome = state
        .sessions
        .record_answer(body.participant_id, body.question_id, body.answer_id)
        .await
        .reject("failed to record answer")?;

    match outcome {
        AnswerOutcome::Recorded { completed } => {
            Ok(Json(json!({ "success": true, "completed": completed })))
        }
        AnswerOutcome::UnknownParticipant => Err(AppError::NotFound("participant not found")),
        AnswerOutcome::QuizInactive => Err(AppError::NotFound("quiz not found or not active")),
        AnswerOutcome::InvalidChoice => Err(AppError::InvalidChoice(
            "answer does not belong to this question",
        )),
    }
}

async fn score(
    State(state): State<AppState>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> Result<Json<ScoreModel>, AppError> {
    let Query(query) = query?;

    state
        .sessions
        .score(query.id()?)
        .await
        .reject("failed to compute score")?
        .map(Json)
        .ok_or(AppError::NotFound("participant not found"))
}

async fn wrong_answers(
    State(state): State<AppState>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> Result<Json<Vec<WrongAnswerModel>>, AppError> {
    let Query(query) = query?;

    let wrong = state
        .sessions
        .wrong_answers(query.id()?)
        .await
        .reject("failed to load wrong answers")?;

    Ok(Json(wrong))
}
