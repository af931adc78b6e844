// Database model structs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Lifecycle of a quiz. Only `Active` quizzes are visible to participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum QuizStatus {
    Draft,
    Active,
    Closed,
}

impl QuizStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizStatus::Draft => "draft",
            QuizStatus::Active => "active",
            QuizStatus::Closed => "closed",
        }
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct QuizModel {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub code: String,
    pub status: QuizStatus,
    pub owner_id: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub status: QuizStatus,
    pub question_count: i64,
    pub participant_count: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QuizOptions {
    pub randomize_questions: bool,
    pub randomize_answers: bool,
}

/// One row of the question/answer LEFT JOIN, before grouping.
#[derive(sqlx::FromRow)]
pub(crate) struct QuestionAnswerRow {
    pub question_id: i64,
    pub question_text: String,
    pub comment: Option<String>,
    pub order_index: i64,
    pub answer_id: Option<i64>,
    pub answer_text: Option<String>,
    pub is_correct: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionModel {
    pub id: i64,
    pub text: String,
    pub comment: Option<String>,
    pub order_index: i64,
    pub answers: Vec<AnswerModel>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AnswerModel {
    pub id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Author-facing view of a whole quiz, correct flags included.
#[derive(Debug, Serialize)]
pub struct QuizEditModel {
    #[serde(flatten)]
    pub quiz: QuizModel,
    pub options: QuizOptions,
    pub questions: Vec<QuestionModel>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ParticipantModel {
    pub id: i64,
    pub quiz_id: i64,
    pub nickname: String,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub quiz_active: bool,
}

impl ParticipantModel {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct ProgressCounts {
    pub total_questions: i64,
    pub answered_questions: i64,
}

impl ProgressCounts {
    /// An empty quiz is never complete.
    pub fn is_complete(&self) -> bool {
        self.total_questions > 0 && self.answered_questions >= self.total_questions
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ScoreModel {
    pub total_questions: i64,
    pub answered_questions: i64,
    pub correct_answers: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct WrongAnswerModel {
    pub question: String,
    pub your_answer: String,
    pub correct_answer: String,
    pub comment: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ParticipantResult {
    pub participant_id: i64,
    pub nickname: String,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub answered_questions: i64,
    pub correct_answers: i64,
}
