use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::db::QuizOptions;
use crate::randomize::MIN_ANSWERS;

/// Author's create/edit payload, exactly as it arrives on the wire.
#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub randomize_questions: bool,
    #[serde(default)]
    pub randomize_answers: bool,
    #[serde(default)]
    pub questions: Vec<QuestionSubmission>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionSubmission {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub answers: Vec<AnswerSubmission>,
    /// Index into `answers` of the single correct choice.
    pub correct_index: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnswerSubmission {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("quiz title is required")]
    EmptyTitle,
    #[error("question {0} needs at least two non-empty answers")]
    TooFewAnswers(usize),
    #[error("question {0} has no valid correct answer")]
    MissingCorrectAnswer(usize),
    #[error("question id {0} appears more than once")]
    DuplicateQuestion(i64),
    #[error("answer id {0} appears more than once")]
    DuplicateAnswer(i64),
}

/// A validated submission. Every question in it is writable as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub description: Option<String>,
    pub options: QuizOptions,
    pub questions: Vec<QuestionDraft>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: Option<i64>,
    /// Submission position + 1; only used when the question is inserted.
    pub order_index: i64,
    pub text: String,
    pub comment: Option<String>,
    pub answers: Vec<AnswerDraft>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerDraft {
    pub id: Option<i64>,
    pub text: String,
    pub is_correct: bool,
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl QuizSubmission {
    pub fn validate(self) -> Result<QuizDraft, SubmissionError> {
        let title = non_empty(&self.title).ok_or(SubmissionError::EmptyTitle)?;

        let mut question_ids = HashSet::new();
        let mut answer_ids = HashSet::new();
        let mut questions = Vec::with_capacity(self.questions.len());

        for (idx, q) in self.questions.into_iter().enumerate() {
            let position = idx + 1;

            let Some(text) = non_empty(&q.text) else {
                continue;
            };

            if let Some(id) = q.id {
                if !question_ids.insert(id) {
                    return Err(SubmissionError::DuplicateQuestion(id));
                }
            }

            let mut answers = Vec::with_capacity(q.answers.len());
            let mut has_correct = false;
            for (answer_idx, a) in q.answers.into_iter().enumerate() {
                let Some(answer_text) = non_empty(&a.text) else {
                    continue;
                };
                if let Some(id) = a.id {
                    if !answer_ids.insert(id) {
                        return Err(SubmissionError::DuplicateAnswer(id));
                    }
                }
                let is_correct = answer_idx == q.correct_index;
                has_correct |= is_correct;
                answers.push(AnswerDraft {
                    id: a.id,
                    text: answer_text,
                    is_correct,
                });
            }

            if answers.len() < MIN_ANSWERS {
                // New questions are imported leniently; edits of stored ones are not.
                if q.id.is_none() {
                    continue;
                }
                return Err(SubmissionError::TooFewAnswers(position));
            }

            if !has_correct {
                return Err(SubmissionError::MissingCorrectAnswer(position));
            }

            questions.push(QuestionDraft {
                id: q.id,
                order_index: position as i64,
                text,
                comment: non_empty(&q.comment),
                answers,
            });
        }

        Ok(QuizDraft {
            title,
            description: non_empty(&self.description),
            options: QuizOptions {
                randomize_questions: self.randomize_questions,
                randomize_answers: self.randomize_answers,
            },
            questions,
        })
    }
}
