//! Per-participant presentation of a quiz: filtering, ordering and shuffling.
//!
//! The output types carry no correctness flag, so nothing produced here can
//! leak which answer is right.

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::db::{QuestionModel, QuizOptions};

/// A question may only be served with at least this many answers.
pub const MIN_ANSWERS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub comment: String,
    pub answers: Vec<PublicAnswer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicAnswer {
    pub id: i64,
    pub text: String,
}

impl From<QuestionModel> for PublicQuestion {
    fn from(question: QuestionModel) -> Self {
        Self {
            id: question.id,
            text: question.text,
            comment: question.comment.unwrap_or_default(),
            answers: question
                .answers
                .into_iter()
                .map(|a| PublicAnswer {
                    id: a.id,
                    text: a.text,
                })
                .collect(),
        }
    }
}

/// Build the sequence one participant sees. `SliceRandom::shuffle` is a
/// Fisher-Yates shuffle, so every permutation is equally likely.
pub fn present<R: Rng + ?Sized>(
    questions: Vec<QuestionModel>,
    options: QuizOptions,
    rng: &mut R,
) -> Vec<PublicQuestion> {
    let mut questions: Vec<QuestionModel> = questions
        .into_iter()
        .filter(|q| q.answers.len() >= MIN_ANSWERS)
        .collect();

    questions.sort_by_key(|q| (q.order_index, q.id));
    for q in &mut questions {
        q.answers.sort_by_key(|a| a.id);
    }

    if options.randomize_questions {
        questions.shuffle(rng);
    }

    if options.randomize_answers {
        for q in &mut questions {
            q.answers.shuffle(rng);
        }
    }

    questions.into_iter().map(PublicQuestion::from).collect()
}
