//! Three-way diff between a stored question's answers and an edit of them.
//!
//! Submitted answers with an id update that row, answers without one are
//! inserted, and stored answers whose id is absent from the edit are deleted.
//! Identity is decided by id alone, never by text.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::db::AnswerModel;
use crate::models::AnswerDraft;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnswerPlan {
    pub updates: Vec<AnswerModel>,
    pub inserts: Vec<AnswerDraft>,
    pub deletes: Vec<i64>,
}

impl AnswerPlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("answer {0} does not belong to this question")]
    ForeignAnswer(i64),
}

pub fn plan_answers(
    stored: &[AnswerModel],
    submitted: &[AnswerDraft],
) -> Result<AnswerPlan, ReconcileError> {
    let by_id: HashMap<i64, &AnswerModel> = stored.iter().map(|a| (a.id, a)).collect();
    let mut kept = HashSet::new();
    let mut plan = AnswerPlan::default();

    for answer in submitted {
        match answer.id {
            Some(id) => {
                let current = by_id.get(&id).ok_or(ReconcileError::ForeignAnswer(id))?;
                kept.insert(id);
                // Unchanged rows produce no write
                if current.text != answer.text || current.is_correct != answer.is_correct {
                    plan.updates.push(AnswerModel {
                        id,
                        text: answer.text.clone(),
                        is_correct: answer.is_correct,
                    });
                }
            }
            None => plan.inserts.push(answer.clone()),
        }
    }

    plan.deletes = stored
        .iter()
        .map(|a| a.id)
        .filter(|id| !kept.contains(id))
        .collect();

    Ok(plan)
}
