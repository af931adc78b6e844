use std::collections::HashSet;

use color_eyre::{eyre::eyre, Result};
use rand::{rngs::StdRng, SeedableRng};
use sqlx::{Sqlite, Transaction};

use super::models::{QuizEditModel, QuizModel, QuizOptions, QuizStatus, QuizSummary};
use super::Db;
use crate::codes::{self, MAX_CODE_ATTEMPTS};
use crate::models::{AnswerDraft, QuestionDraft, QuizDraft};
use crate::reconcile;

pub const DEMO_CODE: &str = "DEMO01";

/// Result of applying an edit. Everything except `Updated` rolled back.
#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// Zero rows matched `quiz_id AND owner_id`: not yours, or not there.
    Denied,
    /// A submitted question id is not part of this quiz.
    UnknownQuestion(i64),
    /// A submitted answer id is not part of its question.
    ForeignAnswer(i64),
}

impl Db {
    /// Insert a quiz, its options and every question atomically.
    /// Returns the generated public code.
    pub async fn create_quiz(&self, owner_id: i64, draft: &QuizDraft) -> Result<String> {
        let mut tx = self.pool.begin().await?;

        let (quiz_id, code) = Self::insert_quiz_tx(&mut tx, owner_id, draft).await?;

        Self::upsert_options_tx(&mut tx, quiz_id, draft.options).await?;

        // Create never reuses ids from the payload
        for question in &draft.questions {
            Self::insert_question_tx(&mut tx, quiz_id, question).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "new quiz created with id: {quiz_id}, code: {code} for owner_id: {owner_id} ({} questions)",
            draft.questions.len()
        );
        Ok(code)
    }

    /// Reconcile the stored quiz with `draft`: quiz fields and options are
    /// overwritten, id-bearing questions are edited in place, the rest appended.
    pub async fn update_quiz(
        &self,
        quiz_id: i64,
        owner_id: i64,
        draft: &QuizDraft,
    ) -> Result<UpdateOutcome> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE quizzes SET title = ?, description = ?, updated_at = datetime('now')
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(quiz_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tracing::warn!("quiz update denied: quiz_id={quiz_id} owner_id={owner_id}");
            return Ok(UpdateOutcome::Denied);
        }

        Self::upsert_options_tx(&mut tx, quiz_id, draft.options).await?;

        for question in &draft.questions {
            let Some(question_id) = question.id else {
                Self::insert_question_tx(&mut tx, quiz_id, question).await?;
                continue;
            };

            let matched = sqlx::query(
                "UPDATE questions SET text = ?, comment = ? WHERE id = ? AND quiz_id = ?",
            )
            .bind(&question.text)
            .bind(&question.comment)
            .bind(question_id)
            .bind(quiz_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if matched == 0 {
                tracing::warn!("question {question_id} is not part of quiz {quiz_id}");
                return Ok(UpdateOutcome::UnknownQuestion(question_id));
            }

            let stored = Self::answers_tx(&mut tx, question_id).await?;
            let plan = match reconcile::plan_answers(&stored, &question.answers) {
                Ok(plan) => plan,
                Err(reconcile::ReconcileError::ForeignAnswer(answer_id)) => {
                    tracing::warn!("answer {answer_id} is not part of question {question_id}");
                    return Ok(UpdateOutcome::ForeignAnswer(answer_id));
                }
            };

            for answer in &plan.updates {
                sqlx::query(
                    "UPDATE answers SET text = ?, is_correct = ? WHERE id = ? AND question_id = ?",
                )
                .bind(&answer.text)
                .bind(answer.is_correct)
                .bind(answer.id)
                .bind(question_id)
                .execute(&mut *tx)
                .await?;
            }

            Self::insert_answers_tx(&mut tx, question_id, &plan.inserts).await?;

            for answer_id in &plan.deletes {
                sqlx::query("DELETE FROM answers WHERE id = ? AND question_id = ?")
                    .bind(answer_id)
                    .bind(question_id)
                    .execute(&mut *tx)
                    .await?;
            }

            tracing::debug!(
                "question {question_id}: {} updated, {} inserted, {} deleted answers",
                plan.updates.len(),
                plan.inserts.len(),
                plan.deletes.len()
            );
        }

        tx.commit().await?;

        tracing::info!("quiz updated with id: {quiz_id} by owner_id: {owner_id}");
        Ok(UpdateOutcome::Updated)
    }

    pub async fn delete_quiz(&self, quiz_id: i64, owner_id: i64) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM quizzes WHERE id = ? AND owner_id = ?")
            .bind(quiz_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            tracing::warn!("quiz delete denied: quiz_id={quiz_id} owner_id={owner_id}");
            return Ok(false);
        }

        tracing::info!("quiz deleted with id: {quiz_id} by owner_id: {owner_id}");
        Ok(true)
    }

    pub async fn set_quiz_status(
        &self,
        quiz_id: i64,
        owner_id: i64,
        status: QuizStatus,
    ) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE quizzes SET status = ?, updated_at = datetime('now') WHERE id = ? AND owner_id = ?",
        )
        .bind(status)
        .bind(quiz_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            tracing::warn!("quiz status change denied: quiz_id={quiz_id} owner_id={owner_id}");
            return Ok(false);
        }

        tracing::info!(
            "quiz {quiz_id} status -> {} by owner_id: {owner_id}",
            status.as_str()
        );
        Ok(true)
    }

    /// Give the listed questions `order_index` 1..=n in list order.
    /// Any id outside the owner's quiz leaves the order untouched.
    pub async fn reorder_questions(
        &self,
        quiz_id: i64,
        owner_id: i64,
        question_ids: &[i64],
    ) -> Result<bool> {
        let mut seen = HashSet::new();
        if !question_ids.iter().all(|id| seen.insert(*id)) {
            tracing::warn!("reorder of quiz {quiz_id} refused: duplicate question ids");
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        // Owner check doubles as the write that takes the lock
        let owned = sqlx::query(
            "UPDATE quizzes SET updated_at = datetime('now') WHERE id = ? AND owner_id = ?",
        )
        .bind(quiz_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if owned == 0 {
            tracing::warn!("reorder denied: quiz_id={quiz_id} owner_id={owner_id}");
            return Ok(false);
        }

        for (position, question_id) in question_ids.iter().enumerate() {
            let matched =
                sqlx::query("UPDATE questions SET order_index = ? WHERE id = ? AND quiz_id = ?")
                    .bind(position as i64 + 1)
                    .bind(question_id)
                    .bind(quiz_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

            if matched == 0 {
                tracing::warn!("reorder of quiz {quiz_id} refused: unknown question {question_id}");
                return Ok(false);
            }
        }

        tx.commit().await?;

        tracing::info!("reordered {} questions of quiz {quiz_id}", question_ids.len());
        Ok(true)
    }

    pub async fn quizzes(&self, owner_id: i64) -> Result<Vec<QuizSummary>> {
        let quizzes = sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT
              q.id,
              q.title,
              q.code,
              q.status,
              (SELECT COUNT(*) FROM questions WHERE quiz_id = q.id) AS question_count,
              (SELECT COUNT(*) FROM participants WHERE quiz_id = q.id) AS participant_count
            FROM quizzes q
            WHERE q.owner_id = ?
            ORDER BY q.id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    pub async fn quiz_for_edit(
        &self,
        quiz_id: i64,
        owner_id: i64,
    ) -> Result<Option<QuizEditModel>> {
        let quiz = sqlx::query_as::<_, QuizModel>(
            "SELECT id, title, description, code, status, owner_id FROM quizzes WHERE id = ? AND owner_id = ?",
        )
        .bind(quiz_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(quiz) = quiz else {
            return Ok(None);
        };

        let options = self.quiz_options(quiz.id).await?;
        let questions = self.questions_with_answers(quiz.id).await?;

        Ok(Some(QuizEditModel {
            quiz,
            options,
            questions,
        }))
    }

    /// Only active quizzes can be found by participants.
    pub async fn active_quiz_by_code(&self, code: &str) -> Result<Option<QuizModel>> {
        let quiz = sqlx::query_as::<_, QuizModel>(
            r#"
            SELECT id, title, description, code, status, owner_id
            FROM quizzes
            WHERE code = ? AND status = 'active'
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quiz)
    }

    /// Options default to "no shuffling" until the first save writes a row.
    pub async fn quiz_options(&self, quiz_id: i64) -> Result<QuizOptions> {
        let options = sqlx::query_as::<_, QuizOptions>(
            "SELECT randomize_questions, randomize_answers FROM quiz_options WHERE quiz_id = ?",
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(options.unwrap_or_default())
    }

    /// Insert the active demo quiz `DEMO01` unless it is already there.
    pub async fn seed_demo_quiz(&self, owner_id: i64) -> Result<i64> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM quizzes WHERE code = ?")
            .bind(DEMO_CODE)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(quiz_id) = existing {
            return Ok(quiz_id);
        }

        let mut tx = self.pool.begin().await?;

        let quiz_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO quizzes (title, description, code, owner_id, status, created_at, updated_at)
            VALUES ('Demo quiz', 'A sample quiz', ?, ?, 'active', datetime('now'), datetime('now'))
            RETURNING id
            "#,
        )
        .bind(DEMO_CODE)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::upsert_options_tx(
            &mut tx,
            quiz_id,
            QuizOptions {
                randomize_questions: true,
                randomize_answers: true,
            },
        )
        .await?;

        for question in demo_questions() {
            Self::insert_question_tx(&mut tx, quiz_id, &question).await?;
        }

        tx.commit().await?;

        tracing::info!("demo quiz seeded with id: {quiz_id} for owner_id: {owner_id}");
        Ok(quiz_id)
    }

    /// Draw codes until one inserts. The INSERT is the first statement of the
    /// transaction, so it takes the write lock before anything is read.
    async fn insert_quiz_tx(
        tx: &mut Transaction<'_, Sqlite>,
        owner_id: i64,
        draft: &QuizDraft,
    ) -> Result<(i64, String)> {
        let mut rng = StdRng::from_entropy();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = codes::random_code(&mut rng);
            let inserted: Option<i64> = sqlx::query_scalar(
                r#"
                INSERT INTO quizzes (title, description, code, owner_id, status, created_at, updated_at)
                VALUES (?, ?, ?, ?, 'draft', datetime('now'), datetime('now'))
                ON CONFLICT(code) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(&code)
            .bind(owner_id)
            .fetch_optional(&mut **tx)
            .await?;

            if let Some(quiz_id) = inserted {
                return Ok((quiz_id, code));
            }

            tracing::warn!("quiz code {code} already taken, drawing another");
        }

        Err(eyre!(
            "no free quiz code found after {MAX_CODE_ATTEMPTS} attempts"
        ))
    }

    async fn upsert_options_tx(
        tx: &mut Transaction<'_, Sqlite>,
        quiz_id: i64,
        options: QuizOptions,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO quiz_options (quiz_id, randomize_questions, randomize_answers, created_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT(quiz_id) DO UPDATE SET
                randomize_questions = excluded.randomize_questions,
                randomize_answers = excluded.randomize_answers
            "#,
        )
        .bind(quiz_id)
        .bind(options.randomize_questions)
        .bind(options.randomize_answers)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn insert_question_tx(
        tx: &mut Transaction<'_, Sqlite>,
        quiz_id: i64,
        question: &QuestionDraft,
    ) -> Result<i64> {
        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (quiz_id, text, comment, order_index, created_at)
            VALUES (?, ?, ?, ?, datetime('now'))
            RETURNING id
            "#,
        )
        .bind(quiz_id)
        .bind(&question.text)
        .bind(&question.comment)
        .bind(question.order_index)
        .fetch_one(&mut **tx)
        .await?;

        Self::insert_answers_tx(tx, question_id, &question.answers).await?;

        Ok(question_id)
    }

    async fn insert_answers_tx(
        tx: &mut Transaction<'_, Sqlite>,
        question_id: i64,
        answers: &[AnswerDraft],
    ) -> Result<()> {
        for answer in answers {
            sqlx::query(
                "INSERT INTO answers (question_id, text, is_correct, created_at) VALUES (?, ?, ?, datetime('now'))",
            )
            .bind(question_id)
            .bind(&answer.text)
            .bind(answer.is_correct)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

fn demo_questions() -> Vec<QuestionDraft> {
    let question = |order_index: i64, text: &str, answers: [&str; 4], correct: usize| {
        QuestionDraft {
            id: None,
            order_index,
            text: text.to_string(),
            comment: None,
            answers: answers
                .iter()
                .enumerate()
                .map(|(i, a)| AnswerDraft {
                    id: None,
                    text: a.to_string(),
                    is_correct: i == correct,
                })
                .collect(),
        }
    };

    vec![
        question(
            1,
            "What is the capital of France?",
            ["Paris", "Lyon", "Marseille", "Toulouse"],
            0,
        ),
        question(2, "How much is 2 + 2?", ["3", "4", "5", "22"], 1),
        question(
            3,
            "Which language is this server written in?",
            ["Rust", "Python", "Java", "Ruby"],
            0,
        ),
    ]
}
