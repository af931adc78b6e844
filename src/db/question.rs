use color_eyre::Result;

use super::models::{AnswerModel, QuestionAnswerRow, QuestionModel};
use super::Db;

impl Db {
    /// All questions of a quiz with their answers, ordered by
    /// `order_index`, then question id, answers by id.
    pub async fn questions_with_answers(&self, quiz_id: i64) -> Result<Vec<QuestionModel>> {
        let rows = sqlx::query_as::<_, QuestionAnswerRow>(
            r#"
            SELECT
              q.id AS question_id,
              q.text AS question_text,
              q.comment,
              q.order_index,
              a.id AS answer_id,
              a.text AS answer_text,
              a.is_correct
            FROM questions q
            LEFT JOIN answers a ON a.question_id = q.id
            WHERE q.quiz_id = ?
            ORDER BY q.order_index, q.id, a.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rows(rows))
    }

    /// Deletes cascade to the question's answers and any progress rows.
    pub async fn delete_question(&self, question_id: i64, owner_id: i64) -> Result<bool> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM questions
            WHERE id = ? AND quiz_id IN (SELECT id FROM quizzes WHERE owner_id = ?)
            "#,
        )
        .bind(question_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if deleted == 0 {
            tracing::warn!("question delete denied: question_id={question_id} owner_id={owner_id}");
            return Ok(false);
        }

        tracing::info!("question deleted with id: {question_id} by owner_id: {owner_id}");
        Ok(true)
    }

    pub(crate) async fn answers_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        question_id: i64,
    ) -> Result<Vec<AnswerModel>> {
        let answers = sqlx::query_as::<_, AnswerModel>(
            "SELECT id, text, is_correct FROM answers WHERE question_id = ? ORDER BY id",
        )
        .bind(question_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(answers)
    }
}

/// Fold the joined rows back into questions. Rows must arrive grouped by question.
fn group_rows(rows: Vec<QuestionAnswerRow>) -> Vec<QuestionModel> {
    let mut questions: Vec<QuestionModel> = Vec::new();

    for row in rows {
        let is_same = questions
            .last()
            .is_some_and(|q: &QuestionModel| q.id == row.question_id);

        if !is_same {
            questions.push(QuestionModel {
                id: row.question_id,
                text: row.question_text,
                comment: row.comment,
                order_index: row.order_index,
                answers: Vec::new(),
            });
        }

        if let (Some(id), Some(text), Some(current)) =
            (row.answer_id, row.answer_text, questions.last_mut())
        {
            current.answers.push(AnswerModel {
                id,
                text,
                is_correct: row.is_correct.unwrap_or(false),
            });
        }
    }

    questions
}
