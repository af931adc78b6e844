use color_eyre::Result;

use super::models::{ParticipantResult, ScoreModel, WrongAnswerModel};
use super::Db;

impl Db {
    /// `None` for an unknown participant. The denominator follows later edits
    /// of the quiz.
    pub async fn score(&self, participant_id: i64) -> Result<Option<ScoreModel>> {
        let score = sqlx::query_as::<_, ScoreModel>(
            r#"
            SELECT
              (SELECT COUNT(*) FROM questions WHERE quiz_id = p.quiz_id) AS total_questions,
              (SELECT COUNT(*) FROM participant_progress WHERE participant_id = p.id) AS answered_questions,
              (SELECT COUNT(*)
                 FROM participant_progress pp
                 JOIN answers a ON a.id = pp.chosen_answer_id
                WHERE pp.participant_id = p.id AND a.is_correct = 1) AS correct_answers
            FROM participants p
            WHERE p.id = ?
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(score)
    }

    /// Incorrectly answered questions in presentation order, each paired with
    /// the correct choice. Questions without a correct answer are left out.
    pub async fn wrong_answers(&self, participant_id: i64) -> Result<Vec<WrongAnswerModel>> {
        let wrong = sqlx::query_as::<_, WrongAnswerModel>(
            r#"
            SELECT
              q.text AS question,
              chosen.text AS your_answer,
              correct.text AS correct_answer,
              COALESCE(q.comment, '') AS comment
            FROM participant_progress pp
            JOIN questions q ON q.id = pp.question_id
            JOIN answers chosen ON chosen.id = pp.chosen_answer_id
            JOIN answers correct ON correct.id = (
              SELECT MIN(id) FROM answers WHERE question_id = q.id AND is_correct = 1
            )
            WHERE pp.participant_id = ? AND chosen.is_correct = 0
            ORDER BY q.order_index, q.id
            "#,
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(wrong)
    }

    /// Leaderboard for one of the owner's quizzes: most correct first, then
    /// earliest finisher, unfinished participants last. `None` if the quiz is
    /// not the owner's.
    pub async fn quiz_results(
        &self,
        quiz_id: i64,
        owner_id: i64,
    ) -> Result<Option<Vec<ParticipantResult>>> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM quizzes WHERE id = ? AND owner_id = ?)",
        )
        .bind(quiz_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        if !owned {
            return Ok(None);
        }

        let results = sqlx::query_as::<_, ParticipantResult>(
            r#"
            SELECT
              p.id AS participant_id,
              p.nickname,
              p.started_at,
              p.completed_at,
              COUNT(pp.id) AS answered_questions,
              COALESCE(SUM(CASE WHEN a.is_correct = 1 THEN 1 ELSE 0 END), 0) AS correct_answers
            FROM participants p
            LEFT JOIN participant_progress pp ON pp.participant_id = p.id
            LEFT JOIN answers a ON a.id = pp.chosen_answer_id
            WHERE p.quiz_id = ?
            GROUP BY p.id, p.nickname, p.started_at, p.completed_at
            ORDER BY correct_answers DESC, p.completed_at IS NULL, p.completed_at, p.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(results))
    }
}
