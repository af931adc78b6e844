use color_eyre::Result;

use super::models::{ParticipantModel, ProgressCounts};
use super::Db;

impl Db {
    pub async fn create_participant(
        &self,
        quiz_id: i64,
        nickname: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<i64> {
        let participant_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO participants (quiz_id, nickname, ip_address, user_agent, started_at)
            VALUES (?, ?, ?, ?, datetime('now'))
            RETURNING id
            "#,
        )
        .bind(quiz_id)
        .bind(nickname)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("participant {participant_id} registered for quiz {quiz_id}");
        Ok(participant_id)
    }

    pub async fn participant(&self, participant_id: i64) -> Result<Option<ParticipantModel>> {
        let participant = sqlx::query_as::<_, ParticipantModel>(
            r#"
            SELECT
              p.id,
              p.quiz_id,
              p.nickname,
              p.started_at,
              p.completed_at,
              q.status = 'active' AS quiz_active
            FROM participants p
            JOIN quizzes q ON q.id = p.quiz_id
            WHERE p.id = ?
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    /// True when `answer_id` is a choice of `question_id` and that question
    /// belongs to `quiz_id`.
    pub async fn answer_in_quiz(
        &self,
        quiz_id: i64,
        question_id: i64,
        answer_id: i64,
    ) -> Result<bool> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
              SELECT 1
              FROM answers a
              JOIN questions q ON q.id = a.question_id
              WHERE a.id = ? AND a.question_id = ? AND q.quiz_id = ?
            )
            "#,
        )
        .bind(answer_id)
        .bind(question_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    /// One progress row per (participant, question); a later choice replaces
    /// the earlier one.
    pub async fn upsert_progress(
        &self,
        participant_id: i64,
        question_id: i64,
        answer_id: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO participant_progress (participant_id, question_id, chosen_answer_id, answered_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT(participant_id, question_id) DO UPDATE SET
                chosen_answer_id = excluded.chosen_answer_id,
                answered_at = excluded.answered_at
            "#,
        )
        .bind(participant_id)
        .bind(question_id)
        .bind(answer_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The total is the quiz's question count right now, not at registration.
    pub async fn progress_counts(&self, participant_id: i64) -> Result<ProgressCounts> {
        let counts = sqlx::query_as::<_, ProgressCounts>(
            r#"
            SELECT
              (SELECT COUNT(*)
                 FROM questions q
                 JOIN participants p ON p.quiz_id = q.quiz_id
                WHERE p.id = ?1) AS total_questions,
              (SELECT COUNT(*)
                 FROM participant_progress
                WHERE participant_id = ?1) AS answered_questions
            "#,
        )
        .bind(participant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Stamp `completed_at` once. Returns false if it was already set.
    pub async fn mark_completed(&self, participant_id: i64) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE participants SET completed_at = datetime('now') WHERE id = ? AND completed_at IS NULL",
        )
        .bind(participant_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            tracing::info!("participant {participant_id} completed their quiz");
        }
        Ok(updated > 0)
    }
}
