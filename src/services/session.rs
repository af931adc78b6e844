use std::future::Future;

use color_eyre::Result;
use rand::{rngs::StdRng, SeedableRng};

use crate::codes;
use crate::db::{
    Db, ParticipantModel, ProgressCounts, QuestionModel, QuizModel, QuizOptions, ScoreModel,
    WrongAnswerModel,
};
use crate::randomize::{self, PublicQuestion};

// ---------------------------------------------------------------------------
// SessionRepository trait (the storage the participant flow needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait SessionRepository: Send + Sync {
    fn active_quiz_by_code(&self, code: &str)
        -> impl Future<Output = Result<Option<QuizModel>>> + Send;

    fn questions_with_answers(
        &self,
        quiz_id: i64,
    ) -> impl Future<Output = Result<Vec<QuestionModel>>> + Send;

    fn quiz_options(&self, quiz_id: i64) -> impl Future<Output = Result<QuizOptions>> + Send;

    fn create_participant(
        &self,
        quiz_id: i64,
        nickname: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> impl Future<Output = Result<i64>> + Send;

    fn participant(
        &self,
        participant_id: i64,
    ) -> impl Future<Output = Result<Option<ParticipantModel>>> + Send;

    fn answer_in_quiz(
        &self,
        quiz_id: i64,
        question_id: i64,
        answer_id: i64,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn upsert_progress(
        &self,
        participant_id: i64,
        question_id: i64,
        answer_id: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    fn progress_counts(
        &self,
        participant_id: i64,
    ) -> impl Future<Output = Result<ProgressCounts>> + Send;

    fn mark_completed(&self, participant_id: i64) -> impl Future<Output = Result<bool>> + Send;

    fn score(&self, participant_id: i64)
        -> impl Future<Output = Result<Option<ScoreModel>>> + Send;

    fn wrong_answers(
        &self,
        participant_id: i64,
    ) -> impl Future<Output = Result<Vec<WrongAnswerModel>>> + Send;
}

impl SessionRepository for Db {
    async fn active_quiz_by_code(&self, code: &str) -> Result<Option<QuizModel>> {
        Db::active_quiz_by_code(self, code).await
    }

    async fn questions_with_answers(&self, quiz_id: i64) -> Result<Vec<QuestionModel>> {
        Db::questions_with_answers(self, quiz_id).await
    }

    async fn quiz_options(&self, quiz_id: i64) -> Result<QuizOptions> {
        Db::quiz_options(self, quiz_id).await
    }

    async fn create_participant(
        &self,
        quiz_id: i64,
        nickname: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<i64> {
        Db::create_participant(self, quiz_id, nickname, ip_address, user_agent).await
    }

    async fn participant(&self, participant_id: i64) -> Result<Option<ParticipantModel>> {
        Db::participant(self, participant_id).await
    }

    async fn answer_in_quiz(&self, quiz_id: i64, question_id: i64, answer_id: i64) -> Result<bool> {
        Db::answer_in_quiz(self, quiz_id, question_id, answer_id).await
    }

    async fn upsert_progress(
        &self,
        participant_id: i64,
        question_id: i64,
        answer_id: i64,
    ) -> Result<()> {
        Db::upsert_progress(self, participant_id, question_id, answer_id).await
    }

    async fn progress_counts(&self, participant_id: i64) -> Result<ProgressCounts> {
        Db::progress_counts(self, participant_id).await
    }

    async fn mark_completed(&self, participant_id: i64) -> Result<bool> {
        Db::mark_completed(self, participant_id).await
    }

    async fn score(&self, participant_id: i64) -> Result<Option<ScoreModel>> {
        Db::score(self, participant_id).await
    }

    async fn wrong_answers(&self, participant_id: i64) -> Result<Vec<WrongAnswerModel>> {
        Db::wrong_answers(self, participant_id).await
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum QuestionsOutcome {
    /// Unknown code, or the quiz is not active.
    QuizNotFound,
    /// The quiz has no question with at least two answers.
    NoQuestions,
    Questions(Vec<PublicQuestion>),
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(i64),
    /// Code or nickname was blank.
    EmptyFields,
    QuizNotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Progress stored. `completed` reports the participant's state after the write.
    Recorded { completed: bool },
    UnknownParticipant,
    /// The participant's quiz was closed or moved back to draft.
    QuizInactive,
    /// The question is not in the participant's quiz, or the answer is not
    /// one of the question's choices. Nothing was written.
    InvalidChoice,
}

// ---------------------------------------------------------------------------
// SessionService
// ---------------------------------------------------------------------------

pub struct SessionService<R: SessionRepository = Db> {
    repo: R,
}

impl<R: SessionRepository + Clone> Clone for SessionService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: SessionRepository> SessionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The question set one participant sees, shuffled per the quiz options.
    pub async fn questions(&self, code: &str) -> Result<QuestionsOutcome> {
        let code = codes::normalize(code);
        let Some(quiz) = self.repo.active_quiz_by_code(&code).await? else {
            return Ok(QuestionsOutcome::QuizNotFound);
        };

        let stored = self.repo.questions_with_answers(quiz.id).await?;
        let options = self.repo.quiz_options(quiz.id).await?;

        let mut rng = StdRng::from_entropy();
        let questions = randomize::present(stored, options, &mut rng);

        if questions.is_empty() {
            return Ok(QuestionsOutcome::NoQuestions);
        }

        Ok(QuestionsOutcome::Questions(questions))
    }

    /// Not idempotent: every call creates a new participant.
    pub async fn register(
        &self,
        code: &str,
        nickname: &str,
        ip_address: &str,
        user_agent: &str,
    ) -> Result<RegisterOutcome> {
        let code = codes::normalize(code);
        let nickname = nickname.trim();

        if code.is_empty() || nickname.is_empty() {
            return Ok(RegisterOutcome::EmptyFields);
        }

        let Some(quiz) = self.repo.active_quiz_by_code(&code).await? else {
            tracing::warn!("registration for unknown or inactive quiz code {code}");
            return Ok(RegisterOutcome::QuizNotFound);
        };

        let participant_id = self
            .repo
            .create_participant(quiz.id, nickname, ip_address, user_agent)
            .await?;

        Ok(RegisterOutcome::Registered(participant_id))
    }

    /// Validate the (participant, question, answer) triple, upsert the choice
    /// and stamp completion the first time every question has an answer.
    pub async fn record_answer(
        &self,
        participant_id: i64,
        question_id: i64,
        answer_id: i64,
    ) -> Result<AnswerOutcome> {
        let Some(participant) = self.repo.participant(participant_id).await? else {
            return Ok(AnswerOutcome::UnknownParticipant);
        };

        if !participant.quiz_active {
            return Ok(AnswerOutcome::QuizInactive);
        }

        let valid = self
            .repo
            .answer_in_quiz(participant.quiz_id, question_id, answer_id)
            .await?;

        if !valid {
            tracing::warn!(
                "participant {participant_id} sent answer {answer_id} for question {question_id} outside quiz {}",
                participant.quiz_id
            );
            return Ok(AnswerOutcome::InvalidChoice);
        }

        self.repo
            .upsert_progress(participant_id, question_id, answer_id)
            .await?;

        tracing::info!(
            "participant {participant_id} answered question {question_id} with {answer_id}"
        );

        if participant.is_completed() {
            return Ok(AnswerOutcome::Recorded { completed: true });
        }

        let counts = self.repo.progress_counts(participant_id).await?;
        if !counts.is_complete() {
            return Ok(AnswerOutcome::Recorded { completed: false });
        }

        // A concurrent request may have stamped it first; either way it is done.
        self.repo.mark_completed(participant_id).await?;
        Ok(AnswerOutcome::Recorded { completed: true })
    }

    pub async fn score(&self, participant_id: i64) -> Result<Option<ScoreModel>> {
        self.repo.score(participant_id).await
    }

    pub async fn wrong_answers(&self, participant_id: i64) -> Result<Vec<WrongAnswerModel>> {
        self.repo.wrong_answers(participant_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
