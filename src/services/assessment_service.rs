use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        assessment::MaxAttempts,
        attempt::{AttemptOutcome, AttemptQuestion, AttemptResponse},
        question::OPTION_COUNT,
        Assessment, AssessmentAttempt, AssessmentConfig, AttemptStatus, Question,
    },
    repositories::{AssessmentRepository, AttemptRepository, QuestionRepository},
    services::{quiz_builder, scoring},
};

/// Rejects a new attempt when the user has used up their attempts, is still
/// cooling down from the last completed one, or has one still in progress.
pub fn check_attempt_allowed(
    config: &AssessmentConfig,
    prior: &[AssessmentAttempt],
    now: DateTime<Utc>,
) -> AppResult<()> {
    if let MaxAttempts::Limited(limit) = config.max_attempts {
        if prior.len() as u64 >= u64::from(limit) {
            return Err(AppError::AttemptLimitExceeded { limit });
        }
    }

    if let Some(cooldown) = config.cooldown()? {
        let last_completed = prior.iter().filter_map(|a| a.completed_at).max();
        if let Some(completed_at) = last_completed {
            let ready_at = completed_at.checked_add_signed(cooldown).ok_or_else(|| {
                AppError::ValidationError(format!(
                    "cooldown of {}s is out of range",
                    cooldown.num_seconds()
                ))
            })?;
            if now < ready_at {
                return Err(AppError::CooldownActive {
                    remaining: ready_at - now,
                });
            }
        }
    }

    if let Some(open) = prior
        .iter()
        .find(|a| a.status == AttemptStatus::InProgress)
    {
        return Err(AppError::Conflict(format!(
            "Attempt '{}' must be finalized before starting another",
            open.id
        )));
    }

    Ok(())
}

/// `Created -> InProgress`. The time limit starts counting here.
pub fn start(attempt: &mut AssessmentAttempt, now: DateTime<Utc>) -> AppResult<()> {
    if attempt.status != AttemptStatus::Created {
        return Err(AppError::AttemptNotActive(format!(
            "attempt '{}' is {:?} and cannot be started",
            attempt.id, attempt.status
        )));
    }
    attempt.status = AttemptStatus::InProgress;
    attempt.started_at = Some(now);
    Ok(())
}

/// Upserts the response for `question_id` and adjusts the running correct
/// count by the change in correctness. Returns whether the answer is correct.
pub fn apply_answer(
    attempt: &mut AssessmentAttempt,
    question_id: &str,
    selected_position: u8,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    match attempt.status {
        AttemptStatus::InProgress => {}
        AttemptStatus::Created => {
            return Err(AppError::AttemptNotActive(format!(
                "attempt '{}' has not been started",
                attempt.id
            )))
        }
        AttemptStatus::Completed => {
            return Err(AppError::AttemptNotActive(format!(
                "attempt '{}' is already completed",
                attempt.id
            )))
        }
    }

    if let Some(deadline) = attempt.deadline()? {
        if now >= deadline {
            return Err(AppError::AttemptNotActive(format!(
                "time limit for attempt '{}' expired at {}",
                attempt.id, deadline
            )));
        }
    }

    if selected_position as usize >= OPTION_COUNT {
        return Err(AppError::ValidationError(format!(
            "selected option must be between 0 and {}",
            OPTION_COUNT - 1
        )));
    }

    let correct_position = attempt
        .snapshot_for(question_id)
        .map(|q| q.correct_position)
        .ok_or_else(|| {
            AppError::ValidationError(format!(
                "question '{}' is not part of attempt '{}'",
                question_id, attempt.id
            ))
        })?;

    let is_correct = selected_position == correct_position;
    let previous = attempt.responses.insert(
        question_id.to_string(),
        AttemptResponse {
            question_id: question_id.to_string(),
            selected_position,
            is_correct,
            answered_at: now,
        },
    );
    let was_correct = previous.is_some_and(|r| r.is_correct);

    match (was_correct, is_correct) {
        (false, true) => attempt.correct_answers += 1,
        (true, false) => attempt.correct_answers -= 1,
        _ => {}
    }
    Ok(is_correct)
}

/// `InProgress -> Completed`, scoring the attempt exactly once.
pub fn complete(attempt: &mut AssessmentAttempt, now: DateTime<Utc>) -> AppResult<()> {
    match attempt.status {
        AttemptStatus::InProgress => {}
        AttemptStatus::Completed => return Err(AppError::AlreadyFinalized(attempt.id.clone())),
        AttemptStatus::Created => {
            return Err(AppError::AttemptNotActive(format!(
                "attempt '{}' has not been started",
                attempt.id
            )))
        }
    }

    let score = scoring::score_percentage(attempt.correct_answers, attempt.total_questions);
    let passed = scoring::is_passing(score, attempt.passing_threshold);

    attempt.score_percentage = Some(score);
    attempt.passed = passed;
    attempt.outcome = Some(if passed {
        AttemptOutcome::Passed
    } else {
        AttemptOutcome::Failed
    });
    attempt.completed_at = Some(now);
    attempt.status = AttemptStatus::Completed;
    Ok(())
}

#[derive(Clone, Debug)]
pub struct AssessmentSummary {
    pub assessment: Assessment,
    pub attempts_used: u32,
    pub last_attempt: Option<AssessmentAttempt>,
}

impl AssessmentSummary {
    pub fn attempts_remaining(&self) -> Option<u32> {
        match self.assessment.config.max_attempts {
            MaxAttempts::Limited(limit) => Some(limit.saturating_sub(self.attempts_used)),
            MaxAttempts::Unlimited => None,
        }
    }
}

/// A snapshot entry joined with its question, options in presented order.
#[derive(Clone, Debug)]
pub struct PresentedQuestion {
    pub question_id: String,
    pub text: String,
    pub options: Vec<String>,
    pub selected_position: Option<u8>,
}

#[derive(Clone, Debug)]
pub struct ReviewItem {
    pub question: PresentedQuestion,
    pub is_correct: bool,
    pub correct_position: Option<u8>,
    pub explanation: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AttemptReview {
    pub attempt: AssessmentAttempt,
    pub answers_revealed: bool,
    pub items: Vec<ReviewItem>,
}

pub struct AssessmentService {
    assessments: Arc<dyn AssessmentRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AssessmentService {
    pub fn new(
        assessments: Arc<dyn AssessmentRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            assessments,
            questions,
            attempts,
        }
    }

    pub async fn get_active_assessment(&self, assessment_id: &str) -> AppResult<Assessment> {
        self.assessments
            .find_by_id(assessment_id)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!("Assessment with id '{}' not found", assessment_id))
            })
    }

    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<AssessmentSummary>> {
        let assessments = self.assessments.list_active().await?;

        let mut summaries = Vec::with_capacity(assessments.len());
        for assessment in assessments {
            let attempts = self
                .attempts
                .find_by_user_and_assessment(user_id, &assessment.id)
                .await?;
            summaries.push(AssessmentSummary {
                attempts_used: attempts.len() as u32,
                last_attempt: attempts.into_iter().next(),
                assessment,
            });
        }
        Ok(summaries)
    }

    /// Draws a fresh question set for the user. The attempt is stored in the
    /// `Created` state.
    pub async fn build_attempt(
        &self,
        user_id: &str,
        assessment_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AssessmentAttempt> {
        let assessment = self.get_active_assessment(assessment_id).await?;
        let prior = self
            .attempts
            .find_by_user_and_assessment(user_id, assessment_id)
            .await?;
        check_attempt_allowed(&assessment.config, &prior, now)?;

        let pool = self.questions.list_active(assessment_id).await?;
        let drawn = {
            let mut rng = rand::thread_rng();
            quiz_builder::draw_questions(&pool, assessment.config.question_count, &mut rng)?
        };

        let attempt_number = prior.iter().map(|a| a.attempt_number).max().unwrap_or(0) + 1;
        let attempt = AssessmentAttempt::new(
            user_id,
            assessment_id,
            attempt_number,
            &assessment.config,
            drawn,
            now,
        );
        self.attempts.create(attempt).await
    }

    pub async fn start_attempt(
        &self,
        user_id: &str,
        attempt_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AssessmentAttempt> {
        let mut attempt = self.get_attempt(user_id, attempt_id).await?;
        let expected_version = attempt.version;
        start(&mut attempt, now)?;
        self.attempts.save(attempt, expected_version).await
    }

    /// Builds and immediately starts an attempt.
    pub async fn begin_attempt(
        &self,
        user_id: &str,
        assessment_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AssessmentAttempt> {
        let attempt = self.build_attempt(user_id, assessment_id, now).await?;
        self.start_attempt(user_id, &attempt.id, now).await
    }

    pub async fn get_attempt(&self, user_id: &str, attempt_id: &str) -> AppResult<AssessmentAttempt> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt with id '{}' not found", attempt_id)))?;

        if attempt.user_id != user_id {
            return Err(AppError::Forbidden(
                "Attempt belongs to another user".to_string(),
            ));
        }
        Ok(attempt)
    }

    /// The attempt's questions in drawn order with options as presented.
    pub async fn presented_questions(
        &self,
        attempt: &AssessmentAttempt,
    ) -> AppResult<Vec<(PresentedQuestion, Question)>> {
        let questions: HashMap<String, Question> = self
            .questions
            .find_by_ids(&attempt.question_ids())
            .await?
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        attempt
            .questions
            .iter()
            .map(|snapshot| {
                let question = questions.get(&snapshot.question_id).ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Question with id '{}' not found",
                        snapshot.question_id
                    ))
                })?;
                Ok((present(attempt, snapshot, question), question.clone()))
            })
            .collect()
    }

    pub async fn record_answer(
        &self,
        user_id: &str,
        attempt_id: &str,
        question_id: &str,
        selected_position: u8,
        now: DateTime<Utc>,
    ) -> AppResult<AssessmentAttempt> {
        let mut attempt = self.get_attempt(user_id, attempt_id).await?;
        let expected_version = attempt.version;
        apply_answer(&mut attempt, question_id, selected_position, now)?;
        self.attempts.save(attempt, expected_version).await
    }

    pub async fn finalize(
        &self,
        user_id: &str,
        attempt_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AssessmentAttempt> {
        let mut attempt = self.get_attempt(user_id, attempt_id).await?;
        let expected_version = attempt.version;
        complete(&mut attempt, now)?;

        match self.attempts.save(attempt, expected_version).await {
            Ok(saved) => Ok(saved),
            // lost the race to another finalize
            Err(AppError::Conflict(_)) => {
                let current = self.get_attempt(user_id, attempt_id).await?;
                if current.is_completed() {
                    Err(AppError::AlreadyFinalized(attempt_id.to_string()))
                } else {
                    Err(AppError::Conflict(format!(
                        "Attempt '{}' was modified concurrently",
                        attempt_id
                    )))
                }
            }
            Err(err) => Err(err),
        }
    }

    pub async fn review(&self, user_id: &str, attempt_id: &str) -> AppResult<AttemptReview> {
        let attempt = self.get_attempt(user_id, attempt_id).await?;
        if !attempt.is_completed() {
            return Err(AppError::AttemptNotActive(format!(
                "attempt '{}' has not been finalized",
                attempt_id
            )));
        }

        let show_on_fail = self
            .assessments
            .find_by_id(&attempt.assessment_id)
            .await?
            .is_some_and(|a| a.config.show_correct_answers_on_fail);
        let answers_revealed = attempt.passed || show_on_fail;

        let items = self
            .presented_questions(&attempt)
            .await?
            .into_iter()
            .map(|(presented, question)| {
                let is_correct = attempt
                    .responses
                    .get(&question.id)
                    .is_some_and(|r| r.is_correct);
                let correct_position = attempt
                    .snapshot_for(&question.id)
                    .map(|s| s.correct_position);
                ReviewItem {
                    question: presented,
                    is_correct,
                    correct_position: correct_position.filter(|_| answers_revealed),
                    explanation: Some(question.explanation).filter(|_| answers_revealed),
                }
            })
            .collect();

        Ok(AttemptReview {
            attempt,
            answers_revealed,
            items,
        })
    }
}

fn present(
    attempt: &AssessmentAttempt,
    snapshot: &AttemptQuestion,
    question: &Question,
) -> PresentedQuestion {
    PresentedQuestion {
        question_id: question.id.clone(),
        text: question.text.clone(),
        options: quiz_builder::presented_options(question, snapshot),
        selected_position: attempt
            .responses
            .get(&question.id)
            .map(|r| r.selected_position),
    }
}
