use std::collections::HashMap;

use async_graphql::Enum;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{assessment::AssessmentConfig, question::OPTION_COUNT},
};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
pub enum AttemptStatus {
    Created,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
pub enum AttemptOutcome {
    Passed,
    Failed,
}

/// One drawn question, frozen at attempt creation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptQuestion {
    pub question_id: String,
    /// `option_order[p]` is the authoring index shown at position `p`.
    pub option_order: [u8; OPTION_COUNT],
    pub correct_position: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptResponse {
    pub question_id: String,
    pub selected_position: u8,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssessmentAttempt {
    pub id: String,
    pub user_id: String,
    pub assessment_id: String,
    pub attempt_number: u32,
    pub status: AttemptStatus,
    pub outcome: Option<AttemptOutcome>,
    pub questions: Vec<AttemptQuestion>,
    /// Question id to its index in `questions`.
    pub question_index: HashMap<String, usize>,
    pub responses: HashMap<String, AttemptResponse>, // keyed by question id
    pub correct_answers: u32,
    pub total_questions: u32,
    pub score_percentage: Option<u8>,
    pub passed: bool,
    pub passing_threshold: u8,
    pub time_limit_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl AssessmentAttempt {
    pub fn new(
        user_id: &str,
        assessment_id: &str,
        attempt_number: u32,
        config: &AssessmentConfig,
        questions: Vec<AttemptQuestion>,
        now: DateTime<Utc>,
    ) -> Self {
        AssessmentAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            assessment_id: assessment_id.to_string(),
            attempt_number,
            status: AttemptStatus::Created,
            outcome: None,
            total_questions: questions.len() as u32,
            question_index: questions
                .iter()
                .enumerate()
                .map(|(i, q)| (q.question_id.clone(), i))
                .collect(),
            questions,
            responses: HashMap::new(),
            correct_answers: 0,
            score_percentage: None,
            passed: false,
            passing_threshold: config.passing_threshold,
            time_limit_seconds: config.time_limit_seconds(),
            created_at: now,
            started_at: None,
            completed_at: None,
            version: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }

    /// `None` until the attempt starts, or when it has no time limit.
    pub fn deadline(&self) -> AppResult<Option<DateTime<Utc>>> {
        let (Some(started_at), Some(seconds)) = (self.started_at, self.time_limit_seconds) else {
            return Ok(None);
        };
        Duration::try_seconds(seconds)
            .and_then(|limit| started_at.checked_add_signed(limit))
            .map(Some)
            .ok_or_else(|| {
                AppError::ValidationError(format!(
                    "time limit of {}s on attempt '{}' is out of range",
                    seconds, self.id
                ))
            })
    }

    pub fn snapshot_for(&self, question_id: &str) -> Option<&AttemptQuestion> {
        self.question_index
            .get(question_id)
            .and_then(|&i| self.questions.get(i))
    }

    pub fn question_ids(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.question_id.clone()).collect()
    }
}
