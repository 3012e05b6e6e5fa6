use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

pub const DEFAULT_PASSING_THRESHOLD: u8 = 85;
pub const MAX_COOLDOWN_SECONDS: i64 = 365 * 24 * 60 * 60;
pub const MAX_TIME_LIMIT_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub config: AssessmentConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Assessment {
    pub fn new(title: &str, description: &str, config: AssessmentConfig) -> Self {
        Assessment {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            is_active: true,
            config,
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum MaxAttempts {
    Limited(u32),
    Unlimited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Cooldown {
    Immediate,
    Seconds(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum TimeLimit {
    None,
    Seconds(i64),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssessmentConfig {
    pub question_count: u32,
    pub passing_threshold: u8, // percent
    pub max_attempts: MaxAttempts,
    pub cooldown: Cooldown,
    pub time_limit: TimeLimit,
    pub show_correct_answers_on_fail: bool,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        AssessmentConfig {
            question_count: 20,
            passing_threshold: DEFAULT_PASSING_THRESHOLD,
            max_attempts: MaxAttempts::Unlimited,
            cooldown: Cooldown::Immediate,
            time_limit: TimeLimit::None,
            show_correct_answers_on_fail: false,
        }
    }
}

fn seconds_to_duration(seconds: i64, field: &str) -> AppResult<Duration> {
    Duration::try_seconds(seconds)
        .ok_or_else(|| AppError::ValidationError(format!("{} of {}s is out of range", field, seconds)))
}

impl AssessmentConfig {
    pub fn cooldown_seconds(&self) -> Option<i64> {
        match self.cooldown {
            Cooldown::Immediate => None,
            Cooldown::Seconds(s) => Some(s),
        }
    }

    pub fn time_limit_seconds(&self) -> Option<i64> {
        match self.time_limit {
            TimeLimit::None => None,
            TimeLimit::Seconds(s) => Some(s),
        }
    }

    pub fn cooldown(&self) -> AppResult<Option<Duration>> {
        self.cooldown_seconds()
            .map(|s| seconds_to_duration(s, "cooldown"))
            .transpose()
    }

    pub fn time_limit(&self) -> AppResult<Option<Duration>> {
        self.time_limit_seconds()
            .map(|s| seconds_to_duration(s, "time_limit"))
            .transpose()
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.question_count == 0 {
            return Err(AppError::ValidationError(
                "question_count must be at least 1".to_string(),
            ));
        }
        if self.passing_threshold > 100 {
            return Err(AppError::ValidationError(
                "passing_threshold must be between 0 and 100".to_string(),
            ));
        }
        if self.max_attempts == MaxAttempts::Limited(0) {
            return Err(AppError::ValidationError(
                "max_attempts must allow at least one attempt".to_string(),
            ));
        }
        if matches!(self.cooldown, Cooldown::Seconds(s) if s <= 0) {
            return Err(AppError::ValidationError(
                "cooldown must be positive, use Immediate for none".to_string(),
            ));
        }
        if matches!(self.time_limit, TimeLimit::Seconds(s) if s <= 0) {
            return Err(AppError::ValidationError(
                "time_limit must be positive, use None for unlimited".to_string(),
            ));
        }
        if matches!(self.cooldown, Cooldown::Seconds(s) if s > MAX_COOLDOWN_SECONDS) {
            return Err(AppError::ValidationError(format!(
                "cooldown may not exceed {} seconds",
                MAX_COOLDOWN_SECONDS
            )));
        }
        if matches!(self.time_limit, TimeLimit::Seconds(s) if s > MAX_TIME_LIMIT_SECONDS) {
            return Err(AppError::ValidationError(format!(
                "time_limit may not exceed {} seconds",
                MAX_TIME_LIMIT_SECONDS
            )));
        }
        Ok(())
    }
}
