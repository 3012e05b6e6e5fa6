use async_graphql::{Enum, InputObject};
use chrono::{NaiveDate, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{
    assessment::{Cooldown, MaxAttempts, TimeLimit},
    training::{ContentType, Difficulty},
    AssessmentConfig, CompletionEvidence,
};

static PHONE_REGEX: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^\+?1?\d{9,15}$").expect("PHONE_REGEX is a valid regex pattern")
});

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(regex(
        path = *PHONE_REGEX,
        message = "Phone number must be 9 to 15 digits, optionally starting with +"
    ))]
    pub phone_number: String,

    #[validate(length(min = 1, max = 100))]
    pub city: String,

    #[validate(length(min = 1, max = 100))]
    pub state_region: String,

    pub date_of_birth: NaiveDate,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub new_password_confirm: String,
}

/// Evidence as sent over the wire. Which fields are needed depends on the
/// module's content type.
#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CompleteModuleRequest {
    #[validate(range(max = 100))]
    pub watch_percentage: Option<u8>,

    pub scrolled_to_bottom: Option<bool>,

    #[serde(default)]
    #[graphql(default)]
    pub time_spent_minutes: u32,
}

impl CompleteModuleRequest {
    pub fn into_evidence(self, content_type: ContentType) -> CompletionEvidence {
        let watch_percentage = self.watch_percentage.unwrap_or(0);
        let scrolled_to_bottom = self.scrolled_to_bottom.unwrap_or(false);
        let time_spent_minutes = self.time_spent_minutes;

        match content_type {
            ContentType::Video => CompletionEvidence::Video {
                watch_percentage,
                time_spent_minutes,
            },
            ContentType::Pdf | ContentType::Text => CompletionEvidence::Document {
                scrolled_to_bottom,
                time_spent_minutes,
            },
            ContentType::Mixed => CompletionEvidence::Mixed {
                watch_percentage,
                scrolled_to_bottom,
                time_spent_minutes,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct RecordAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,

    #[validate(range(max = 3))]
    pub selected_option: u8,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    #[graphql(default)]
    pub description: String,

    #[serde(default)]
    #[graphql(default)]
    pub difficulty: Difficulty,

    #[serde(default)]
    #[graphql(default)]
    pub order: i32,

    #[serde(default = "default_true")]
    #[graphql(default = true)]
    pub is_mandatory: bool,

    #[serde(default)]
    #[graphql(default)]
    pub estimated_duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CreateModuleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    #[graphql(default)]
    pub description: String,

    pub content_type: ContentType,

    /// Next free position in the course when omitted.
    #[validate(range(min = 1))]
    pub position: Option<u32>,

    #[validate(url)]
    pub content_url: Option<String>,

    pub text_content: Option<String>,

    #[serde(default)]
    #[graphql(default)]
    pub duration_minutes: u32,

    #[serde(default = "default_true")]
    #[graphql(default = true)]
    pub is_required: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct ReorderModulesRequest {
    #[validate(length(min = 1))]
    pub module_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CreateAssessmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    #[graphql(default)]
    pub description: String,

    #[validate(range(min = 1, max = 200))]
    pub question_count: u32,

    #[validate(range(max = 100))]
    pub passing_threshold: Option<u8>,

    /// Unlimited when omitted.
    #[validate(range(min = 1))]
    pub max_attempts: Option<u32>,

    /// Retake immediately when omitted.
    #[validate(range(min = 1, max = 31536000))]
    pub cooldown_seconds: Option<i64>,

    /// No time limit when omitted.
    #[validate(range(min = 1, max = 604800))]
    pub time_limit_seconds: Option<i64>,

    #[serde(default)]
    #[graphql(default)]
    pub show_correct_answers_on_fail: bool,
}

impl CreateAssessmentRequest {
    pub fn config(&self) -> AssessmentConfig {
        let defaults = AssessmentConfig::default();
        AssessmentConfig {
            question_count: self.question_count,
            passing_threshold: self.passing_threshold.unwrap_or(defaults.passing_threshold),
            max_attempts: self
                .max_attempts
                .map_or(MaxAttempts::Unlimited, MaxAttempts::Limited),
            cooldown: self.cooldown_seconds.map_or(Cooldown::Immediate, Cooldown::Seconds),
            time_limit: self.time_limit_seconds.map_or(TimeLimit::None, TimeLimit::Seconds),
            show_correct_answers_on_fail: self.show_correct_answers_on_fail,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,

    #[validate(length(equal = 4, message = "Questions need exactly four options"))]
    pub options: Vec<String>,

    #[validate(range(max = 3))]
    pub correct_option: u8,

    #[serde(default)]
    #[graphql(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Enum)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

#[derive(Debug, Clone, Deserialize, InputObject)]
pub struct OfficeHoursInput {
    pub day_of_week: DayOfWeek,
    pub is_open: bool,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct CreateOfficeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 20))]
    pub code: String,

    #[validate(length(min = 1, max = 255))]
    pub address_line_1: String,

    pub address_line_2: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub city: String,

    pub state: Option<String>,

    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,

    pub country: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub timezone: String,

    #[validate(regex(path = *PHONE_REGEX))]
    pub phone_number: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub notes: Option<String>,

    #[serde(default)]
    #[graphql(default)]
    pub order: i32,

    #[serde(default)]
    #[graphql(default)]
    pub hours: Vec<OfficeHoursInput>,
}

fn default_true() -> bool {
    true
}
