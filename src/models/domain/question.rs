use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const OPTION_COUNT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub assessment_id: String,
    pub text: String,
    pub options: [String; OPTION_COUNT], // authoring order
    pub correct_option: u8,              // index into `options`
    pub explanation: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(
        assessment_id: &str,
        text: &str,
        options: [String; OPTION_COUNT],
        correct_option: u8,
        explanation: &str,
    ) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            assessment_id: assessment_id.to_string(),
            text: text.to_string(),
            options,
            correct_option,
            explanation: explanation.to_string(),
            is_active: true,
            created_at: Some(Utc::now()),
        }
    }

    pub fn has_valid_answer_key(&self) -> bool {
        (self.correct_option as usize) < OPTION_COUNT
    }
}
