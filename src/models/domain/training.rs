use async_graphql::Enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
pub enum ContentType {
    Video,
    Pdf,
    Text,
    Mixed, // video plus reading material
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrainingCourse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub order: i32,
    pub is_active: bool,
    pub is_mandatory: bool, // must be completed before certification
    pub estimated_duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TrainingCourse {
    pub fn new(title: &str, description: &str, difficulty: Difficulty, order: i32) -> Self {
        TrainingCourse {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            difficulty,
            order,
            is_active: true,
            is_mandatory: true,
            estimated_duration_minutes: 0,
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrainingModule {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    pub position: u32, // 1-based, unique within the course
    pub content_url: Option<String>,
    pub text_content: Option<String>,
    pub duration_minutes: u32,
    pub is_required: bool,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl TrainingModule {
    pub fn new(course_id: &str, title: &str, content_type: ContentType, position: u32) -> Self {
        TrainingModule {
            id: Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            title: title.to_string(),
            description: String::new(),
            content_type,
            position,
            content_url: None,
            text_content: None,
            duration_minutes: 0,
            is_required: true,
            is_published: false,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }
}
