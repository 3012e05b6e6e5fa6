use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::training::{ContentType, TrainingModule};

/// Minimum share of a video that must be watched before it counts as completed.
pub const MIN_WATCH_PERCENTAGE: u8 = 90;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModuleCompletion {
    pub id: String,
    pub user_id: String,
    pub module_id: String,
    pub course_id: String,
    pub is_completed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent_minutes: u32,
}

impl ModuleCompletion {
    pub fn started(user_id: &str, module: &TrainingModule, now: DateTime<Utc>) -> Self {
        ModuleCompletion {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            module_id: module.id.clone(),
            course_id: module.course_id.clone(),
            is_completed: false,
            started_at: now,
            completed_at: None,
            time_spent_minutes: 0,
        }
    }
}

/// What the client reports when asking for a module to be marked completed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionEvidence {
    Video {
        watch_percentage: u8,
        #[serde(default)]
        time_spent_minutes: u32,
    },
    Document {
        scrolled_to_bottom: bool,
        #[serde(default)]
        time_spent_minutes: u32,
    },
    Mixed {
        watch_percentage: u8,
        scrolled_to_bottom: bool,
        #[serde(default)]
        time_spent_minutes: u32,
    },
}

impl CompletionEvidence {
    pub fn time_spent_minutes(&self) -> u32 {
        match self {
            CompletionEvidence::Video { time_spent_minutes, .. }
            | CompletionEvidence::Document { time_spent_minutes, .. }
            | CompletionEvidence::Mixed { time_spent_minutes, .. } => *time_spent_minutes,
        }
    }

    /// Checks the evidence against the module's content type. The error
    /// string is shown to the learner.
    pub fn satisfies(&self, content_type: ContentType) -> Result<(), String> {
        match (content_type, self) {
            (ContentType::Video, CompletionEvidence::Video { watch_percentage, .. }) => {
                check_watch(*watch_percentage)
            }
            (ContentType::Pdf | ContentType::Text, CompletionEvidence::Document { scrolled_to_bottom, .. }) => {
                check_scroll(*scrolled_to_bottom)
            }
            (
                ContentType::Mixed,
                CompletionEvidence::Mixed {
                    watch_percentage,
                    scrolled_to_bottom,
                    ..
                },
            ) => {
                check_watch(*watch_percentage)?;
                check_scroll(*scrolled_to_bottom)
            }
            (content_type, _) => Err(format!(
                "evidence does not match {:?} content",
                content_type
            )),
        }
    }
}

fn check_watch(watch_percentage: u8) -> Result<(), String> {
    if watch_percentage < MIN_WATCH_PERCENTAGE {
        return Err(format!(
            "watched {}% of the video, at least {}% is required",
            watch_percentage, MIN_WATCH_PERCENTAGE
        ));
    }
    Ok(())
}

fn check_scroll(scrolled_to_bottom: bool) -> Result<(), String> {
    if !scrolled_to_bottom {
        return Err("the document must be read to the end".to_string());
    }
    Ok(())
}
