use crate::models::domain::{
    question::OPTION_COUNT, training::ContentType, Question, TrainingModule,
};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Active questions with answer keys cycling through A..D.
    pub fn question_pool(assessment_id: &str, size: usize) -> Vec<Question> {
        (0..size)
            .map(|i| {
                Question::new(
                    assessment_id,
                    &format!("Question {}", i),
                    ["A", "B", "C", "D"].map(String::from),
                    (i % OPTION_COUNT) as u8,
                    "",
                )
            })
            .collect()
    }

    /// Draft modules at positions `1..=count`.
    pub fn course_modules(course_id: &str, count: u32) -> Vec<TrainingModule> {
        (1..=count)
            .map(|position| {
                TrainingModule::new(
                    course_id,
                    &format!("Module {}", position),
                    ContentType::Video,
                    position,
                )
            })
            .collect()
    }

    pub fn published_modules(course_id: &str, count: u32) -> Vec<TrainingModule> {
        course_modules(course_id, count)
            .into_iter()
            .map(|mut module| {
                module.is_published = true;
                module
            })
            .collect()
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use std::collections::HashSet;

    #[test]
    fn test_question_pool_has_unique_ids() {
        let pool = question_pool("assessment-1", 10);
        let ids: HashSet<&str> = pool.iter().map(|q| q.id.as_str()).collect();

        assert_eq!(ids.len(), 10);
        assert!(pool.iter().all(|q| q.is_active && q.has_valid_answer_key()));
    }

    #[test]
    fn test_published_modules_are_ordered() {
        let modules = published_modules("course-1", 3);
        let positions: Vec<u32> = modules.iter().map(|m| m.position).collect();

        assert_eq!(positions, vec![1, 2, 3]);
        assert!(modules.iter().all(|m| m.is_published));
    }
}
