pub mod assessment_service;
pub mod certification_service;
pub mod content_service;
pub mod notification;
pub mod progression_service;
pub mod quiz_builder;
pub mod schedule_service;
pub mod scoring;
pub mod user_service;
