pub mod account_token_repository;
pub mod assessment_repository;
pub mod attempt_repository;
pub mod certification_repository;
pub mod completion_repository;
pub mod office_repository;
pub mod question_repository;
pub mod training_repository;
pub mod user_repository;

pub use account_token_repository::{AccountTokenRepository, MongoAccountTokenRepository};
pub use assessment_repository::{AssessmentRepository, MongoAssessmentRepository};
pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use certification_repository::{CertificationRepository, MongoCertificationRepository};
pub use completion_repository::{CompletionRepository, MongoCompletionRepository};
pub use office_repository::{MongoOfficeRepository, OfficeRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use training_repository::{MongoTrainingRepository, TrainingRepository};
pub use user_repository::{MongoUserRepository, UserRepository};
