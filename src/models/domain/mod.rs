pub mod account_token;
pub mod assessment;
pub mod attempt;
pub mod certification;
pub mod completion;
pub mod office;
pub mod question;
pub mod training;
pub mod user;
pub use account_token::{AccountToken, TokenKind};
pub use assessment::{Assessment, AssessmentConfig};
pub use attempt::{AssessmentAttempt, AttemptStatus};
pub use certification::Certification;
pub use completion::{CompletionEvidence, ModuleCompletion};
pub use office::{Office, OfficeHours};
pub use question::Question;
pub use training::{TrainingCourse, TrainingModule};
pub use user::{User, UserRole};
