use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    auth::JwtService,
    config::Config,
    db::Database,
    errors::{AppError, AppResult},
    models::domain::AssessmentAttempt,
    repositories::{
        AccountTokenRepository, AssessmentRepository, AttemptRepository, CertificationRepository,
        CompletionRepository, MongoAccountTokenRepository, MongoAssessmentRepository,
        MongoAttemptRepository, MongoCertificationRepository, MongoCompletionRepository,
        MongoOfficeRepository, MongoQuestionRepository, MongoTrainingRepository,
        MongoUserRepository, OfficeRepository, QuestionRepository, TrainingRepository,
        UserRepository,
    },
    services::{
        assessment_service::AssessmentService,
        certification_service::CertificationService,
        content_service::ContentService,
        notification::{LogNotifier, Notifier},
        progression_service::ProgressionService,
        schedule_service::ScheduleService,
        user_service::UserService,
    },
};

/// One handle per store collection.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn AccountTokenRepository>,
    pub training: Arc<dyn TrainingRepository>,
    pub completions: Arc<dyn CompletionRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub certifications: Arc<dyn CertificationRepository>,
    pub offices: Arc<dyn OfficeRepository>,
}

impl Repositories {
    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(MongoUserRepository::new(db)),
            tokens: Arc::new(MongoAccountTokenRepository::new(db)),
            training: Arc::new(MongoTrainingRepository::new(db)),
            completions: Arc::new(MongoCompletionRepository::new(db)),
            assessments: Arc::new(MongoAssessmentRepository::new(db)),
            questions: Arc::new(MongoQuestionRepository::new(db)),
            attempts: Arc::new(MongoAttemptRepository::new(db)),
            certifications: Arc::new(MongoCertificationRepository::new(db)),
            offices: Arc::new(MongoOfficeRepository::new(db)),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        self.users.ensure_indexes().await?;
        self.tokens.ensure_indexes().await?;
        self.training.ensure_indexes().await?;
        self.completions.ensure_indexes().await?;
        self.assessments.ensure_indexes().await?;
        self.questions.ensure_indexes().await?;
        self.attempts.ensure_indexes().await?;
        self.certifications.ensure_indexes().await?;
        self.offices.ensure_indexes().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    /// `None` when running on non-Mongo repositories.
    pub db: Option<Database>,
    pub config: Arc<Config>,
    pub jwt_service: Arc<JwtService>,
    pub user_service: Arc<UserService>,
    pub progression_service: Arc<ProgressionService>,
    pub assessment_service: Arc<AssessmentService>,
    pub certification_service: Arc<CertificationService>,
    pub schedule_service: Arc<ScheduleService>,
    pub content_service: Arc<ContentService>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let repositories = Repositories::mongo(&db);
        repositories.ensure_indexes().await?;

        let notifier = Arc::new(LogNotifier::new(&config));
        let mut state = Self::from_repositories(config, repositories, notifier);
        state.db = Some(db);
        Ok(state)
    }

    pub fn from_repositories(
        config: Config,
        repositories: Repositories,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let jwt_service = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiration_hours,
        ));

        let user_service = Arc::new(UserService::new(
            repositories.users.clone(),
            repositories.tokens.clone(),
            notifier.clone(),
            jwt_service.clone(),
        ));
        let progression_service = Arc::new(ProgressionService::new(
            repositories.training.clone(),
            repositories.completions.clone(),
        ));
        let assessment_service = Arc::new(AssessmentService::new(
            repositories.assessments.clone(),
            repositories.questions.clone(),
            repositories.attempts.clone(),
        ));
        let certification_service = Arc::new(CertificationService::new(
            repositories.certifications.clone(),
            repositories.users.clone(),
            notifier,
        ));
        let schedule_service = Arc::new(ScheduleService::new(
            certification_service.clone(),
            repositories.offices.clone(),
        ));
        let content_service = Arc::new(ContentService::new(
            repositories.training,
            repositories.assessments,
            repositories.questions,
            repositories.offices,
        ));

        Self {
            db: None,
            config: Arc::new(config),
            jwt_service,
            user_service,
            progression_service,
            assessment_service,
            certification_service,
            schedule_service,
            content_service,
        }
    }

    /// Finalizes an attempt and applies the outcome to the caller's
    /// certification. Finalizing an already completed attempt re-applies its
    /// stored outcome before reporting `AlreadyFinalized`, so a pass whose
    /// certification write failed is picked up by the retry.
    pub async fn finalize_attempt(
        &self,
        user_id: &str,
        attempt_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(AssessmentAttempt, bool)> {
        let attempt = match self.assessment_service.finalize(user_id, attempt_id, now).await {
            Ok(attempt) => attempt,
            Err(AppError::AlreadyFinalized(id)) => {
                let completed = self.assessment_service.get_attempt(user_id, attempt_id).await?;
                self.certification_service
                    .apply_result(user_id, &completed)
                    .await?;
                return Err(AppError::AlreadyFinalized(id));
            }
            Err(err) => return Err(err),
        };

        let newly_certified = self
            .certification_service
            .apply_result(user_id, &attempt)
            .await?;
        Ok((attempt, newly_certified))
    }
}
