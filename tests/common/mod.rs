#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use secrecy::SecretString;
use tokio::sync::RwLock;

use onboard_server::{
    app_state::{AppState, Repositories},
    auth::password::hash_password,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{
        AccountToken, Assessment, AssessmentAttempt, AssessmentConfig, Certification,
        ModuleCompletion, Office, OfficeHours, Question, TokenKind, TrainingCourse,
        TrainingModule, User, UserRole,
        training::{ContentType, Difficulty},
    },
    repositories::{
        AccountTokenRepository, AssessmentRepository, AttemptRepository, CertificationRepository,
        CompletionRepository, OfficeRepository, QuestionRepository, TrainingRepository,
        UserRepository,
    },
    services::notification::{NotificationContext, NotificationKind, Notifier},
};

pub const PASSWORD: &str = "Onboard2024";

pub fn test_config() -> Config {
    Config {
        mongo_conn_string: "mongodb://localhost:27017".to_string(),
        mongo_db_name: "onboard-test".to_string(),
        web_server_host: "127.0.0.1".to_string(),
        web_server_port: 8080,
        jwt_secret: SecretString::from("integration_test_secret_key".to_string()),
        jwt_expiration_hours: 1,
        mail_from_address: "onboarding@example.com".to_string(),
        app_base_url: "http://localhost:8080".to_string(),
        cors_allowed_origin: "http://localhost:5173".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
    fail_certified_writes: AtomicBool,
}

impl InMemoryUserRepository {
    /// Makes `mark_certified` fail until switched back off.
    pub fn fail_certified_writes(&self, fail: bool) {
        self.fail_certified_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::AlreadyExists(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(AppError::NotFound(format!(
                "User with id '{}' not found",
                user.id
            ))),
        }
    }

    async fn mark_certified(&self, user_id: &str, certified_at: DateTime<Utc>) -> AppResult<()> {
        if self.fail_certified_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("users write timed out".to_string()));
        }
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(user_id) {
            if !user.is_certified {
                user.is_certified = true;
                user.certified_at = Some(certified_at);
            }
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Account tokens
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryAccountTokenRepository {
    tokens: RwLock<HashMap<String, AccountToken>>,
}

#[async_trait]
impl AccountTokenRepository for InMemoryAccountTokenRepository {
    async fn create(&self, token: AccountToken) -> AppResult<AccountToken> {
        self.tokens
            .write()
            .await
            .insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<AccountToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn mark_used(&self, id: &str, used_at: DateTime<Utc>) -> AppResult<bool> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(id) {
            Some(token) if token.used_at.is_none() => {
                token.used_at = Some(used_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_for_user(&self, user_id: &str, kind: TokenKind) -> AppResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !(t.user_id == user_id && t.kind == kind));
        Ok((before - tokens.len()) as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Training content
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryTrainingRepository {
    courses: RwLock<HashMap<String, TrainingCourse>>,
    modules: RwLock<HashMap<String, TrainingModule>>,
}

#[async_trait]
impl TrainingRepository for InMemoryTrainingRepository {
    async fn create_course(&self, course: TrainingCourse) -> AppResult<TrainingCourse> {
        self.courses
            .write()
            .await
            .insert(course.id.clone(), course.clone());
        Ok(course)
    }

    async fn find_course(&self, id: &str) -> AppResult<Option<TrainingCourse>> {
        Ok(self.courses.read().await.get(id).cloned())
    }

    async fn update_course(&self, course: TrainingCourse) -> AppResult<TrainingCourse> {
        let mut courses = self.courses.write().await;
        if !courses.contains_key(&course.id) {
            return Err(AppError::NotFound(format!(
                "Course with id '{}' not found",
                course.id
            )));
        }
        courses.insert(course.id.clone(), course.clone());
        Ok(course)
    }

    async fn list_active_courses(&self) -> AppResult<Vec<TrainingCourse>> {
        let mut courses: Vec<TrainingCourse> = self
            .courses
            .read()
            .await
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        courses.sort_by_key(|c| c.order);
        Ok(courses)
    }

    async fn create_module(&self, module: TrainingModule) -> AppResult<TrainingModule> {
        self.modules
            .write()
            .await
            .insert(module.id.clone(), module.clone());
        Ok(module)
    }

    async fn find_module(&self, id: &str) -> AppResult<Option<TrainingModule>> {
        Ok(self.modules.read().await.get(id).cloned())
    }

    async fn update_module(&self, module: TrainingModule) -> AppResult<TrainingModule> {
        let mut modules = self.modules.write().await;
        if !modules.contains_key(&module.id) {
            return Err(AppError::NotFound(format!(
                "Module with id '{}' not found",
                module.id
            )));
        }
        modules.insert(module.id.clone(), module.clone());
        Ok(module)
    }

    async fn list_course_modules(&self, course_id: &str) -> AppResult<Vec<TrainingModule>> {
        let mut modules: Vec<TrainingModule> = self
            .modules
            .read()
            .await
            .values()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.position);
        Ok(modules)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Completions
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryCompletionRepository {
    completions: RwLock<HashMap<(String, String), ModuleCompletion>>,
}

#[async_trait]
impl CompletionRepository for InMemoryCompletionRepository {
    async fn find(&self, user_id: &str, module_id: &str) -> AppResult<Option<ModuleCompletion>> {
        let key = (user_id.to_string(), module_id.to_string());
        Ok(self.completions.read().await.get(&key).cloned())
    }

    async fn get_or_create(&self, started: ModuleCompletion) -> AppResult<ModuleCompletion> {
        let key = (started.user_id.clone(), started.module_id.clone());
        let mut completions = self.completions.write().await;
        Ok(completions.entry(key).or_insert(started).clone())
    }

    async fn mark_completed(
        &self,
        user_id: &str,
        module_id: &str,
        completed_at: DateTime<Utc>,
        time_spent_minutes: u32,
    ) -> AppResult<Option<ModuleCompletion>> {
        let key = (user_id.to_string(), module_id.to_string());
        let mut completions = self.completions.write().await;
        match completions.get_mut(&key) {
            Some(completion) if !completion.is_completed => {
                completion.is_completed = true;
                completion.completed_at = Some(completed_at);
                completion.time_spent_minutes = time_spent_minutes;
                Ok(Some(completion.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_for_user_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Vec<ModuleCompletion>> {
        let completions = self.completions.read().await;
        Ok(completions
            .values()
            .filter(|c| c.user_id == user_id && c.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Assessments and questions
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryAssessmentRepository {
    assessments: RwLock<HashMap<String, Assessment>>,
}

#[async_trait]
impl AssessmentRepository for InMemoryAssessmentRepository {
    async fn create(&self, assessment: Assessment) -> AppResult<Assessment> {
        self.assessments
            .write()
            .await
            .insert(assessment.id.clone(), assessment.clone());
        Ok(assessment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assessment>> {
        Ok(self.assessments.read().await.get(id).cloned())
    }

    async fn update(&self, assessment: Assessment) -> AppResult<Assessment> {
        let mut assessments = self.assessments.write().await;
        if !assessments.contains_key(&assessment.id) {
            return Err(AppError::NotFound(format!(
                "Assessment with id '{}' not found",
                assessment.id
            )));
        }
        assessments.insert(assessment.id.clone(), assessment.clone());
        Ok(assessment)
    }

    async fn list_active(&self) -> AppResult<Vec<Assessment>> {
        let mut assessments: Vec<Assessment> = self
            .assessments
            .read()
            .await
            .values()
            .filter(|a| a.is_active)
            .cloned()
            .collect();
        assessments.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(assessments)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: RwLock<HashMap<String, Question>>,
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        self.questions
            .write()
            .await
            .insert(question.id.clone(), question.clone());
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        Ok(self.questions.read().await.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn list_active(&self, assessment_id: &str) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(questions
            .values()
            .filter(|q| q.assessment_id == assessment_id && q.is_active)
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: &str, is_active: bool) -> AppResult<()> {
        let mut questions = self.questions.write().await;
        let question = questions
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))?;
        question.is_active = is_active;
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Attempts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts: RwLock<HashMap<String, AssessmentAttempt>>,
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create(&self, attempt: AssessmentAttempt) -> AppResult<AssessmentAttempt> {
        let mut attempts = self.attempts.write().await;
        let duplicate = attempts.values().any(|a| {
            a.user_id == attempt.user_id
                && a.assessment_id == attempt.assessment_id
                && a.attempt_number == attempt.attempt_number
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "Attempt {} already exists for this assessment",
                attempt.attempt_number
            )));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AssessmentAttempt>> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn find_by_user_and_assessment(
        &self,
        user_id: &str,
        assessment_id: &str,
    ) -> AppResult<Vec<AssessmentAttempt>> {
        let mut attempts: Vec<AssessmentAttempt> = self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id && a.assessment_id == assessment_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.attempt_number.cmp(&a.attempt_number));
        Ok(attempts)
    }

    async fn save(
        &self,
        mut attempt: AssessmentAttempt,
        expected_version: i64,
    ) -> AppResult<AssessmentAttempt> {
        let mut attempts = self.attempts.write().await;
        let stored = attempts.get_mut(&attempt.id).ok_or_else(|| {
            AppError::NotFound(format!("Attempt with id '{}' not found", attempt.id))
        })?;
        if stored.version != expected_version {
            return Err(AppError::Conflict(format!(
                "Attempt '{}' was modified concurrently",
                attempt.id
            )));
        }
        attempt.version = expected_version + 1;
        *stored = attempt.clone();
        Ok(attempt)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Certifications
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryCertificationRepository {
    certifications: RwLock<HashMap<String, Certification>>,
}

#[async_trait]
impl CertificationRepository for InMemoryCertificationRepository {
    async fn find_by_user(&self, user_id: &str) -> AppResult<Option<Certification>> {
        Ok(self.certifications.read().await.get(user_id).cloned())
    }

    async fn certify(
        &self,
        user_id: &str,
        attempt_id: &str,
        certified_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut certifications = self.certifications.write().await;
        let certification = certifications
            .entry(user_id.to_string())
            .or_insert_with(|| Certification::uncertified(user_id));
        if certification.is_certified {
            return Ok(false);
        }
        certification.is_certified = true;
        certification.certified_at = Some(certified_at);
        certification.passing_attempt_id = Some(attempt_id.to_string());
        certification.updated_at = Some(certified_at);
        Ok(true)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Offices
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryOfficeRepository {
    offices: RwLock<HashMap<String, Office>>,
}

#[async_trait]
impl OfficeRepository for InMemoryOfficeRepository {
    async fn create(&self, office: Office) -> AppResult<Office> {
        let mut offices = self.offices.write().await;
        if offices.values().any(|o| o.code == office.code) {
            return Err(AppError::AlreadyExists(format!(
                "Office with code '{}' already exists",
                office.code
            )));
        }
        offices.insert(office.id.clone(), office.clone());
        Ok(office)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Office>> {
        Ok(self.offices.read().await.get(id).cloned())
    }

    async fn update(&self, office: Office) -> AppResult<Office> {
        let mut offices = self.offices.write().await;
        if !offices.contains_key(&office.id) {
            return Err(AppError::NotFound(format!(
                "Office with id '{}' not found",
                office.id
            )));
        }
        offices.insert(office.id.clone(), office.clone());
        Ok(office)
    }

    async fn list_active(&self) -> AppResult<Vec<Office>> {
        let mut offices: Vec<Office> = self
            .offices
            .read()
            .await
            .values()
            .filter(|o| o.is_active)
            .cloned()
            .collect();
        offices.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(offices)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct SentNotification {
    pub user_id: String,
    pub email: String,
    pub kind: NotificationKind,
    pub context: NotificationContext,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }

    pub async fn count(&self, kind: NotificationKind) -> usize {
        self.sent.read().await.iter().filter(|n| n.kind == kind).count()
    }

    /// The plain token from the most recent notification of `kind` to `email`.
    pub async fn last_token(&self, email: &str, kind: NotificationKind) -> Option<String> {
        self.sent
            .read()
            .await
            .iter()
            .rev()
            .find(|n| n.email == email && n.kind == kind)
            .and_then(|n| n.context.get("token").cloned())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        user: &User,
        kind: NotificationKind,
        context: NotificationContext,
    ) -> AppResult<()> {
        self.sent.write().await.push(SentNotification {
            user_id: user.id.clone(),
            email: user.email.clone(),
            kind,
            context,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Application state over in-memory stores, with typed handles kept for
/// seeding and inspection.
pub struct TestEnv {
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub tokens: Arc<InMemoryAccountTokenRepository>,
    pub training: Arc<InMemoryTrainingRepository>,
    pub completions: Arc<InMemoryCompletionRepository>,
    pub assessments: Arc<InMemoryAssessmentRepository>,
    pub questions: Arc<InMemoryQuestionRepository>,
    pub attempts: Arc<InMemoryAttemptRepository>,
    pub certifications: Arc<InMemoryCertificationRepository>,
    pub offices: Arc<InMemoryOfficeRepository>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestEnv {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let tokens = Arc::new(InMemoryAccountTokenRepository::default());
        let training = Arc::new(InMemoryTrainingRepository::default());
        let completions = Arc::new(InMemoryCompletionRepository::default());
        let assessments = Arc::new(InMemoryAssessmentRepository::default());
        let questions = Arc::new(InMemoryQuestionRepository::default());
        let attempts = Arc::new(InMemoryAttemptRepository::default());
        let certifications = Arc::new(InMemoryCertificationRepository::default());
        let offices = Arc::new(InMemoryOfficeRepository::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let repositories = Repositories {
            users: users.clone(),
            tokens: tokens.clone(),
            training: training.clone(),
            completions: completions.clone(),
            assessments: assessments.clone(),
            questions: questions.clone(),
            attempts: attempts.clone(),
            certifications: certifications.clone(),
            offices: offices.clone(),
        };
        let state = AppState::from_repositories(test_config(), repositories, notifier.clone());

        Self {
            state,
            users,
            tokens,
            training,
            completions,
            assessments,
            questions,
            attempts,
            certifications,
            offices,
            notifier,
        }
    }

    pub async fn seed_user(&self, email: &str, role: UserRole) -> User {
        let date_of_birth = NaiveDate::from_ymd_opt(1990, 4, 12).unwrap();
        let mut user = User::new(
            "Test",
            "Learner",
            email,
            "+15555550100",
            "Springfield",
            "IL",
            date_of_birth,
            hash_password(PASSWORD).unwrap(),
        );
        user.role = role;
        user.is_email_verified = true;
        self.users.create(user).await.unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.state.jwt_service.create_token(user).unwrap()
    }

    /// A course with `count` published, required video modules at
    /// positions `1..=count`.
    pub async fn seed_course(&self, count: u32) -> (TrainingCourse, Vec<TrainingModule>) {
        let course = TrainingCourse::new("Orientation", "First week", Difficulty::Beginner, 1);
        let course = self.training.create_course(course).await.unwrap();

        let mut modules = Vec::new();
        for position in 1..=count {
            let mut module = TrainingModule::new(
                &course.id,
                &format!("Module {}", position),
                ContentType::Video,
                position,
            );
            module.is_published = true;
            modules.push(self.training.create_module(module).await.unwrap());
        }
        (course, modules)
    }

    /// An active assessment with `pool_size` questions whose answer keys
    /// cycle through the four options.
    pub async fn seed_assessment(&self, config: AssessmentConfig, pool_size: usize) -> Assessment {
        let assessment = Assessment::new("Certification exam", "Final check", config);
        let assessment = self.assessments.create(assessment).await.unwrap();

        for i in 0..pool_size {
            let question = Question::new(
                &assessment.id,
                &format!("Question {}", i),
                ["A", "B", "C", "D"].map(String::from),
                (i % 4) as u8,
                &format!("Explanation {}", i),
            );
            self.questions.create(question).await.unwrap();
        }
        assessment
    }

    pub async fn seed_office(&self, name: &str, code: &str) -> Office {
        let mut office = Office::new(name, code, "Springfield", "62701", "America/Chicago");
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        office.hours = vec![
            OfficeHours::open(Weekday::Mon, nine, five),
            OfficeHours::open(Weekday::Tue, nine, five),
            OfficeHours::closed(Weekday::Sun),
        ];
        self.offices.create(office).await.unwrap()
    }

    /// Selected positions for an attempt, correct for the first
    /// `correct` questions and wrong for the rest.
    pub fn answers(attempt: &AssessmentAttempt, correct: usize) -> Vec<(String, u8)> {
        attempt
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let selected = if i < correct {
                    q.correct_position
                } else {
                    (q.correct_position + 1) % 4
                };
                (q.question_id.clone(), selected)
            })
            .collect()
    }
}
