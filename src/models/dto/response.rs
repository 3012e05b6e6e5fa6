use async_graphql::SimpleObject;
use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

use crate::{
    models::{
        domain::{
            attempt::AttemptOutcome,
            assessment::MaxAttempts,
            training::{ContentType, Difficulty},
            Assessment, AssessmentAttempt, AttemptStatus, Certification, ModuleCompletion,
            Question, TrainingCourse, TrainingModule, User, UserRole,
        },
        dto::request::DayOfWeek,
    },
    services::{
        assessment_service::{AssessmentSummary, AttemptReview, PresentedQuestion},
        progression_service::{CourseProgress, ModuleProgress, TrainingOverview},
        schedule_service::{DaySchedule, OfficeSchedule},
    },
};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone_number: String,
    pub city: String,
    pub state_region: String,
    pub role: UserRole,
    pub is_email_verified: bool,
    pub is_certified: bool,
    pub certified_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            full_name: user.full_name(),
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            city: user.city,
            state_region: user.state_region,
            role: user.role,
            is_email_verified: user.is_email_verified,
            is_certified: user.is_certified,
            certified_at: user.certified_at,
        }
    }
}

#[derive(Debug, Serialize, SimpleObject)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize, SimpleObject)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ModuleProgressDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    pub position: u32,
    pub duration_minutes: u32,
    pub is_required: bool,
    pub is_completed: bool,
    pub is_unlocked: bool,
}

impl From<ModuleProgress> for ModuleProgressDto {
    fn from(progress: ModuleProgress) -> Self {
        let module = progress.module;
        ModuleProgressDto {
            id: module.id,
            title: module.title,
            description: module.description,
            content_type: module.content_type,
            position: module.position,
            duration_minutes: module.duration_minutes,
            is_required: module.is_required,
            is_completed: progress.is_completed,
            is_unlocked: progress.is_unlocked,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct CourseProgressDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub is_mandatory: bool,
    pub completed_required: u32,
    pub total_required: u32,
    pub percentage: u8,
    pub modules: Vec<ModuleProgressDto>,
}

impl From<CourseProgress> for CourseProgressDto {
    fn from(progress: CourseProgress) -> Self {
        let percentage = progress.percentage();
        let course = progress.course;
        CourseProgressDto {
            id: course.id,
            title: course.title,
            description: course.description,
            difficulty: course.difficulty,
            is_mandatory: course.is_mandatory,
            completed_required: progress.completed_required,
            total_required: progress.total_required,
            percentage,
            modules: progress.modules.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct TrainingOverviewDto {
    pub completed_required: u32,
    pub total_required: u32,
    pub percentage: u8,
    pub courses: Vec<CourseProgressDto>,
}

impl From<TrainingOverview> for TrainingOverviewDto {
    fn from(overview: TrainingOverview) -> Self {
        TrainingOverviewDto {
            percentage: overview.percentage(),
            completed_required: overview.completed_required,
            total_required: overview.total_required,
            courses: overview.courses.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct CompletionDto {
    pub module_id: String,
    pub course_id: String,
    pub is_completed: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_spent_minutes: u32,
}

impl From<ModuleCompletion> for CompletionDto {
    fn from(completion: ModuleCompletion) -> Self {
        CompletionDto {
            module_id: completion.module_id,
            course_id: completion.course_id,
            is_completed: completion.is_completed,
            started_at: completion.started_at,
            completed_at: completion.completed_at,
            time_spent_minutes: completion.time_spent_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ModuleDto {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    pub position: u32,
    pub content_url: Option<String>,
    pub text_content: Option<String>,
    pub duration_minutes: u32,
    pub is_required: bool,
    pub is_published: bool,
}

impl From<TrainingModule> for ModuleDto {
    fn from(module: TrainingModule) -> Self {
        ModuleDto {
            id: module.id,
            course_id: module.course_id,
            title: module.title,
            description: module.description,
            content_type: module.content_type,
            position: module.position,
            content_url: module.content_url,
            text_content: module.text_content,
            duration_minutes: module.duration_minutes,
            is_required: module.is_required,
            is_published: module.is_published,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ModuleAccessDto {
    pub module: ModuleDto,
    pub completion: CompletionDto,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct CourseDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub order: i32,
    pub is_active: bool,
    pub is_mandatory: bool,
    pub estimated_duration_minutes: u32,
}

impl From<TrainingCourse> for CourseDto {
    fn from(course: TrainingCourse) -> Self {
        CourseDto {
            id: course.id,
            title: course.title,
            description: course.description,
            difficulty: course.difficulty,
            order: course.order,
            is_active: course.is_active,
            is_mandatory: course.is_mandatory,
            estimated_duration_minutes: course.estimated_duration_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptSummaryDto {
    pub id: String,
    pub assessment_id: String,
    pub attempt_number: u32,
    pub status: AttemptStatus,
    pub outcome: Option<AttemptOutcome>,
    pub answered: u32,
    pub total_questions: u32,
    pub score_percentage: Option<u8>,
    pub passed: bool,
    pub passing_threshold: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&AssessmentAttempt> for AttemptSummaryDto {
    fn from(attempt: &AssessmentAttempt) -> Self {
        AttemptSummaryDto {
            id: attempt.id.clone(),
            assessment_id: attempt.assessment_id.clone(),
            attempt_number: attempt.attempt_number,
            status: attempt.status,
            outcome: attempt.outcome,
            answered: attempt.responses.len() as u32,
            total_questions: attempt.total_questions,
            score_percentage: attempt.score_percentage,
            passed: attempt.passed,
            passing_threshold: attempt.passing_threshold,
            started_at: attempt.started_at,
            deadline: attempt.deadline().ok().flatten(),
            completed_at: attempt.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AssessmentSummaryDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub question_count: u32,
    pub passing_threshold: u8,
    pub max_attempts: Option<u32>,
    pub attempts_used: u32,
    pub attempts_remaining: Option<u32>,
    pub time_limit_seconds: Option<i64>,
    pub last_attempt: Option<AttemptSummaryDto>,
}

impl From<AssessmentSummary> for AssessmentSummaryDto {
    fn from(summary: AssessmentSummary) -> Self {
        let attempts_remaining = summary.attempts_remaining();
        let config = &summary.assessment.config;
        AssessmentSummaryDto {
            question_count: config.question_count,
            passing_threshold: config.passing_threshold,
            max_attempts: match config.max_attempts {
                MaxAttempts::Limited(limit) => Some(limit),
                MaxAttempts::Unlimited => None,
            },
            time_limit_seconds: config.time_limit_seconds(),
            attempts_used: summary.attempts_used,
            attempts_remaining,
            last_attempt: summary.last_attempt.as_ref().map(Into::into),
            id: summary.assessment.id,
            title: summary.assessment.title,
            description: summary.assessment.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AssessmentDto {
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub question_count: u32,
    pub passing_threshold: u8,
    pub max_attempts: Option<u32>,
    pub cooldown_seconds: Option<i64>,
    pub time_limit_seconds: Option<i64>,
    pub show_correct_answers_on_fail: bool,
}

impl From<Assessment> for AssessmentDto {
    fn from(assessment: Assessment) -> Self {
        let config = &assessment.config;
        AssessmentDto {
            question_count: config.question_count,
            passing_threshold: config.passing_threshold,
            max_attempts: match config.max_attempts {
                MaxAttempts::Limited(limit) => Some(limit),
                MaxAttempts::Unlimited => None,
            },
            cooldown_seconds: config.cooldown_seconds(),
            time_limit_seconds: config.time_limit_seconds(),
            show_correct_answers_on_fail: config.show_correct_answers_on_fail,
            id: assessment.id,
            title: assessment.title,
            description: assessment.description,
            is_active: assessment.is_active,
        }
    }
}

/// Admin view of a question, including the answer key.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionDto {
    pub id: String,
    pub assessment_id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: u8,
    pub explanation: String,
    pub is_active: bool,
}

impl From<Question> for QuestionDto {
    fn from(question: Question) -> Self {
        QuestionDto {
            id: question.id,
            assessment_id: question.assessment_id,
            text: question.text,
            options: question.options.to_vec(),
            correct_option: question.correct_option,
            explanation: question.explanation,
            is_active: question.is_active,
        }
    }
}

/// A question as shown to the learner. Never carries the answer key.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct PresentedQuestionDto {
    pub question_id: String,
    pub text: String,
    pub options: Vec<String>,
    pub selected_option: Option<u8>,
}

impl From<PresentedQuestion> for PresentedQuestionDto {
    fn from(question: PresentedQuestion) -> Self {
        PresentedQuestionDto {
            question_id: question.question_id,
            text: question.text,
            options: question.options,
            selected_option: question.selected_position,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptDto {
    pub attempt: AttemptSummaryDto,
    pub questions: Vec<PresentedQuestionDto>,
}

impl AttemptDto {
    pub fn new(attempt: &AssessmentAttempt, questions: Vec<(PresentedQuestion, Question)>) -> Self {
        AttemptDto {
            attempt: attempt.into(),
            questions: questions
                .into_iter()
                .map(|(presented, _)| presented.into())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ReviewItemDto {
    pub question_id: String,
    pub text: String,
    pub options: Vec<String>,
    pub selected_option: Option<u8>,
    pub is_correct: bool,
    pub correct_option: Option<u8>,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptResultDto {
    pub attempt: AttemptSummaryDto,
    pub answers_revealed: bool,
    pub items: Vec<ReviewItemDto>,
}

impl From<AttemptReview> for AttemptResultDto {
    fn from(review: AttemptReview) -> Self {
        AttemptResultDto {
            attempt: (&review.attempt).into(),
            answers_revealed: review.answers_revealed,
            items: review
                .items
                .into_iter()
                .map(|item| ReviewItemDto {
                    question_id: item.question.question_id,
                    text: item.question.text,
                    options: item.question.options,
                    selected_option: item.question.selected_position,
                    is_correct: item.is_correct,
                    correct_option: item.correct_position,
                    explanation: item.explanation,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct FinalizeResponse {
    pub attempt: AttemptSummaryDto,
    pub newly_certified: bool,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct CertificationDto {
    pub is_certified: bool,
    pub certified_at: Option<DateTime<Utc>>,
    pub passing_attempt_id: Option<String>,
}

impl From<Certification> for CertificationDto {
    fn from(certification: Certification) -> Self {
        CertificationDto {
            is_certified: certification.is_certified,
            certified_at: certification.certified_at,
            passing_attempt_id: certification.passing_attempt_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct DayScheduleDto {
    pub day: DayOfWeek,
    pub is_open: bool,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

impl From<DaySchedule> for DayScheduleDto {
    fn from(day: DaySchedule) -> Self {
        DayScheduleDto {
            day: day.day.into(),
            is_open: day.is_open,
            opening_time: day.opening_time,
            closing_time: day.closing_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct OfficeScheduleDto {
    pub id: String,
    pub name: String,
    pub code: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub timezone: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub week: Vec<DayScheduleDto>,
}

impl From<OfficeSchedule> for OfficeScheduleDto {
    fn from(schedule: OfficeSchedule) -> Self {
        let office = schedule.office;
        OfficeScheduleDto {
            id: office.id,
            name: office.name,
            code: office.code,
            address_line_1: office.address_line_1,
            address_line_2: office.address_line_2,
            city: office.city,
            state: office.state,
            postal_code: office.postal_code,
            country: office.country,
            timezone: office.timezone,
            phone_number: office.phone_number,
            email: office.email,
            notes: office.notes,
            week: schedule.week.into_iter().map(Into::into).collect(),
        }
    }
}
