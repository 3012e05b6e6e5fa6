use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{
            Assessment, Office, OfficeHours, Question, TrainingCourse, TrainingModule,
        },
        dto::request::{
            CreateAssessmentRequest, CreateCourseRequest, CreateModuleRequest,
            CreateOfficeRequest, CreateQuestionRequest,
        },
    },
    repositories::{AssessmentRepository, OfficeRepository, QuestionRepository, TrainingRepository},
};

/// Position for a module appended to the end of a course.
pub fn next_position(modules: &[TrainingModule]) -> u32 {
    modules.iter().map(|m| m.position).max().unwrap_or(0) + 1
}

/// Assigns positions `1..=n` following `module_ids`, which must name every
/// module of the course exactly once. Returns the modules whose position
/// changed.
pub fn apply_order(
    mut modules: Vec<TrainingModule>,
    module_ids: &[String],
) -> AppResult<Vec<TrainingModule>> {
    let requested: HashSet<&str> = module_ids.iter().map(String::as_str).collect();
    let existing: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();

    if requested.len() != module_ids.len() {
        return Err(AppError::ValidationError(
            "Module order lists a module more than once".to_string(),
        ));
    }
    if requested != existing {
        return Err(AppError::ValidationError(
            "Module order must list every module of the course exactly once".to_string(),
        ));
    }

    let mut changed = Vec::new();
    for module in modules.iter_mut() {
        let position = module_ids
            .iter()
            .position(|id| *id == module.id)
            .map(|index| index as u32 + 1)
            .ok_or_else(|| AppError::NotFound(format!("Module '{}' not in course", module.id)))?;
        if module.position != position {
            module.position = position;
            changed.push(module.clone());
        }
    }
    Ok(changed)
}

/// Admin-side authoring of training content, assessments and offices.
pub struct ContentService {
    training: Arc<dyn TrainingRepository>,
    assessments: Arc<dyn AssessmentRepository>,
    questions: Arc<dyn QuestionRepository>,
    offices: Arc<dyn OfficeRepository>,
}

impl ContentService {
    pub fn new(
        training: Arc<dyn TrainingRepository>,
        assessments: Arc<dyn AssessmentRepository>,
        questions: Arc<dyn QuestionRepository>,
        offices: Arc<dyn OfficeRepository>,
    ) -> Self {
        Self {
            training,
            assessments,
            questions,
            offices,
        }
    }

    pub async fn create_course(&self, request: CreateCourseRequest) -> AppResult<TrainingCourse> {
        request.validate()?;

        let mut course = TrainingCourse::new(
            &request.title,
            &request.description,
            request.difficulty,
            request.order,
        );
        course.is_mandatory = request.is_mandatory;
        course.estimated_duration_minutes = request.estimated_duration_minutes;

        let course = self.training.create_course(course).await?;
        log::info!("Created course {} '{}'", course.id, course.title);
        Ok(course)
    }

    pub async fn create_module(
        &self,
        course_id: &str,
        request: CreateModuleRequest,
    ) -> AppResult<TrainingModule> {
        request.validate()?;
        self.get_course(course_id).await?;

        let existing = self.training.list_course_modules(course_id).await?;
        let position = match request.position {
            Some(position) if existing.iter().any(|m| m.position == position) => {
                return Err(AppError::AlreadyExists(format!(
                    "Course '{}' already has a module at position {}",
                    course_id, position
                )))
            }
            Some(position) => position,
            None => next_position(&existing),
        };

        let mut module =
            TrainingModule::new(course_id, &request.title, request.content_type, position);
        module.description = request.description;
        module.content_url = request.content_url;
        module.text_content = request.text_content;
        module.duration_minutes = request.duration_minutes;
        module.is_required = request.is_required;

        let module = self.training.create_module(module).await?;
        log::info!(
            "Created module {} at position {} in course {}",
            module.id,
            module.position,
            course_id
        );
        Ok(module)
    }

    pub async fn reorder_modules(
        &self,
        course_id: &str,
        module_ids: &[String],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<TrainingModule>> {
        self.get_course(course_id).await?;

        let modules = self.training.list_course_modules(course_id).await?;
        for mut module in apply_order(modules, module_ids)? {
            module.modified_at = Some(now);
            self.training.update_module(module).await?;
        }

        log::info!("Reordered {} modules in course {}", module_ids.len(), course_id);
        self.training.list_course_modules(course_id).await
    }

    pub async fn publish_module(
        &self,
        module_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<TrainingModule> {
        let mut module = self
            .training
            .find_module(module_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Module with id '{}' not found", module_id)))?;

        if module.is_published {
            return Ok(module);
        }
        module.is_published = true;
        module.modified_at = Some(now);
        self.training.update_module(module).await
    }

    pub async fn create_assessment(&self, request: CreateAssessmentRequest) -> AppResult<Assessment> {
        request.validate()?;
        let config = request.config();
        config.validate()?;

        let assessment = Assessment::new(&request.title, &request.description, config);
        let assessment = self.assessments.create(assessment).await?;
        log::info!("Created assessment {} '{}'", assessment.id, assessment.title);
        Ok(assessment)
    }

    pub async fn create_question(
        &self,
        assessment_id: &str,
        request: CreateQuestionRequest,
    ) -> AppResult<Question> {
        request.validate()?;
        if self.assessments.find_by_id(assessment_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Assessment with id '{}' not found",
                assessment_id
            )));
        }

        let options: [String; 4] = request.options.try_into().map_err(|_| {
            AppError::ValidationError("Questions need exactly four options".to_string())
        })?;
        let question = Question::new(
            assessment_id,
            &request.text,
            options,
            request.correct_option,
            &request.explanation,
        );
        if !question.has_valid_answer_key() {
            return Err(AppError::ValidationError(
                "correct_option must be between 0 and 3".to_string(),
            ));
        }

        self.questions.create(question).await
    }

    pub async fn deactivate_question(&self, question_id: &str) -> AppResult<()> {
        self.questions.set_active(question_id, false).await?;
        log::info!("Deactivated question {}", question_id);
        Ok(())
    }

    pub async fn list_questions(&self, assessment_id: &str) -> AppResult<Vec<Question>> {
        self.questions.list_active(assessment_id).await
    }

    pub async fn create_office(&self, request: CreateOfficeRequest) -> AppResult<Office> {
        request.validate()?;

        let mut office = Office::new(
            &request.name,
            &request.code,
            &request.city,
            &request.postal_code,
            &request.timezone,
        );
        office.address_line_1 = request.address_line_1;
        office.address_line_2 = request.address_line_2;
        office.state = request.state;
        if let Some(country) = request.country {
            office.country = country;
        }
        office.phone_number = request.phone_number;
        office.email = request.email;
        office.notes = request.notes;
        office.order = request.order;
        office.hours = request
            .hours
            .into_iter()
            .map(|h| OfficeHours {
                day_of_week: h.day_of_week.into(),
                is_open: h.is_open,
                opening_time: h.opening_time,
                closing_time: h.closing_time,
            })
            .collect();
        office.validate_hours()?;

        self.offices.create(office).await
    }

    async fn get_course(&self, course_id: &str) -> AppResult<TrainingCourse> {
        self.training
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course with id '{}' not found", course_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::course_modules;

    fn modules(count: u32) -> Vec<TrainingModule> {
        course_modules("course-1", count)
    }

    #[test]
    fn next_position_follows_the_highest() {
        assert_eq!(next_position(&[]), 1);

        let mut existing = modules(2);
        existing[1].position = 7;
        assert_eq!(next_position(&existing), 8);
    }

    #[test]
    fn apply_order_renumbers_from_one() {
        let existing = modules(3);
        let ids = vec![
            existing[2].id.clone(),
            existing[0].id.clone(),
            existing[1].id.clone(),
        ];

        let changed = apply_order(existing, &ids).unwrap();
        assert_eq!(changed.len(), 3);

        let position_of = |id: &str| changed.iter().find(|m| m.id == id).unwrap().position;
        assert_eq!(position_of(&ids[0]), 1);
        assert_eq!(position_of(&ids[1]), 2);
        assert_eq!(position_of(&ids[2]), 3);
    }

    #[test]
    fn apply_order_skips_unmoved_modules() {
        let existing = modules(3);
        let ids = vec![
            existing[0].id.clone(),
            existing[2].id.clone(),
            existing[1].id.clone(),
        ];

        let changed = apply_order(existing, &ids).unwrap();
        assert_eq!(changed.len(), 2);
    }

    #[test]
    fn apply_order_requires_a_full_permutation() {
        let existing = modules(3);
        let missing = vec![existing[0].id.clone(), existing[1].id.clone()];
        let repeated = vec![
            existing[0].id.clone(),
            existing[0].id.clone(),
            existing[1].id.clone(),
        ];
        let foreign = vec![
            existing[0].id.clone(),
            existing[1].id.clone(),
            "not-in-course".to_string(),
        ];

        for ids in [missing, repeated, foreign] {
            assert!(matches!(
                apply_order(existing.clone(), &ids),
                Err(AppError::ValidationError(_))
            ));
        }
    }
}
