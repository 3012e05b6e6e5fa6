use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{CompletionEvidence, ModuleCompletion, TrainingCourse, TrainingModule},
    repositories::{CompletionRepository, TrainingRepository},
};

#[derive(Clone, Debug)]
pub struct ModuleProgress {
    pub module: TrainingModule,
    pub is_completed: bool,
    pub is_unlocked: bool,
}

#[derive(Clone, Debug)]
pub struct CourseProgress {
    pub course: TrainingCourse,
    pub modules: Vec<ModuleProgress>,
    pub completed_required: u32,
    pub total_required: u32,
}

impl CourseProgress {
    pub fn percentage(&self) -> u8 {
        progress_percentage(self.completed_required, self.total_required)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_required == self.total_required
    }
}

#[derive(Clone, Debug)]
pub struct TrainingOverview {
    pub courses: Vec<CourseProgress>,
    pub completed_required: u32,
    pub total_required: u32,
}

impl TrainingOverview {
    pub fn percentage(&self) -> u8 {
        progress_percentage(self.completed_required, self.total_required)
    }
}

fn progress_percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    (completed.min(total) * 100 / total) as u8
}

/// The first required, published module before `module` in `course_modules`
/// that is not in `completed`. `None` means `module` is unlocked.
pub fn first_missing_prerequisite<'a>(
    module: &TrainingModule,
    course_modules: &'a [TrainingModule],
    completed: &HashSet<String>,
) -> Option<&'a TrainingModule> {
    if module.position <= 1 {
        return None;
    }
    let mut earlier: Vec<&TrainingModule> = course_modules
        .iter()
        .filter(|m| {
            m.course_id == module.course_id
                && m.position < module.position
                && m.is_required
                && m.is_published
        })
        .collect();
    earlier.sort_by_key(|m| m.position);
    earlier.into_iter().find(|m| !completed.contains(&m.id))
}

pub struct ProgressionService {
    training: Arc<dyn TrainingRepository>,
    completions: Arc<dyn CompletionRepository>,
}

impl ProgressionService {
    pub fn new(
        training: Arc<dyn TrainingRepository>,
        completions: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            training,
            completions,
        }
    }

    /// Published module lookup. Drafts are reported as missing.
    pub async fn get_published_module(&self, module_id: &str) -> AppResult<TrainingModule> {
        self.training
            .find_module(module_id)
            .await?
            .filter(|m| m.is_published)
            .ok_or_else(|| AppError::NotFound(format!("Module with id '{}' not found", module_id)))
    }

    async fn completed_ids(&self, user_id: &str, course_id: &str) -> AppResult<HashSet<String>> {
        let completed = self
            .completions
            .list_for_user_course(user_id, course_id)
            .await?
            .into_iter()
            .filter(|c| c.is_completed)
            .map(|c| c.module_id)
            .collect();
        Ok(completed)
    }

    pub async fn is_unlocked(&self, user_id: &str, module: &TrainingModule) -> AppResult<bool> {
        if module.position <= 1 {
            return Ok(true);
        }
        let course_modules = self.training.list_course_modules(&module.course_id).await?;
        let completed = self.completed_ids(user_id, &module.course_id).await?;
        Ok(first_missing_prerequisite(module, &course_modules, &completed).is_none())
    }

    async fn ensure_unlocked(&self, user_id: &str, module: &TrainingModule) -> AppResult<()> {
        if module.position <= 1 {
            return Ok(());
        }
        let course_modules = self.training.list_course_modules(&module.course_id).await?;
        let completed = self.completed_ids(user_id, &module.course_id).await?;

        match first_missing_prerequisite(module, &course_modules, &completed) {
            Some(missing) => Err(AppError::LockedModule {
                module: module.title.clone(),
                prerequisite: missing.title.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Opens a module for the user, recording that they started it.
    pub async fn access_module(
        &self,
        user_id: &str,
        module_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(TrainingModule, ModuleCompletion)> {
        let module = self.get_published_module(module_id).await?;
        self.ensure_unlocked(user_id, &module).await?;

        let completion = self
            .completions
            .get_or_create(ModuleCompletion::started(user_id, &module, now))
            .await?;
        Ok((module, completion))
    }

    pub async fn mark_completed(
        &self,
        user_id: &str,
        module_id: &str,
        evidence: CompletionEvidence,
        now: DateTime<Utc>,
    ) -> AppResult<ModuleCompletion> {
        let module = self.get_published_module(module_id).await?;

        if let Some(existing) = self.completions.find(user_id, module_id).await? {
            if existing.is_completed {
                return Ok(existing);
            }
        }

        self.ensure_unlocked(user_id, &module).await?;
        evidence
            .satisfies(module.content_type)
            .map_err(AppError::IncompleteEvidence)?;

        self.completions
            .get_or_create(ModuleCompletion::started(user_id, &module, now))
            .await?;

        let updated = self
            .completions
            .mark_completed(user_id, module_id, now, evidence.time_spent_minutes())
            .await?;

        match updated {
            Some(completion) => {
                log::info!(
                    "[MODULE_COMPLETED] user={} module={} course={} minutes={}",
                    user_id,
                    module.id,
                    module.course_id,
                    completion.time_spent_minutes
                );
                Ok(completion)
            }
            // completed by a concurrent request
            None => self.completions.find(user_id, module_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("No completion for module '{}'", module_id))
            }),
        }
    }

    pub async fn course_progress(&self, user_id: &str, course_id: &str) -> AppResult<CourseProgress> {
        let course = self
            .training
            .find_course(course_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Course with id '{}' not found", course_id)))?;
        self.progress_for(user_id, course).await
    }

    async fn progress_for(&self, user_id: &str, course: TrainingCourse) -> AppResult<CourseProgress> {
        let course_modules = self.training.list_course_modules(&course.id).await?;
        let completed = self.completed_ids(user_id, &course.id).await?;

        let modules: Vec<ModuleProgress> = course_modules
            .iter()
            .filter(|m| m.is_published)
            .map(|m| ModuleProgress {
                module: m.clone(),
                is_completed: completed.contains(&m.id),
                is_unlocked: first_missing_prerequisite(m, &course_modules, &completed).is_none(),
            })
            .collect();

        let required = modules.iter().filter(|p| p.module.is_required);
        let total_required = required.clone().count() as u32;
        let completed_required = required.filter(|p| p.is_completed).count() as u32;

        Ok(CourseProgress {
            course,
            modules,
            completed_required,
            total_required,
        })
    }

    pub async fn overview(&self, user_id: &str) -> AppResult<TrainingOverview> {
        let courses = self.training.list_active_courses().await?;

        let mut progress = Vec::with_capacity(courses.len());
        for course in courses {
            progress.push(self.progress_for(user_id, course).await?);
        }

        let mandatory = progress.iter().filter(|p| p.course.is_mandatory);
        let completed_required: u32 = mandatory.clone().map(|p| p.completed_required).sum();
        let total_required: u32 = mandatory.map(|p| p.total_required).sum();

        Ok(TrainingOverview {
            courses: progress,
            completed_required,
            total_required,
        })
    }
}
