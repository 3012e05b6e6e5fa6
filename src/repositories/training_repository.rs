use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{TrainingCourse, TrainingModule},
};

#[async_trait]
pub trait TrainingRepository: Send + Sync {
    async fn create_course(&self, course: TrainingCourse) -> AppResult<TrainingCourse>;
    async fn find_course(&self, id: &str) -> AppResult<Option<TrainingCourse>>;
    async fn update_course(&self, course: TrainingCourse) -> AppResult<TrainingCourse>;
    async fn list_active_courses(&self) -> AppResult<Vec<TrainingCourse>>;
    async fn create_module(&self, module: TrainingModule) -> AppResult<TrainingModule>;
    async fn find_module(&self, id: &str) -> AppResult<Option<TrainingModule>>;
    async fn update_module(&self, module: TrainingModule) -> AppResult<TrainingModule>;
    /// All modules of a course, published or not, ordered by position.
    async fn list_course_modules(&self, course_id: &str) -> AppResult<Vec<TrainingModule>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoTrainingRepository {
    courses: Collection<TrainingCourse>,
    modules: Collection<TrainingModule>,
}

impl MongoTrainingRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            courses: db.get_collection("training_courses"),
            modules: db.get_collection("training_modules"),
        }
    }
}

#[async_trait]
impl TrainingRepository for MongoTrainingRepository {
    async fn create_course(&self, course: TrainingCourse) -> AppResult<TrainingCourse> {
        self.courses.insert_one(&course).await?;
        Ok(course)
    }

    async fn find_course(&self, id: &str) -> AppResult<Option<TrainingCourse>> {
        let course = self.courses.find_one(doc! { "id": id }).await?;
        Ok(course)
    }

    async fn update_course(&self, course: TrainingCourse) -> AppResult<TrainingCourse> {
        let result = self
            .courses
            .replace_one(doc! { "id": &course.id }, &course)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Course with id '{}' not found",
                course.id
            )));
        }
        Ok(course)
    }

    async fn list_active_courses(&self) -> AppResult<Vec<TrainingCourse>> {
        let courses = self
            .courses
            .find(doc! { "is_active": true })
            .sort(doc! { "order": 1, "title": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(courses)
    }

    async fn create_module(&self, module: TrainingModule) -> AppResult<TrainingModule> {
        self.modules.insert_one(&module).await?;
        Ok(module)
    }

    async fn find_module(&self, id: &str) -> AppResult<Option<TrainingModule>> {
        let module = self.modules.find_one(doc! { "id": id }).await?;
        Ok(module)
    }

    async fn update_module(&self, module: TrainingModule) -> AppResult<TrainingModule> {
        let result = self
            .modules
            .replace_one(doc! { "id": &module.id }, &module)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Module with id '{}' not found",
                module.id
            )));
        }
        Ok(module)
    }

    async fn list_course_modules(&self, course_id: &str) -> AppResult<Vec<TrainingModule>> {
        let modules = self
            .modules
            .find(doc! { "course_id": course_id })
            .sort(doc! { "position": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(modules)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for training collections");

        let course_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let module_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let course_position_index = IndexModel::builder()
            .keys(doc! { "course_id": 1, "position": 1 })
            .build();

        self.courses.create_index(course_id_index).await?;
        self.modules.create_index(module_id_index).await?;
        self.modules.create_index(course_position_index).await?;

        log::info!("Successfully created indexes for training collections");
        Ok(())
    }
}
