use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Assessment,
};

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    async fn create(&self, assessment: Assessment) -> AppResult<Assessment>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assessment>>;
    async fn update(&self, assessment: Assessment) -> AppResult<Assessment>;
    async fn list_active(&self) -> AppResult<Vec<Assessment>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAssessmentRepository {
    collection: Collection<Assessment>,
}

impl MongoAssessmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("assessments");
        Self { collection }
    }
}

#[async_trait]
impl AssessmentRepository for MongoAssessmentRepository {
    async fn create(&self, assessment: Assessment) -> AppResult<Assessment> {
        self.collection.insert_one(&assessment).await?;
        Ok(assessment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assessment>> {
        let assessment = self.collection.find_one(doc! { "id": id }).await?;
        Ok(assessment)
    }

    async fn update(&self, assessment: Assessment) -> AppResult<Assessment> {
        let result = self
            .collection
            .replace_one(doc! { "id": &assessment.id }, &assessment)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Assessment with id '{}' not found",
                assessment.id
            )));
        }
        Ok(assessment)
    }

    async fn list_active(&self) -> AppResult<Vec<Assessment>> {
        let assessments = self
            .collection
            .find(doc! { "is_active": true })
            .sort(doc! { "title": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(assessments)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(id_model).await?;
        log::info!("Created unique index on assessments.id");
        Ok(())
    }
}
