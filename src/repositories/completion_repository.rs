use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::info;
use mongodb::{
    bson::{doc, to_bson, to_document},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::ModuleCompletion,
};

#[async_trait]
pub trait CompletionRepository: Send + Sync {
    async fn find(&self, user_id: &str, module_id: &str) -> AppResult<Option<ModuleCompletion>>;
    /// Returns the existing record for (user, module) or inserts `started`.
    /// Concurrent callers observe the same record.
    async fn get_or_create(&self, started: ModuleCompletion) -> AppResult<ModuleCompletion>;
    /// Flips the record to completed. Returns `None` when it was already
    /// completed, so only one caller wins.
    async fn mark_completed(
        &self,
        user_id: &str,
        module_id: &str,
        completed_at: DateTime<Utc>,
        time_spent_minutes: u32,
    ) -> AppResult<Option<ModuleCompletion>>;
    async fn list_for_user_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Vec<ModuleCompletion>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoCompletionRepository {
    collection: Collection<ModuleCompletion>,
}

impl MongoCompletionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("module_completions");
        Self { collection }
    }
}

#[async_trait]
impl CompletionRepository for MongoCompletionRepository {
    async fn find(&self, user_id: &str, module_id: &str) -> AppResult<Option<ModuleCompletion>> {
        let completion = self
            .collection
            .find_one(doc! { "user_id": user_id, "module_id": module_id })
            .await?;
        Ok(completion)
    }

    async fn get_or_create(&self, started: ModuleCompletion) -> AppResult<ModuleCompletion> {
        let filter = doc! { "user_id": &started.user_id, "module_id": &started.module_id };
        let insert = to_document(&started)?;

        let completion = self
            .collection
            .find_one_and_update(filter, doc! { "$setOnInsert": insert })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        completion.ok_or_else(|| {
            AppError::DatabaseError(format!(
                "Upsert returned no completion for module '{}'",
                started.module_id
            ))
        })
    }

    async fn mark_completed(
        &self,
        user_id: &str,
        module_id: &str,
        completed_at: DateTime<Utc>,
        time_spent_minutes: u32,
    ) -> AppResult<Option<ModuleCompletion>> {
        let completion = self
            .collection
            .find_one_and_update(
                doc! { "user_id": user_id, "module_id": module_id, "is_completed": false },
                doc! {
                    "$set": {
                        "is_completed": true,
                        "completed_at": to_bson(&completed_at)?,
                        "time_spent_minutes": time_spent_minutes as i64,
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(completion)
    }

    async fn list_for_user_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Vec<ModuleCompletion>> {
        let completions = self
            .collection
            .find(doc! { "user_id": user_id, "course_id": course_id })
            .await?
            .try_collect()
            .await?;
        Ok(completions)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let user_module_model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "module_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_module_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(user_module_model).await?;
        info!("Created unique index on module_completions.(user_id, module_id)");

        let user_course_model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "course_id": 1 })
            .build();
        self.collection.create_index(user_course_model).await?;
        info!("Created index on module_completions.(user_id, course_id)");

        Ok(())
    }
}
