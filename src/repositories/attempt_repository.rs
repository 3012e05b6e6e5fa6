use async_trait::async_trait;
use futures::TryStreamExt;
use log::info;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{is_duplicate_key, Database},
    errors::{AppError, AppResult},
    models::domain::AssessmentAttempt,
};

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn create(&self, attempt: AssessmentAttempt) -> AppResult<AssessmentAttempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<AssessmentAttempt>>;
    /// Newest attempt first.
    async fn find_by_user_and_assessment(
        &self,
        user_id: &str,
        assessment_id: &str,
    ) -> AppResult<Vec<AssessmentAttempt>>;
    /// Writes `attempt` only if the stored version still equals
    /// `expected_version`. The stored copy gets `expected_version + 1`.
    async fn save(
        &self,
        attempt: AssessmentAttempt,
        expected_version: i64,
    ) -> AppResult<AssessmentAttempt>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAttemptRepository {
    collection: Collection<AssessmentAttempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("assessment_attempts");
        Self { collection }
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create(&self, attempt: AssessmentAttempt) -> AppResult<AssessmentAttempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(err) if is_duplicate_key(&err) => Err(AppError::Conflict(format!(
                "Attempt {} for assessment '{}' already exists",
                attempt.attempt_number, attempt.assessment_id
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<AssessmentAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_by_user_and_assessment(
        &self,
        user_id: &str,
        assessment_id: &str,
    ) -> AppResult<Vec<AssessmentAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "user_id": user_id, "assessment_id": assessment_id })
            .sort(doc! { "attempt_number": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn save(
        &self,
        mut attempt: AssessmentAttempt,
        expected_version: i64,
    ) -> AppResult<AssessmentAttempt> {
        attempt.version = expected_version + 1;

        let result = self
            .collection
            .replace_one(
                doc! { "id": &attempt.id, "version": expected_version },
                &attempt,
            )
            .await?;

        if result.matched_count == 0 {
            if self.find_by_id(&attempt.id).await?.is_none() {
                return Err(AppError::NotFound(format!(
                    "Attempt with id '{}' not found",
                    attempt.id
                )));
            }
            return Err(AppError::Conflict(format!(
                "Attempt '{}' was modified concurrently",
                attempt.id
            )));
        }

        Ok(attempt)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(id_model).await?;
        info!("Created unique index on assessment_attempts.id");

        // attempt numbers never repeat for a user and assessment
        let number_model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "assessment_id": 1, "attempt_number": -1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_assessment_number_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(number_model).await?;
        info!("Created unique index on assessment_attempts.(user_id, assessment_id, attempt_number)");

        Ok(())
    }
}
