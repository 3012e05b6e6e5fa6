use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::{is_duplicate_key, Database},
    errors::AppResult,
    models::domain::Certification,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationRepository: Send + Sync {
    async fn find_by_user(&self, user_id: &str) -> AppResult<Option<Certification>>;
    /// Records certification for the user. Returns `true` only for the call
    /// that moved the user from uncertified to certified.
    async fn certify(
        &self,
        user_id: &str,
        attempt_id: &str,
        certified_at: DateTime<Utc>,
    ) -> AppResult<bool>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoCertificationRepository {
    collection: Collection<Certification>,
}

impl MongoCertificationRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("certifications");
        Self { collection }
    }
}

#[async_trait]
impl CertificationRepository for MongoCertificationRepository {
    async fn find_by_user(&self, user_id: &str) -> AppResult<Option<Certification>> {
        let certification = self
            .collection
            .find_one(doc! { "user_id": user_id })
            .await?;
        Ok(certification)
    }

    async fn certify(
        &self,
        user_id: &str,
        attempt_id: &str,
        certified_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let at = to_bson(&certified_at)?;
        let result = self
            .collection
            .update_one(
                doc! { "user_id": user_id, "is_certified": { "$ne": true } },
                doc! {
                    "$set": {
                        "is_certified": true,
                        "certified_at": at.clone(),
                        "passing_attempt_id": attempt_id,
                        "updated_at": at,
                    }
                },
            )
            .upsert(true)
            .await;

        match result {
            Ok(result) => Ok(result.modified_count > 0 || result.upserted_id.is_some()),
            // a concurrent call already inserted the certified record
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let user_model = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(user_model).await?;
        info!("Created unique index on certifications.user_id");
        Ok(())
    }
}
