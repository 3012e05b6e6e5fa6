use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::{is_duplicate_key, Database},
    errors::{AppError, AppResult},
    models::domain::Office,
};

#[async_trait]
pub trait OfficeRepository: Send + Sync {
    async fn create(&self, office: Office) -> AppResult<Office>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Office>>;
    async fn update(&self, office: Office) -> AppResult<Office>;
    /// Active offices sorted by display order, then name.
    async fn list_active(&self) -> AppResult<Vec<Office>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoOfficeRepository {
    collection: Collection<Office>,
}

impl MongoOfficeRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("offices");
        Self { collection }
    }
}

#[async_trait]
impl OfficeRepository for MongoOfficeRepository {
    async fn create(&self, office: Office) -> AppResult<Office> {
        match self.collection.insert_one(&office).await {
            Ok(_) => Ok(office),
            Err(err) if is_duplicate_key(&err) => Err(AppError::AlreadyExists(format!(
                "Office with code '{}' already exists",
                office.code
            ))),
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Office>> {
        let office = self.collection.find_one(doc! { "id": id }).await?;
        Ok(office)
    }

    async fn update(&self, office: Office) -> AppResult<Office> {
        let result = self
            .collection
            .replace_one(doc! { "id": &office.id }, &office)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Office with id '{}' not found",
                office.id
            )));
        }
        Ok(office)
    }

    async fn list_active(&self) -> AppResult<Vec<Office>> {
        let offices = self
            .collection
            .find(doc! { "is_active": true })
            .sort(doc! { "order": 1, "name": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(offices)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_model = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let code_model = IndexModel::builder()
            .keys(doc! { "code": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("code_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_model).await?;
        self.collection.create_index(code_model).await?;
        log::info!("Created unique indexes on offices.id and offices.code");
        Ok(())
    }
}
