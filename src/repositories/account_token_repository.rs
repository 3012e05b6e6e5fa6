use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{AccountToken, TokenKind},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountTokenRepository: Send + Sync {
    async fn create(&self, token: AccountToken) -> AppResult<AccountToken>;
    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<AccountToken>>;
    /// Returns `false` when the token had already been used.
    async fn mark_used(&self, id: &str, used_at: DateTime<Utc>) -> AppResult<bool>;
    async fn delete_for_user(&self, user_id: &str, kind: TokenKind) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoAccountTokenRepository {
    collection: Collection<AccountToken>,
}

impl MongoAccountTokenRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("account_tokens");
        Self { collection }
    }
}

#[async_trait]
impl AccountTokenRepository for MongoAccountTokenRepository {
    async fn create(&self, token: AccountToken) -> AppResult<AccountToken> {
        self.collection.insert_one(&token).await?;
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> AppResult<Option<AccountToken>> {
        let token = self
            .collection
            .find_one(doc! { "token_hash": token_hash })
            .await?;
        Ok(token)
    }

    async fn mark_used(&self, id: &str, used_at: DateTime<Utc>) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id, "used_at": null },
                doc! { "$set": { "used_at": to_bson(&used_at)? } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn delete_for_user(&self, user_id: &str, kind: TokenKind) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "user_id": user_id, "kind": to_bson(&kind)? })
            .await?;
        Ok(result.deleted_count)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let hash_model = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(hash_model).await?;
        info!("Created unique index on account_tokens.token_hash");

        let user_model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "kind": 1 })
            .build();
        self.collection.create_index(user_model).await?;
        info!("Created index on account_tokens.(user_id, kind)");

        Ok(())
    }
}
