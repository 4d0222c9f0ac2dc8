use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContactMessage, ContentItem, Listing, ListingReview, Moderation, NewListing};
use crate::database::DatabaseError;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid record: {0}")]
    Invalid(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for RecordError {
    fn from(err: sqlx::Error) -> Self {
        RecordError::Database(DatabaseError::Sqlx(err))
    }
}

/// Directory listings: created by members, decided by reviewers
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create_listing(&self, listing: NewListing) -> Result<Listing, RecordError>;

    async fn listing(&self, id: Uuid) -> Result<Option<Listing>, RecordError>;

    /// `Ok(None)` when no listing has this id
    async fn review_listing(&self, id: Uuid, review: ListingReview) -> Result<Option<Listing>, RecordError>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// `Ok(None)` when no content of this type has this id
    async fn moderate_content(
        &self,
        content_type: &str,
        id: Uuid,
        moderation: Moderation,
    ) -> Result<Option<ContentItem>, RecordError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn record_message(&self, message: ContactMessage) -> Result<(), RecordError>;
}

/// Process-local records for development and tests
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    listings: RwLock<HashMap<Uuid, Listing>>,
    content: RwLock<HashMap<(String, Uuid), ContentItem>>,
    messages: RwLock<Vec<ContactMessage>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_content(&self, item: ContentItem) {
        self.content
            .write()
            .await
            .insert((item.content_type.clone(), item.id), item);
    }

    pub async fn content(&self, content_type: &str, id: Uuid) -> Option<ContentItem> {
        self.content
            .read()
            .await
            .get(&(content_type.to_string(), id))
            .cloned()
    }

    pub async fn messages(&self) -> Vec<ContactMessage> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl ListingStore for MemoryRecordStore {
    async fn create_listing(&self, listing: NewListing) -> Result<Listing, RecordError> {
        let listing = Listing::pending(Uuid::new_v4(), listing);
        self.listings.write().await.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn listing(&self, id: Uuid) -> Result<Option<Listing>, RecordError> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn review_listing(&self, id: Uuid, review: ListingReview) -> Result<Option<Listing>, RecordError> {
        let mut listings = self.listings.write().await;
        Ok(listings.get_mut(&id).map(|listing| {
            listing.status = review.status;
            listing.reviewed_by = Some(review.reviewed_by);
            listing.review_notes = review.notes;
            listing.clone()
        }))
    }
}

#[async_trait]
impl ContentStore for MemoryRecordStore {
    async fn moderate_content(
        &self,
        content_type: &str,
        id: Uuid,
        moderation: Moderation,
    ) -> Result<Option<ContentItem>, RecordError> {
        let mut content = self.content.write().await;
        Ok(content.get_mut(&(content_type.to_string(), id)).map(|item| {
            item.visibility = moderation.visibility;
            item.moderated_by = Some(moderation.moderated_by);
            item.moderation_reason = moderation.reason;
            item.clone()
        }))
    }
}

#[async_trait]
impl MessageStore for MemoryRecordStore {
    async fn record_message(&self, message: ContactMessage) -> Result<(), RecordError> {
        self.messages.write().await.push(message);
        Ok(())
    }
}
