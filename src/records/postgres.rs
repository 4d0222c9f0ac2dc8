use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::store::{ContentStore, ListingStore, MessageStore, RecordError};
use super::{ContactMessage, ContentItem, Listing, ListingReview, Moderation, NewListing};
use crate::config::RecordConfig;
use crate::database::{DatabaseError, DatabaseManager};

const LISTING_COLUMNS: &str = "id, owner_id, business_name, category, country, website, employees, \
     founded, description, logo_sha256, status, reviewed_by, review_notes";

const CONTENT_COLUMNS: &str = "id, content_type, visibility, moderated_by, moderation_reason";

fn insert_listing_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (id, owner_id, business_name, category, country, website, employees, \
         founded, description, logo_sha256, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
        table, LISTING_COLUMNS
    )
}

fn select_listing_sql(table: &str) -> String {
    format!("SELECT {} FROM {} WHERE id = $1", LISTING_COLUMNS, table)
}

fn review_listing_sql(table: &str) -> String {
    format!(
        "UPDATE {} SET status = $2, reviewed_by = $3, review_notes = $4 WHERE id = $1 RETURNING {}",
        table, LISTING_COLUMNS
    )
}

fn moderate_content_sql(table: &str) -> String {
    format!(
        "UPDATE {} SET visibility = $3, moderated_by = $4, moderation_reason = $5 \
         WHERE id = $1 AND content_type = $2 RETURNING {}",
        table, CONTENT_COLUMNS
    )
}

fn insert_message_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (id, name, email, subject, message) VALUES ($1, $2, $3, $4, $5)",
        table
    )
}

/// Records kept in three tables:
///
/// - listings: `id uuid`, `owner_id uuid`, `business_name`, `category`, `country text`,
///   `website text`, `employees bigint`, `founded date`, `description text`,
///   `logo_sha256 text`, `status text`, `reviewed_by uuid`, `review_notes text`
/// - content: `id uuid`, `content_type text`, `visibility text`, `moderated_by uuid`,
///   `moderation_reason text`
/// - contact messages: `id uuid`, `name`, `email`, `subject`, `message text`
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    listings: String,
    content: String,
    messages: String,
}

impl PgRecordStore {
    pub fn new(pool: PgPool, config: &RecordConfig) -> Result<Self, DatabaseError> {
        Ok(Self {
            pool,
            listings: DatabaseManager::qualified_table(&config.listings_table)?,
            content: DatabaseManager::qualified_table(&config.content_table)?,
            messages: DatabaseManager::qualified_table(&config.messages_table)?,
        })
    }

    fn row_to_listing(row: &PgRow) -> Result<Listing, RecordError> {
        let status: String = row.try_get("status")?;

        Ok(Listing {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            business_name: row.try_get("business_name")?,
            category: row.try_get("category")?,
            country: row.try_get("country")?,
            website: row.try_get("website")?,
            employees: row.try_get("employees")?,
            founded: row.try_get("founded")?,
            description: row.try_get("description")?,
            logo_sha256: row.try_get("logo_sha256")?,
            status: status.parse()?,
            reviewed_by: row.try_get("reviewed_by")?,
            review_notes: row.try_get("review_notes")?,
        })
    }

    fn row_to_content(row: &PgRow) -> Result<ContentItem, RecordError> {
        let visibility: String = row.try_get("visibility")?;

        Ok(ContentItem {
            id: row.try_get("id")?,
            content_type: row.try_get("content_type")?,
            visibility: visibility.parse()?,
            moderated_by: row.try_get("moderated_by")?,
            moderation_reason: row.try_get("moderation_reason")?,
        })
    }
}

#[async_trait]
impl ListingStore for PgRecordStore {
    async fn create_listing(&self, listing: NewListing) -> Result<Listing, RecordError> {
        let listing = Listing::pending(Uuid::new_v4(), listing);

        let row = sqlx::query(&insert_listing_sql(&self.listings))
            .bind(listing.id)
            .bind(listing.owner_id)
            .bind(&listing.business_name)
            .bind(&listing.category)
            .bind(&listing.country)
            .bind(&listing.website)
            .bind(listing.employees)
            .bind(listing.founded)
            .bind(&listing.description)
            .bind(&listing.logo_sha256)
            .bind(listing.status.as_str())
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_listing(&row)
    }

    async fn listing(&self, id: Uuid) -> Result<Option<Listing>, RecordError> {
        let row = sqlx::query(&select_listing_sql(&self.listings))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_listing).transpose()
    }

    async fn review_listing(&self, id: Uuid, review: ListingReview) -> Result<Option<Listing>, RecordError> {
        let row = sqlx::query(&review_listing_sql(&self.listings))
            .bind(id)
            .bind(review.status.as_str())
            .bind(review.reviewed_by)
            .bind(&review.notes)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_listing).transpose()
    }
}

#[async_trait]
impl ContentStore for PgRecordStore {
    async fn moderate_content(
        &self,
        content_type: &str,
        id: Uuid,
        moderation: Moderation,
    ) -> Result<Option<ContentItem>, RecordError> {
        let row = sqlx::query(&moderate_content_sql(&self.content))
            .bind(id)
            .bind(content_type)
            .bind(moderation.visibility.as_str())
            .bind(moderation.moderated_by)
            .bind(&moderation.reason)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_content).transpose()
    }
}

#[async_trait]
impl MessageStore for PgRecordStore {
    async fn record_message(&self, message: ContactMessage) -> Result<(), RecordError> {
        sqlx::query(&insert_message_sql(&self.messages))
            .bind(message.id)
            .bind(&message.name)
            .bind(&message.email)
            .bind(&message.subject)
            .bind(&message.message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
