//! Platform records written by the built-in actions: directory listings,
//! moderated content and contact messages.

pub mod postgres;
pub mod store;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub use postgres::PgRecordStore;
pub use store::{ContentStore, ListingStore, MemoryRecordStore, MessageStore, RecordError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Approved,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            other => Err(RecordError::Invalid(format!("unknown listing status '{}'", other))),
        }
    }
}

/// A listing as submitted, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub owner_id: Uuid,
    pub business_name: String,
    pub category: String,
    pub country: String,
    pub website: Option<String>,
    pub employees: Option<i64>,
    pub founded: Option<NaiveDate>,
    pub description: Option<String>,
    pub logo_sha256: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
    pub category: String,
    pub country: String,
    pub website: Option<String>,
    pub employees: Option<i64>,
    pub founded: Option<NaiveDate>,
    pub description: Option<String>,
    pub logo_sha256: Option<String>,
    pub status: ListingStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_notes: Option<String>,
}

impl Listing {
    /// New listings start out pending review
    pub fn pending(id: Uuid, new: NewListing) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            business_name: new.business_name,
            category: new.category,
            country: new.country,
            website: new.website,
            employees: new.employees,
            founded: new.founded,
            description: new.description,
            logo_sha256: new.logo_sha256,
            status: ListingStatus::Pending,
            reviewed_by: None,
            review_notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingReview {
    pub status: ListingStatus,
    pub reviewed_by: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
    Flagged,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Hidden => "hidden",
            Visibility::Flagged => "flagged",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visible" => Ok(Visibility::Visible),
            "hidden" => Ok(Visibility::Hidden),
            "flagged" => Ok(Visibility::Flagged),
            other => Err(RecordError::Invalid(format!("unknown visibility '{}'", other))),
        }
    }
}

/// Moderation state of one piece of user content (article, comment, event, listing)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub content_type: String,
    pub visibility: Visibility,
    pub moderated_by: Option<Uuid>,
    pub moderation_reason: Option<String>,
}

impl ContentItem {
    pub fn visible(content_type: impl Into<String>, id: Uuid) -> Self {
        Self {
            id,
            content_type: content_type.into(),
            visibility: Visibility::Visible,
            moderated_by: None,
            moderation_reason: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Moderation {
    pub visibility: Visibility,
    pub moderated_by: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}
