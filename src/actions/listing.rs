use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::action::{validated_action, validated_action_with_user, Action, ActionContext, ActionInput, ActionState};
use crate::records::{ListingReview, ListingStatus, NewListing};
use crate::schema::{Field, FileMeta, FormSchema};

pub const CATEGORIES: [&str; 8] = [
    "agriculture",
    "creative",
    "education",
    "finance",
    "health",
    "technology",
    "tourism",
    "other",
];

const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

const LISTING_NOT_FOUND: &str = "Listing not found";

#[derive(Debug, Deserialize)]
pub struct ListingInput {
    pub business_name: String,
    pub category: String,
    pub country: String,
    pub website: Option<String>,
    pub employees: Option<i64>,
    pub founded: Option<NaiveDate>,
    pub description: Option<String>,
    pub logo: Option<FileMeta>,
}

pub fn listing_schema() -> FormSchema {
    FormSchema::new()
        .field(Field::text("business_name").label("Business name").min_len(2).max_len(120))
        .field(Field::choice("category", CATEGORIES).label("Category"))
        .field(Field::text("country").label("Country").min_len(2).max_len(56))
        .field(Field::url("website").label("Website").optional())
        .field(Field::integer("employees").label("Employees").optional().min(1.0).max(1_000_000.0))
        .field(Field::date("founded").label("Founded").optional())
        .field(Field::text("description").label("Description").optional().max_len(1000))
        .field(
            Field::file("logo")
                .label("Logo")
                .optional()
                .max_bytes(MAX_LOGO_BYTES)
                .accept("image/png")
                .accept("image/jpeg")
                .accept("image/webp")
                .accept("image/svg+xml"),
        )
}

/// Directory listing submission; new listings wait for review
pub fn submit_listing() -> impl Action {
    validated_action_with_user::<ListingInput, _>("submit_listing", listing_schema(), submit)
}

async fn submit(ctx: ActionContext, input: ActionInput<ListingInput>) -> anyhow::Result<ActionState> {
    let owner = input
        .identity()
        .ok_or_else(|| anyhow!("submit_listing invoked without an identity"))?
        .id;
    let listing = input.data;

    if listing.founded.is_some_and(|d| d > Utc::now().date_naive()) {
        return Ok(ActionState::error("Founded date cannot be in the future"));
    }

    let listing = ctx
        .listings()
        .create_listing(NewListing {
            owner_id: owner,
            business_name: listing.business_name,
            category: listing.category,
            country: listing.country,
            website: listing.website,
            employees: listing.employees,
            founded: listing.founded,
            description: listing.description,
            logo_sha256: listing.logo.map(|l| l.sha256),
        })
        .await?;

    tracing::info!(
        "Listing {} '{}' ({}, {}) submitted by {}",
        listing.id,
        listing.business_name,
        listing.category,
        listing.country,
        owner
    );

    Ok(ActionState::success("Listing submitted for review.")
        .with("listing_id", listing.id)
        .with("status", listing.status)
        .with("owner_id", listing.owner_id)
        .with("logo_sha256", listing.logo_sha256))
}

#[derive(Debug, Deserialize)]
pub struct ReviewInput {
    pub listing_id: Uuid,
    pub decision: String,
    pub notes: Option<String>,
}

pub fn review_schema() -> FormSchema {
    FormSchema::new()
        .field(Field::uuid("listing_id").label("Listing"))
        .field(Field::choice("decision", ["approve", "reject"]).label("Decision"))
        .field(Field::text("notes").label("Notes").optional().max_len(1000))
}

pub fn review_listing() -> impl Action {
    validated_action::<ReviewInput, _>("review_listing", review_schema(), review).requires("reviewer")
}

async fn review(ctx: ActionContext, input: ActionInput<ReviewInput>) -> anyhow::Result<ActionState> {
    let reviewer = input
        .identity()
        .ok_or_else(|| anyhow!("review_listing invoked without an identity"))?
        .id;
    let ReviewInput { listing_id, decision, notes } = input.data;

    let (status, message) = match decision.as_str() {
        "approve" => (ListingStatus::Approved, "Listing approved."),
        _ if notes.is_none() => return Ok(ActionState::error("Notes are required when rejecting a listing")),
        _ => (ListingStatus::Rejected, "Listing rejected."),
    };

    match ctx.listings().listing(listing_id).await? {
        None => return Ok(ActionState::error(LISTING_NOT_FOUND)),
        Some(listing) if listing.status != ListingStatus::Pending => {
            return Ok(ActionState::error(format!("Listing has already been {}", listing.status)));
        }
        Some(_) => {}
    }

    let review = ListingReview {
        status,
        reviewed_by: reviewer,
        notes,
    };
    let Some(listing) = ctx.listings().review_listing(listing_id, review).await? else {
        return Ok(ActionState::error(LISTING_NOT_FOUND));
    };

    tracing::info!("Listing {} {} by reviewer {}", listing.id, listing.status, reviewer);

    Ok(ActionState::success(message)
        .with("listing_id", listing.id)
        .with("status", listing.status)
        .with("reviewed_by", reviewer)
        .with("notes", listing.review_notes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ListingStore;
    use crate::schema::{FormData, UploadedFile};
    use crate::testing::TestContext;
    use serde_json::Value;

    fn listing_form(founded: &str) -> FormData {
        FormData::new()
            .with("business_name", "Mbare Textiles")
            .with("category", "creative")
            .with("country", "Zimbabwe")
            .with("employees", "12")
            .with("founded", founded)
    }

    #[tokio::test]
    async fn member_can_submit_with_logo() {
        let t = TestContext::new();
        let member = t.member.clone();
        let mut form = listing_form("2019-06-01");
        form.append_file("logo", UploadedFile::new(Some("logo.png".into()), Some("image/png".into()), b"png".to_vec()));

        let state = t.invoke(&submit_listing(), Some(&member), form).await.unwrap();
        assert_eq!(state.success.as_deref(), Some("Listing submitted for review."));
        assert_eq!(state.data["status"], Value::from("pending"));
        assert_eq!(state.data["owner_id"], Value::from(member.id.to_string()));

        let id: Uuid = serde_json::from_value(state.data["listing_id"].clone()).unwrap();
        let stored = t.records.listing(id).await.unwrap().unwrap();
        assert_eq!(stored.business_name, "Mbare Textiles");
        assert_eq!(stored.employees, Some(12));
        assert_eq!(stored.status, ListingStatus::Pending);
        assert_eq!(state.data["logo_sha256"], Value::from(stored.logo_sha256));
    }

    #[tokio::test]
    async fn future_founding_date_is_rejected() {
        let t = TestContext::new();
        let member = t.member.clone();
        let state = t
            .invoke(&submit_listing(), Some(&member), listing_form("2999-01-01"))
            .await
            .unwrap();
        assert_eq!(state.error.as_deref(), Some("Founded date cannot be in the future"));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let t = TestContext::new();
        let member = t.member.clone();
        let form = FormData::new()
            .with("business_name", "Mbare Textiles")
            .with("category", "mining")
            .with("country", "Zimbabwe");

        let state = t.invoke(&submit_listing(), Some(&member), form).await.unwrap();
        assert!(state.error.as_deref().is_some_and(|e| e.starts_with("Category must be one of:")));
    }

    fn review_form(listing_id: Uuid, decision: &str) -> FormData {
        FormData::new()
            .with("listing_id", listing_id.to_string())
            .with("decision", decision)
    }

    #[tokio::test]
    async fn rejection_needs_notes() {
        let t = TestContext::new();
        let reviewer = t.reviewer.clone();
        let id = t.pending_listing().await;
        let form = review_form(id, "reject");

        let state = t.invoke(&review_listing(), Some(&reviewer), form.clone()).await.unwrap();
        assert_eq!(state.error.as_deref(), Some("Notes are required when rejecting a listing"));
        assert_eq!(t.records.listing(id).await.unwrap().unwrap().status, ListingStatus::Pending);

        let state = t
            .invoke(&review_listing(), Some(&reviewer), form.with("notes", "Website is unreachable"))
            .await
            .unwrap();
        assert_eq!(state.data["status"], Value::from("rejected"));

        let stored = t.records.listing(id).await.unwrap().unwrap();
        assert_eq!(stored.status, ListingStatus::Rejected);
        assert_eq!(stored.reviewed_by, Some(reviewer.id));
        assert_eq!(stored.review_notes.as_deref(), Some("Website is unreachable"));
    }

    #[tokio::test]
    async fn unknown_listing_is_not_found() {
        let t = TestContext::new();
        let reviewer = t.reviewer.clone();

        let state = t
            .invoke(&review_listing(), Some(&reviewer), review_form(Uuid::new_v4(), "approve"))
            .await
            .unwrap();
        assert_eq!(state, ActionState::error("Listing not found"));
    }

    #[tokio::test]
    async fn listings_are_reviewed_once() {
        let t = TestContext::new();
        let reviewer = t.reviewer.clone();
        let id = t.pending_listing().await;

        let state = t.invoke(&review_listing(), Some(&reviewer), review_form(id, "approve")).await.unwrap();
        assert_eq!(state.success.as_deref(), Some("Listing approved."));

        let again = review_form(id, "reject").with("notes", "Changed my mind");
        let state = t.invoke(&review_listing(), Some(&reviewer), again).await.unwrap();
        assert_eq!(state.error.as_deref(), Some("Listing has already been approved"));
        assert_eq!(t.records.listing(id).await.unwrap().unwrap().status, ListingStatus::Approved);
    }

    #[tokio::test]
    async fn moderators_cannot_review() {
        let t = TestContext::new();
        let moderator = t.moderator.clone();
        let id = t.pending_listing().await;
        let form = review_form(id, "approve");

        let state = t.invoke(&review_listing(), Some(&moderator), form).await.unwrap();
        assert_eq!(state.error.as_deref(), Some("Missing required capability: reviewer"));
        assert_eq!(t.records.listing(id).await.unwrap().unwrap().status, ListingStatus::Pending);
    }
}
