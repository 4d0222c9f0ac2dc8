use std::sync::Arc;
use uuid::Uuid;

use crate::action::{Action, ActionContext, ActionState};
use crate::capability::{CapabilityPolicy, MemoryProfileStore, Profile, ProfileStore, Role};
use crate::records::{ContentItem, ListingStore, MemoryRecordStore, NewListing};
use crate::schema::FormData;
use crate::session::{Identity, SessionCredentials, StaticSessionStore};

/// In-memory collaborators with one signed-in identity per role
pub struct TestContext {
    pub ctx: ActionContext,
    pub profiles: Arc<MemoryProfileStore>,
    pub records: Arc<MemoryRecordStore>,
    pub admin: Identity,
    pub moderator: Identity,
    pub reviewer: Identity,
    pub member: Identity,
}

impl TestContext {
    pub fn new() -> Self {
        let admin = Identity::new(Uuid::new_v4(), "admin@nyuchi.com");
        let moderator = Identity::new(Uuid::new_v4(), "moderator@nyuchi.com");
        let reviewer = Identity::new(Uuid::new_v4(), "reviewer@nyuchi.com");
        let member = Identity::new(Uuid::new_v4(), "member@nyuchi.com");

        let sessions = [&admin, &moderator, &reviewer, &member]
            .into_iter()
            .fold(StaticSessionStore::new(), |store, identity| {
                store.with_session(Self::token_for(identity), identity.clone())
            });

        let profiles = Arc::new(MemoryProfileStore::with_profiles([
            Profile::new(admin.id, Role::Admin),
            Profile::new(moderator.id, Role::Moderator).with_capabilities(["moderator"]),
            Profile::new(reviewer.id, Role::Reviewer).with_capabilities(["reviewer"]),
            Profile::new(member.id, Role::Member),
        ]));

        let records = Arc::new(MemoryRecordStore::new());
        let store: Arc<dyn ProfileStore> = profiles.clone();
        let ctx = ActionContext::new(Arc::new(sessions), store, CapabilityPolicy::default())
            .with_records(records.clone());

        Self {
            ctx,
            profiles,
            records,
            admin,
            moderator,
            reviewer,
            member,
        }
    }

    pub fn token_for(identity: &Identity) -> String {
        format!("token-{}", identity.id)
    }

    pub fn credentials(who: Option<&Identity>) -> SessionCredentials {
        match who {
            Some(identity) => SessionCredentials::bearer(Self::token_for(identity)),
            None => SessionCredentials::anonymous(),
        }
    }

    /// A pending listing owned by the member
    pub async fn pending_listing(&self) -> Uuid {
        let listing = NewListing {
            owner_id: self.member.id,
            business_name: "Mbare Textiles".to_string(),
            category: "creative".to_string(),
            country: "Zimbabwe".to_string(),
            website: None,
            employees: None,
            founded: None,
            description: None,
            logo_sha256: None,
        };
        self.records.create_listing(listing).await.expect("in-memory insert").id
    }

    /// Visible content of the given type
    pub async fn visible_content(&self, content_type: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.records.insert_content(ContentItem::visible(content_type, id)).await;
        id
    }

    pub async fn invoke(
        &self,
        action: &dyn Action,
        who: Option<&Identity>,
        form: FormData,
    ) -> anyhow::Result<ActionState> {
        action
            .invoke(&self.ctx, &Self::credentials(who), &ActionState::default(), form)
            .await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_role_has_a_profile() {
        let t = TestContext::new();
        for identity in [&t.admin, &t.moderator, &t.reviewer, &t.member] {
            assert!(t.profiles.profile(identity.id).await.unwrap().is_some());
        }
        assert_ne!(TestContext::token_for(&t.admin), TestContext::token_for(&t.member));
    }
}
