#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use nyuchi_actions::action::ActionContext;
use nyuchi_actions::auth::{generate_jwt, Claims};
use nyuchi_actions::capability::{CapabilityPolicy, MemoryProfileStore, Profile, Role};
use nyuchi_actions::records::{ContentItem, MemoryRecordStore};
use nyuchi_actions::server::{app, AppState, ServerSettings};
use nyuchi_actions::session::{Identity, JwtSessionStore};

pub const SECRET: &str = "integration-test-secret";
pub const AUDIENCE: &str = "authenticated";
pub const COOKIE: &str = "sb-access-token";

/// Router wired to in-memory profiles and records, and real signed tokens
pub struct TestApp {
    pub router: Router,
    pub profiles: Arc<MemoryProfileStore>,
    pub records: Arc<MemoryRecordStore>,
    pub admin: Identity,
    pub moderator: Identity,
    pub reviewer: Identity,
    pub member: Identity,
}

pub fn test_app() -> TestApp {
    let admin = Identity::new(Uuid::new_v4(), "admin@nyuchi.com");
    let moderator = Identity::new(Uuid::new_v4(), "moderator@nyuchi.com");
    let reviewer = Identity::new(Uuid::new_v4(), "reviewer@nyuchi.com");
    let member = Identity::new(Uuid::new_v4(), "member@nyuchi.com");

    let profiles = Arc::new(MemoryProfileStore::with_profiles([
        Profile::new(admin.id, Role::Admin),
        Profile::new(moderator.id, Role::Moderator).with_capabilities(["moderator"]),
        Profile::new(reviewer.id, Role::Reviewer).with_capabilities(["reviewer"]),
        Profile::new(member.id, Role::Member),
    ]));

    let sessions = JwtSessionStore::new(SECRET, Some(AUDIENCE.to_string())).expect("valid session store");
    let records = Arc::new(MemoryRecordStore::new());
    let context = ActionContext::new(Arc::new(sessions), profiles.clone(), CapabilityPolicy::default())
        .with_records(records.clone());
    let settings = ServerSettings {
        session_cookie: COOKIE.to_string(),
        max_request_size_bytes: 64 * 1024,
        cors_origins: Vec::new(),
        enable_request_logging: false,
    };

    TestApp {
        router: app(AppState::new(nyuchi_actions::actions::registry(), context, settings)),
        profiles,
        records,
        admin,
        moderator,
        reviewer,
        member,
    }
}

pub fn token_for(identity: &Identity) -> String {
    let claims = Claims::new(identity.id, identity.email.clone(), Some(AUDIENCE.to_string()), 1);
    generate_jwt(&claims, SECRET).expect("token")
}

pub fn urlencoded(fields: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

impl TestApp {
    /// Seed one visible piece of content
    pub async fn visible_content(&self, content_type: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.records.insert_content(ContentItem::visible(content_type, id)).await;
        id
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(request.body(Body::empty())?).await
    }

    pub async fn post_form(&self, path: &str, token: Option<&str>, fields: &[(&str, &str)]) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(request.body(Body::from(urlencoded(fields)))?).await
    }
}

/// Hand-built multipart body; `file` is (field, filename, content type, bytes)
pub fn multipart(boundary: &str, fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
