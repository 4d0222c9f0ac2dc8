mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use common::{multipart, test_app, token_for, urlencoded, COOKIE};

const SIGN_IN: &str = "You must be signed in to perform this action";

#[tokio::test]
async fn lists_registered_actions() -> Result<()> {
    let app = test_app();
    let (status, body) = app.get("/actions", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let names: Vec<&str> = body["data"]
        .as_array()
        .map(|a| a.iter().filter_map(|d| d["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names.len(), 7);
    assert!(names.contains(&"review_listing"));
    Ok(())
}

#[tokio::test]
async fn public_contact_form_accepts_anonymous_submissions() -> Result<()> {
    let app = test_app();
    let (status, body) = app
        .post_form(
            "/actions/contact",
            None,
            &[
                ("name", "Chipo"),
                ("email", "chipo@example.com"),
                ("message", "Please add our market to the directory."),
            ],
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "Thank you for your message. We'll be in touch soon.");
    assert!(body["reference"].is_string());
    assert!(body.get("error").is_none());
    Ok(())
}

#[tokio::test]
async fn validation_errors_come_back_joined_in_field_order() -> Result<()> {
    let app = test_app();
    let (status, body) = app
        .post_form("/actions/contact", None, &[("email", "not-an-email"), ("message", "short")])
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "error": "Name is required, Email must be a valid email address, Message must be at least 10 characters"
        })
    );
    Ok(())
}

#[tokio::test]
async fn signed_in_action_rejects_missing_and_forged_tokens() -> Result<()> {
    let app = test_app();
    let fields = [("full_name", "Tendai"), ("email", "tendai@nyuchi.com")];

    let (_, body) = app.post_form("/actions/update_account", None, &fields).await?;
    assert_eq!(body, json!({ "error": SIGN_IN }));

    let (_, body) = app
        .post_form("/actions/update_account", Some("not.a.token"), &fields)
        .await?;
    assert_eq!(body, json!({ "error": SIGN_IN }));
    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted() -> Result<()> {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/actions/update_account")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, format!("theme=dark; {}={}", COOKIE, token_for(&app.member)))
        .body(Body::from(urlencoded(&[("full_name", "Tendai"), ("email", "tendai@nyuchi.com")])))?;

    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email_changed"], true);
    Ok(())
}

async fn submit_listing(app: &common::TestApp, name: &str) -> Result<String> {
    let (_, body) = app
        .post_form(
            "/actions/submit_listing",
            Some(&token_for(&app.member)),
            &[("business_name", name), ("category", "agriculture"), ("country", "Zambia")],
        )
        .await?;
    assert_eq!(body["status"], "pending");
    Ok(body["listing_id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn capability_guard_names_the_missing_capability() -> Result<()> {
    let app = test_app();
    let listing = submit_listing(&app, "Lusaka Growers").await?;
    let fields = [("listing_id", listing.as_str()), ("decision", "approve")];

    for who in [&app.member, &app.moderator] {
        let (_, body) = app
            .post_form("/actions/review_listing", Some(&token_for(who)), &fields)
            .await?;
        assert_eq!(body, json!({ "error": "Missing required capability: reviewer" }));
    }

    let (_, body) = app
        .post_form("/actions/review_listing", Some(&token_for(&app.reviewer)), &fields)
        .await?;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["reviewed_by"], app.reviewer.id.to_string());

    let second = submit_listing(&app, "Kafue Honey").await?;
    let (_, body) = app
        .post_form(
            "/actions/review_listing",
            Some(&token_for(&app.admin)),
            &[("listing_id", second.as_str()), ("decision", "approve")],
        )
        .await?;
    assert_eq!(body["status"], "approved");
    Ok(())
}

#[tokio::test]
async fn reviewing_a_missing_listing_is_an_error() -> Result<()> {
    let app = test_app();
    let missing = Uuid::new_v4().to_string();
    let (status, body) = app
        .post_form(
            "/actions/review_listing",
            Some(&token_for(&app.reviewer)),
            &[("listing_id", missing.as_str()), ("decision", "approve")],
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": "Listing not found" }));
    Ok(())
}

#[tokio::test]
async fn granted_capability_applies_to_the_next_request() -> Result<()> {
    let app = test_app();
    let member_token = token_for(&app.member);
    let member_id = app.member.id.to_string();
    let content = app.visible_content("event").await.to_string();
    let moderation = [
        ("content_id", content.as_str()),
        ("content_type", "event"),
        ("action", "flag"),
    ];

    let (_, body) = app
        .post_form("/actions/moderate_content", Some(&member_token), &moderation)
        .await?;
    assert_eq!(body["error"], "Missing required capability: moderator");

    let (_, body) = app
        .post_form(
            "/actions/grant_capability",
            Some(&token_for(&app.admin)),
            &[("profile_id", member_id.as_str()), ("capability", "moderator")],
        )
        .await?;
    assert_eq!(body["success"], "Capability 'moderator' granted.");

    let (_, body) = app
        .post_form("/actions/moderate_content", Some(&member_token), &moderation)
        .await?;
    assert_eq!(body["visibility"], "flagged");
    assert_eq!(body["moderated_by"], member_id);
    Ok(())
}

#[tokio::test]
async fn multipart_listing_with_logo() -> Result<()> {
    let app = test_app();
    let boundary = "nyuchi-boundary";
    let logo: &[u8] = b"\x89PNG fake logo bytes";
    let body = multipart(
        boundary,
        &[
            ("business_name", "Harare Solar Co"),
            ("category", "technology"),
            ("country", "Zimbabwe"),
            ("website", "https://solar.example.co.zw"),
        ],
        Some(("logo", "logo.png", "image/png", logo)),
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/actions/submit_listing")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(&app.member)))
        .body(Body::from(body))?;

    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], "Listing submitted for review.");
    assert_eq!(body["status"], "pending");

    let expected = format!("{:x}", Sha256::digest(logo));
    assert_eq!(body["logo_sha256"], Value::from(expected));
    Ok(())
}

#[tokio::test]
async fn multipart_logo_with_wrong_type_is_rejected() -> Result<()> {
    let app = test_app();
    let boundary = "nyuchi-boundary";
    let body = multipart(
        boundary,
        &[("business_name", "Harare Solar Co"), ("category", "technology"), ("country", "Zimbabwe")],
        Some(("logo", "logo.pdf", "application/pdf", b"%PDF-1.7")),
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/actions/submit_listing")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(&app.member)))
        .body(Body::from(body))?;

    let (_, body) = app.send(request).await?;
    let error = body["error"].as_str().unwrap_or_default();
    assert!(error.starts_with("Logo must be a file of type:"), "{}", error);
    Ok(())
}

#[tokio::test]
async fn unknown_action_is_not_found() -> Result<()> {
    let app = test_app();
    let (status, body) = app.post_form("/actions/launch_rocket", None, &[]).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
