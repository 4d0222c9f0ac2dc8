use anyhow::anyhow;
use serde::Deserialize;
use uuid::Uuid;

use crate::action::{validated_action, Action, ActionContext, ActionInput, ActionState};
use crate::records::{Moderation, Visibility};
use crate::schema::{Field, FormSchema};

#[derive(Debug, Deserialize)]
pub struct ModerationInput {
    pub content_id: Uuid,
    pub content_type: String,
    pub action: String,
    pub reason: Option<String>,
}

pub fn schema() -> FormSchema {
    FormSchema::new()
        .field(Field::uuid("content_id").label("Content"))
        .field(Field::choice("content_type", ["article", "comment", "event", "listing"]).label("Content type"))
        .field(Field::choice("action", ["hide", "restore", "flag"]).label("Action"))
        .field(Field::text("reason").label("Reason").optional().max_len(500))
}

pub fn moderate_content() -> impl Action {
    validated_action::<ModerationInput, _>("moderate_content", schema(), handle).requires("moderator")
}

async fn handle(ctx: ActionContext, input: ActionInput<ModerationInput>) -> anyhow::Result<ActionState> {
    let moderator = input
        .identity()
        .ok_or_else(|| anyhow!("moderate_content invoked without an identity"))?
        .id;
    let ModerationInput {
        content_id,
        content_type,
        action,
        reason,
    } = input.data;

    if action == "hide" && reason.is_none() {
        return Ok(ActionState::error("A reason is required when hiding content"));
    }

    let visibility = match action.as_str() {
        "hide" => Visibility::Hidden,
        "flag" => Visibility::Flagged,
        _ => Visibility::Visible,
    };
    let moderation = Moderation {
        visibility,
        moderated_by: moderator,
        reason: reason.clone(),
    };

    let Some(item) = ctx
        .content()
        .moderate_content(&content_type, content_id, moderation)
        .await?
    else {
        return Ok(ActionState::error("Content not found"));
    };

    tracing::info!(
        "Moderator {} applied '{}' to {} {}{}",
        moderator,
        action,
        content_type,
        content_id,
        reason.as_deref().map(|r| format!(" ({})", r)).unwrap_or_default()
    );

    Ok(ActionState::success(format!("Content {}.", item.visibility))
        .with("content_id", item.id)
        .with("content_type", item.content_type)
        .with("visibility", item.visibility)
        .with("moderated_by", moderator))
}
