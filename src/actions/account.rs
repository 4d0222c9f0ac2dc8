use anyhow::anyhow;
use serde::Deserialize;

use crate::action::{validated_action_with_user, Action, ActionContext, ActionInput, ActionState};
use crate::schema::{Field, FormSchema};

#[derive(Debug, Deserialize)]
pub struct AccountInput {
    pub full_name: String,
    pub email: String,
}

pub fn schema() -> FormSchema {
    FormSchema::new()
        .field(Field::text("full_name").label("Full name").min_len(1).max_len(100))
        .field(Field::email("email").label("Email"))
}

pub fn update_account() -> impl Action {
    validated_action_with_user::<AccountInput, _>("update_account", schema(), handle)
}

async fn handle(_ctx: ActionContext, input: ActionInput<AccountInput>) -> anyhow::Result<ActionState> {
    let identity = input
        .identity()
        .ok_or_else(|| anyhow!("update_account invoked without an identity"))?;
    let email_changed = !identity.email.eq_ignore_ascii_case(&input.data.email);

    tracing::info!("Account {} updated (email changed: {})", identity.id, email_changed);

    let message = if email_changed {
        "Account updated. Check your new email address to confirm the change."
    } else {
        "Account updated successfully."
    };

    Ok(ActionState::success(message)
        .with("name", &input.data.full_name)
        .with("email", &input.data.email)
        .with("email_changed", email_changed))
}
