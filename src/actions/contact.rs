use serde::Deserialize;
use uuid::Uuid;

use crate::action::{validated_action, Action, ActionContext, ActionInput, ActionState};
use crate::records::ContactMessage;
use crate::schema::{Field, FormSchema};

#[derive(Debug, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

pub fn schema() -> FormSchema {
    FormSchema::new()
        .field(Field::text("name").label("Name").min_len(2).max_len(100))
        .field(Field::email("email").label("Email"))
        .field(Field::text("subject").label("Subject").optional().max_len(150))
        .field(Field::text("message").label("Message").min_len(10).max_len(2000))
}

/// Public contact form
pub fn action() -> impl Action {
    validated_action::<ContactInput, _>("contact", schema(), handle)
}

async fn handle(ctx: ActionContext, input: ActionInput<ContactInput>) -> anyhow::Result<ActionState> {
    let ContactInput {
        name,
        email,
        subject,
        message,
    } = input.data;
    let message = ContactMessage {
        id: Uuid::new_v4(),
        name,
        email,
        subject,
        message,
    };
    let reference = message.id;

    tracing::info!(
        "Contact message {} from {} (subject: {}, {} chars)",
        reference,
        message.email,
        message.subject.as_deref().unwrap_or("-"),
        message.message.chars().count()
    );
    ctx.messages().record_message(message).await?;

    Ok(ActionState::success("Thank you for your message. We'll be in touch soon.").with("reference", reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FormData;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn anyone_can_send_a_message() {
        let t = TestContext::new();
        let form = FormData::new()
            .with("name", "Nyasha")
            .with("email", "nyasha@example.com")
            .with("message", "I would like to list my cooperative.");

        let state = t.invoke(&action(), None, form).await.unwrap();
        assert!(state.success.is_some());

        let messages = t.records.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(state.data["reference"], serde_json::Value::from(messages[0].id.to_string()));
        assert_eq!(messages[0].name, "Nyasha");
    }

    #[tokio::test]
    async fn short_message_is_rejected() {
        let t = TestContext::new();
        let form = FormData::new()
            .with("name", "Nyasha")
            .with("email", "nyasha@example.com")
            .with("message", "hi");

        let state = t.invoke(&action(), None, form).await.unwrap();
        assert_eq!(state.error.as_deref(), Some("Message must be at least 10 characters"));
        assert!(t.records.messages().await.is_empty());
    }
}
