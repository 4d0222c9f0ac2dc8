//! Built-in platform actions served by the API.

pub mod account;
pub mod admin;
pub mod contact;
pub mod listing;
pub mod moderation;

use crate::action::ActionRegistry;

pub fn registry() -> ActionRegistry {
    ActionRegistry::new()
        .with(contact::action())
        .with(account::update_account())
        .with(listing::submit_listing())
        .with(listing::review_listing())
        .with(moderation::moderate_content())
        .with(admin::grant_capability())
        .with(admin::set_role())
}
