pub mod action;
pub mod actions;
pub mod auth;
pub mod capability;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod records;
pub mod schema;
pub mod server;
pub mod session;

#[cfg(test)]
pub mod testing;
