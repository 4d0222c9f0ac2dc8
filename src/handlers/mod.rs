// Public: system, action listing and invocation (actions enforce their own guards)
// Session-aware: /api/auth/*
pub mod actions;
pub mod auth;
pub mod system;
