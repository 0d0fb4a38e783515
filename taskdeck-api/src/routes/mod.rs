/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (signup, login, me)
/// - `users`: User directory and profile management
/// - `projects`: Project CRUD and lifecycle actions
/// - `tasks`: Task CRUD, comments, and lifecycle actions
/// - `activities`: Per-project activity feed

pub mod activities;
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
