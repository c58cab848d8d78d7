/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Service banner and health check
/// - `auth`: Session endpoints (login, logout)
/// - `accounts`: Account creation and retrieval
/// - `users`: User management within an account
/// - `audit_logs`: Audit trail search

pub mod accounts;
pub mod audit_logs;
pub mod auth;
pub mod health;
pub mod users;
