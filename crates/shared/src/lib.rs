//! Shared types, errors, and configuration for Fabriq.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - JWT authentication types and services
//! - The notification webhook client

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod notify;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
pub use notify::{NotificationClient, NotificationEvent, NotifyPayload};
