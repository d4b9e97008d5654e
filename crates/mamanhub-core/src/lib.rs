//! Core library for the Ma'man Hub learning platform client.
//!
//! This crate provides:
//! - `api`: the authenticated REST client with transparent token refresh
//! - `auth`: token storage, session-expiry notifications, and the auth service
//! - `cart`: the persisted checkout cart
//! - `chat`: conversation, message and typing state for messaging
//! - `quiz`: timed quiz attempts and scoring
//! - `models`: user and course data types shared with the backend
//! - `config`: client configuration loading

pub mod api;
pub mod auth;
pub mod cart;
pub mod chat;
pub mod config;
pub mod models;
pub mod quiz;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse};
pub use auth::{AuthService, SessionExpired, SessionExpiredHandler, TokenStore};
pub use config::{Config, RefreshPolicy, TokenStorage};
