//! Authentication module for managing credentials and sessions.
//!
//! This module provides:
//! - `TokenStore`: key-value storage for the access/refresh token pair,
//!   with in-memory, file, and OS keychain implementations
//! - `SessionExpiredHandler`: notification fired when a refresh fails
//!   and the user has to log in again
//! - `AuthService`: login, logout, registration, and account endpoints

pub mod credentials;
pub mod notify;
pub mod service;
pub mod session;
pub mod store;

pub use credentials::{Credentials, KeyringTokenStore};
pub use notify::{ChannelNotifier, ExpiryReason, LogOnly, SessionExpired, SessionExpiredHandler};
pub use service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};
pub use session::FileTokenStore;
pub use store::{MemoryTokenStore, StoreError, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
