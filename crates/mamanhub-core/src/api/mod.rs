//! REST API client module for the Ma'man Hub backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! platform API. Every request carries the stored bearer access token,
//! and an expired token is refreshed once through `/auth/refresh-token`
//! before the original request is retried.

pub mod client;
pub mod error;
pub mod request;

pub use client::{ApiClient, RefreshState};
pub use error::ApiError;
pub use request::{ApiRequest, ApiResponse};
