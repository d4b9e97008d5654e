//! Data models for the Ma'man Hub application.
//!
//! This module contains data structures for:
//! - Users and their platform roles
//! - Courses as they appear in the checkout cart

pub mod course;
pub mod user;

pub use course::CartItem;
pub use user::{Role, UserDto};
