//! Checkout cart.
//!
//! This module provides the `Cart` with coupon handling and the
//! `CartStore` that keeps it on disk between runs as `cart.json`
//! in the cache directory.

pub mod manager;

pub use manager::{coupon_discount, Cart, CartStore};
