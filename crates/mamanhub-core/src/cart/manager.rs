use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::CartItem;

/// Cart file name in cache directory
const CART_FILE: &str = "cart.json";

/// Known coupon codes and their discount fraction
const COUPONS: &[(&str, f64)] = &[("SAVE10", 0.10), ("SAVE20", 0.20), ("WELCOME50", 0.50)];

/// Discount fraction for a coupon code, matched case-insensitively
pub fn coupon_discount(code: &str) -> Option<f64> {
    let code = code.trim().to_uppercase();
    COUPONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, discount)| *discount)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub coupon_code: Option<String>,
    pub discount: f64,
    pub updated_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            coupon_code: None,
            discount: 0.0,
            updated_at: Utc::now(),
        }
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a course. Returns false if it was already in the cart.
    pub fn add_item(&mut self, item: CartItem) -> bool {
        if self.is_in_cart(&item.id) {
            return false;
        }
        self.items.push(item);
        self.touch();
        true
    }

    /// Remove a course by id. Returns false if it was not in the cart.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Empty the cart, dropping any coupon
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon_code = None;
        self.discount = 0.0;
        self.touch();
    }

    /// Apply a coupon code. Unknown codes leave the cart unchanged.
    pub fn apply_coupon(&mut self, code: &str) -> bool {
        match coupon_discount(code) {
            Some(discount) => {
                self.coupon_code = Some(code.trim().to_uppercase());
                self.discount = discount;
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn remove_coupon(&mut self) {
        self.coupon_code = None;
        self.discount = 0.0;
        self.touch();
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|item| item.price).sum()
    }

    pub fn total(&self) -> f64 {
        let subtotal = self.subtotal();
        subtotal - subtotal * self.discount
    }

    pub fn is_in_cart(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Persists the cart as JSON on disk
pub struct CartStore {
    path: PathBuf,
}

impl CartStore {
    pub fn new(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)?;
        Ok(Self {
            path: cache_dir.join(CART_FILE),
        })
    }

    /// Load the saved cart, or an empty one if nothing was saved
    pub fn load(&self) -> Result<Cart> {
        if !self.path.exists() {
            return Ok(Cart::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read cart file")?;
        serde_json::from_str(&contents).context("Failed to parse cart file")
    }

    /// Save the cart. The JSON goes to a temporary file next to `cart.json`
    /// which is then renamed over it, so a reader never sees a partial file.
    pub fn save(&self, cart: &Cart) -> Result<()> {
        let contents = serde_json::to_string_pretty(cart)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write cart file")?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).context("Failed to replace cart file");
        }
        debug!(items = cart.len(), "Saved cart");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, apply `f`, and save the cart
    pub fn update<T>(&self, f: impl FnOnce(&mut Cart) -> T) -> Result<T> {
        let mut cart = self.load()?;
        let result = f(&mut cart);
        self.save(&cart)?;
        Ok(result)
    }
}
