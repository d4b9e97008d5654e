use serde::{Deserialize, Serialize};

/// A course placed in the checkout cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub title: String,
    pub instructor: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub level: String,
}

impl CartItem {
    /// Savings against the original price, if the course is discounted
    pub fn savings(&self) -> Option<f64> {
        self.original_price
            .filter(|original| *original > self.price)
            .map(|original| original - self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cart_item() {
        let json = r#"{"id":"c1","title":"Arabic Calligraphy","instructor":"Mona","price":49.0,"originalPrice":99.0,"thumbnail":"/t/c1.jpg","level":"Beginner"}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.original_price, Some(99.0));
        assert_eq!(item.savings(), Some(50.0));
    }

    #[test]
    fn test_no_savings_without_discount() {
        let json = r#"{"id":"c2","title":"Physics","instructor":"Karim","price":20.0}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.savings(), None);
        assert!(!serde_json::to_string(&item).unwrap().contains("originalPrice"));
    }
}
