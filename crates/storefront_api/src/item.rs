use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Prices are carried in micro-units: 100_000 equals one display unit.
pub const PRICE_SCALE: i64 = 100_000;

/// Upcoming flash-sale window on an item or variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashSale {
    /// Epoch seconds at which the sale price becomes purchasable.
    pub start_time: i64,
    /// Display price shown before the sale opens (often masked, e.g. "1?9").
    #[serde(default)]
    pub hidden_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVariant {
    pub model_id: i64,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    /// Index into each tier variation's option list identifying this variant.
    #[serde(default)]
    pub tier_index: Vec<usize>,
    #[serde(default)]
    pub has_upcoming_flash_sale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierVariation {
    pub name: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub shop_id: i64,
    pub item_id: i64,
    pub name: String,
    pub price: i64,
    pub stock: i32,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Whether the flash sale is live right now.
    #[serde(default)]
    pub flash_sale: bool,
    #[serde(default)]
    pub upcoming_flash_sale: Option<FlashSale>,
    #[serde(default)]
    pub models: Vec<ItemVariant>,
    #[serde(default)]
    pub tier_variations: Vec<TierVariation>,
}

impl Item {
    pub fn is_flash_sale(&self) -> bool {
        self.flash_sale
    }

    pub fn has_upcoming_flash_sale(&self) -> bool {
        self.upcoming_flash_sale.is_some()
    }

    /// Epoch seconds of the upcoming sale start, when one is scheduled.
    pub fn upcoming_sale_start(&self) -> Option<i64> {
        self.upcoming_flash_sale.as_ref().map(|sale| sale.start_time)
    }

    pub fn hidden_price(&self) -> Option<&str> {
        self.upcoming_flash_sale
            .as_ref()
            .and_then(|sale| sale.hidden_price.as_deref())
    }
}

/// An item paired with one chosen variant, ready for the checkout pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutableItem {
    pub item: Item,
    chosen: ItemVariant,
}

impl CheckoutableItem {
    /// Re-resolves a previously chosen variant against a (possibly refreshed)
    /// item by its identifier.
    pub fn choose(item: Item, model_id: i64) -> Result<Self, ApiError> {
        let chosen = item
            .models
            .iter()
            .find(|model| model.model_id == model_id)
            .cloned()
            .ok_or(ApiError::VariantGone(model_id))?;
        Ok(Self { item, chosen })
    }

    /// Chooses the variant matching the tier-variation option indices, falling
    /// back to the first variant when nothing matches (single-variant items
    /// report an empty tier index).
    pub fn choose_by_tier(item: Item, tier_index: &[usize]) -> Option<Self> {
        let chosen = item
            .models
            .iter()
            .find(|model| model.tier_index == tier_index)
            .or_else(|| item.models.first())
            .cloned()?;
        Some(Self { item, chosen })
    }

    pub fn chosen(&self) -> &ItemVariant {
        &self.chosen
    }

    pub fn shop_id(&self) -> i64 {
        self.item.shop_id
    }

    pub fn item_id(&self) -> i64 {
        self.item.item_id
    }
}

/// Formats a micro-unit price with a currency prefix and thousands separators.
pub fn format_price(currency: &str, value: i64) -> String {
    let units = value / PRICE_SCALE;
    let mut digits = units.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    while digits.len() > 3 {
        let rest = digits.split_off(digits.len() - 3);
        grouped = if grouped.is_empty() {
            rest
        } else {
            format!("{rest}.{grouped}")
        };
    }
    grouped = if grouped.is_empty() {
        digits
    } else {
        format!("{digits}.{grouped}")
    };
    let sign = if units < 0 { "-" } else { "" };
    format!("{sign}{currency}{grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_variants() -> Item {
        Item {
            shop_id: 7,
            item_id: 11,
            name: "Widget".to_string(),
            price: 120 * PRICE_SCALE,
            stock: 5,
            categories: vec!["Gadgets".to_string()],
            flash_sale: false,
            upcoming_flash_sale: Some(FlashSale {
                start_time: 1_700_000_000,
                hidden_price: Some("1?9".to_string()),
            }),
            models: vec![
                ItemVariant {
                    model_id: 100,
                    name: "Red / S".to_string(),
                    price: 110 * PRICE_SCALE,
                    stock: 2,
                    tier_index: vec![0, 0],
                    has_upcoming_flash_sale: true,
                },
                ItemVariant {
                    model_id: 101,
                    name: "Blue / M".to_string(),
                    price: 130 * PRICE_SCALE,
                    stock: 3,
                    tier_index: vec![1, 1],
                    has_upcoming_flash_sale: false,
                },
            ],
            tier_variations: vec![
                TierVariation {
                    name: "Color".to_string(),
                    options: vec!["Red".to_string(), "Blue".to_string()],
                },
                TierVariation {
                    name: "Size".to_string(),
                    options: vec!["S".to_string(), "M".to_string()],
                },
            ],
        }
    }

    #[test]
    fn choose_resolves_by_model_id() {
        let citem = CheckoutableItem::choose(item_with_variants(), 101).expect("choose");
        assert_eq!(citem.chosen().name, "Blue / M");
    }

    #[test]
    fn choose_missing_variant_is_variant_gone() {
        let result = CheckoutableItem::choose(item_with_variants(), 999);
        assert!(matches!(result, Err(ApiError::VariantGone(999))));
    }

    #[test]
    fn choose_by_tier_matches_option_indices() {
        let citem = CheckoutableItem::choose_by_tier(item_with_variants(), &[1, 1]).expect("tier");
        assert_eq!(citem.chosen().model_id, 101);
    }

    #[test]
    fn choose_by_tier_falls_back_to_first_variant() {
        let citem = CheckoutableItem::choose_by_tier(item_with_variants(), &[5, 5]).expect("tier");
        assert_eq!(citem.chosen().model_id, 100);
    }

    #[test]
    fn price_formatting_groups_thousands() {
        assert_eq!(format_price("Rp", 1_234_567 * PRICE_SCALE), "Rp1.234.567");
        assert_eq!(format_price("Rp", 999 * PRICE_SCALE), "Rp999");
        assert_eq!(format_price("$", 0), "$0");
    }
}
