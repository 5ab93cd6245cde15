use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::item::CheckoutableItem;
use crate::logistic::LogisticChannel;
use crate::payment::PaymentSelection;

/// Parameters for the checkout-get / place-order pair.
///
/// `checkout_get_quick` returns these enriched with the server-issued fields
/// (`order_token`, `checkout_sn`); `place_order` requires the enriched form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutParams {
    pub shop_id: i64,
    pub item_id: i64,
    pub model_id: i64,
    pub price: i64,
    pub address: Address,
    pub payment: PaymentSelection,
    pub logistic: LogisticChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_sn: Option<String>,
}

impl CheckoutParams {
    pub fn new(
        address: Address,
        item: &CheckoutableItem,
        payment: PaymentSelection,
        logistic: LogisticChannel,
    ) -> Self {
        Self {
            shop_id: item.shop_id(),
            item_id: item.item_id(),
            model_id: item.chosen().model_id,
            price: item.chosen().price,
            address,
            payment,
            logistic,
            timestamp: None,
            order_token: None,
            checkout_sn: None,
        }
    }

    /// Stamps the client-side request time the server uses for sale-window
    /// verification.
    pub fn with_timestamp(mut self, epoch_seconds: i64) -> Self {
        self.timestamp = Some(epoch_seconds);
        self
    }

    /// Whether the server-issued fields from checkout-get are present.
    pub fn is_enriched(&self) -> bool {
        self.order_token.is_some()
    }
}
