use serde::{Deserialize, Serialize};

/// A payment channel sub-option (e.g. a specific bank for transfers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOption {
    pub name: &'static str,
    pub option_info: &'static str,
}

/// A payment channel from the static catalog. The storefront exposes no
/// discovery endpoint for these; the catalog mirrors what the mobile client
/// ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentChannel {
    pub channel_id: i64,
    pub name: &'static str,
    pub options: &'static [PaymentOption],
}

impl PaymentChannel {
    /// Selects the channel without a sub-option.
    pub fn select(&self) -> PaymentSelection {
        PaymentSelection {
            channel_id: self.channel_id,
            name: self.name.to_string(),
            option_info: None,
        }
    }

    /// Selects the channel with one of its sub-options applied.
    pub fn select_option(&self, option: &PaymentOption) -> PaymentSelection {
        PaymentSelection {
            channel_id: self.channel_id,
            name: format!("{} ({})", self.name, option.name),
            option_info: Some(option.option_info.to_string()),
        }
    }
}

/// The concrete payment choice carried in checkout parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSelection {
    pub channel_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_info: Option<String>,
}

pub const PAYMENT_CHANNELS: &[PaymentChannel] = &[
    PaymentChannel {
        channel_id: 8_003_001,
        name: "Wallet balance",
        options: &[],
    },
    PaymentChannel {
        channel_id: 8_000_200,
        name: "Bank transfer",
        options: &[
            PaymentOption {
                name: "BCA",
                option_info: "8000200-151",
            },
            PaymentOption {
                name: "Mandiri",
                option_info: "8000200-152",
            },
            PaymentOption {
                name: "BNI",
                option_info: "8000200-153",
            },
            PaymentOption {
                name: "BRI",
                option_info: "8000200-154",
            },
        ],
    },
    PaymentChannel {
        channel_id: 8_000_400,
        name: "Convenience store",
        options: &[
            PaymentOption {
                name: "Indomaret",
                option_info: "8000400-160",
            },
            PaymentOption {
                name: "Alfamart",
                option_info: "8000400-161",
            },
        ],
    },
    PaymentChannel {
        channel_id: 8_000_601,
        name: "Cash on delivery",
        options: &[],
    },
];
