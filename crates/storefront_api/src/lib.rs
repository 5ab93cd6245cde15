//! Async client for the storefront flash-sale API.
//!
//! The checkout-critical surface is four calls: `fetch_item`,
//! `validate_checkout`, `checkout_get_quick`, and `place_order`. Everything
//! else supports the browsing screens (account, addresses, shipping).

mod address;
mod checkout;
mod client;
mod config;
mod error;
mod item;
mod logistic;
mod payment;
mod url;

pub use address::{Address, Addresses};
pub use checkout::CheckoutParams;
pub use client::{AccountInfo, Client};
pub use config::{ClientConfig, SessionCookie, DEFAULT_BASE_URL};
pub use error::{ApiError, CODE_ALREADY_VALIDATED, CODE_NO_STOCK};
pub use item::{format_price, CheckoutableItem, FlashSale, Item, ItemVariant, TierVariation};
pub use logistic::LogisticChannel;
pub use payment::{PaymentChannel, PaymentOption, PaymentSelection, PAYMENT_CHANNELS};
pub use url::parse_item_url;
