use std::fmt;

use reqwest::StatusCode;
use serde_json::Error as JsonError;

/// Structured code the checkout-validate endpoint returns when the item was
/// already validated in an earlier call. Whether this is fatal is a policy
/// decision left to the caller; see [`ApiError::is_already_validated`].
pub const CODE_ALREADY_VALIDATED: i64 = 1004;

/// Structured code for "no stock left" during checkout.
pub const CODE_NO_STOCK: i64 = 1203;

#[derive(Debug)]
pub enum ApiError {
    InvalidBaseUrl(String),
    InvalidItemUrl(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    /// Structured validation error from the API envelope.
    Api {
        code: i64,
        message: String,
    },
    Serde(JsonError),
    MissingData(&'static str),
    NoDeliveryAddress,
    VariantGone(i64),
}

impl ApiError {
    /// Whether this error is the benign "validation already passed" signal.
    pub fn is_already_validated(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code == CODE_ALREADY_VALIDATED)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidItemUrl(value) => write!(f, "not a recognizable item URL: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Api { code, message } => write!(f, "api error {code}: {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::MissingData(endpoint) => {
                write!(f, "response from {endpoint} carried no data")
            }
            Self::NoDeliveryAddress => write!(f, "account has no delivery address set"),
            Self::VariantGone(model_id) => {
                write!(f, "variant {model_id} no longer exists on the item")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_validated_matches_only_its_code() {
        let benign = ApiError::Api {
            code: CODE_ALREADY_VALIDATED,
            message: "checkout already validated".to_string(),
        };
        assert!(benign.is_already_validated());

        let fatal = ApiError::Api {
            code: CODE_NO_STOCK,
            message: "no stock".to_string(),
        };
        assert!(!fatal.is_already_validated());
        assert!(!ApiError::NoDeliveryAddress.is_already_validated());
    }
}
