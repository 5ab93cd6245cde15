use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::{Address, Addresses};
use crate::checkout::CheckoutParams;
use crate::config::{ClientConfig, SessionCookie};
use crate::error::ApiError;
use crate::item::{CheckoutableItem, Item};
use crate::logistic::LogisticChannel;
use crate::url::parse_item_url;

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "x-csrftoken";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    pub username: String,
}

/// Every endpoint wraps its payload in this envelope; a nonzero `error`
/// carries a structured code.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    error: i64,
    #[serde(default)]
    error_msg: Option<String>,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_data(self, endpoint: &'static str) -> Result<T, ApiError> {
        if self.error != 0 {
            return Err(ApiError::Api {
                code: self.error,
                message: self
                    .error_msg
                    .unwrap_or_else(|| "unspecified error".to_string()),
            });
        }
        self.data.ok_or(ApiError::MissingData(endpoint))
    }
}

#[derive(Debug, Serialize)]
struct ItemQuery {
    shop_id: i64,
    item_id: i64,
}

#[derive(Debug, Serialize)]
struct ShippingRequest<'a> {
    address: &'a Address,
    shop_id: i64,
    item_id: i64,
}

/// Session-bound storefront client.
///
/// The underlying reqwest client and cookie jar are immutable after
/// construction, so a single instance is safe to share across the concurrent
/// checkout calls.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    csrf: String,
}

impl Client {
    /// Builds an anonymous client (no session cookies), e.g. for the `info`
    /// command.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_cookies(config, &[])
    }

    /// Builds a client from a restored cookie session.
    pub fn with_cookies(config: ClientConfig, cookies: &[SessionCookie]) -> Result<Self, ApiError> {
        let base: reqwest::Url = config
            .base_url
            .parse()
            .map_err(|_| ApiError::InvalidBaseUrl(config.base_url.clone()))?;

        let jar = Arc::new(Jar::default());
        for cookie in cookies {
            jar.add_cookie_str(&cookie.to_cookie_string(), &base);
        }

        let csrf = cookies
            .iter()
            .find(|cookie| cookie.name == CSRF_COOKIE)
            .map(|cookie| cookie.value.clone())
            .unwrap_or_else(anonymous_csrf_token);
        jar.add_cookie_str(&format!("{CSRF_COOKIE}={csrf}; Path=/"), &base);

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| ApiError::InvalidBaseUrl(config.user_agent.clone()))?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.base_url)
                .map_err(|_| ApiError::InvalidBaseUrl(config.base_url.clone()))?,
        );
        headers.insert(
            CSRF_HEADER,
            HeaderValue::from_str(&csrf).map_err(|_| ApiError::InvalidBaseUrl(csrf.clone()))?,
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::from)?;

        Ok(Self { http, config, csrf })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &'static str,
        query: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let mut request = self.http.get(self.endpoint(path));
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        decode_envelope(path, response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &'static str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "POST");
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        decode_envelope(path, response).await
    }

    /// Resolves the logged-in account; fails for dead or anonymous sessions.
    pub async fn fetch_account_info(&self) -> Result<AccountInfo, ApiError> {
        self.get("/api/v1/account", None::<&ItemQuery>).await
    }

    pub async fn fetch_item(&self, shop_id: i64, item_id: i64) -> Result<Item, ApiError> {
        self.get("/api/v1/item/get", Some(&ItemQuery { shop_id, item_id }))
            .await
    }

    pub async fn fetch_item_from_url(&self, url: &str) -> Result<Item, ApiError> {
        let (shop_id, item_id) = parse_item_url(url)?;
        self.fetch_item(shop_id, item_id).await
    }

    pub async fn fetch_addresses(&self) -> Result<Addresses, ApiError> {
        self.get("/api/v1/address/list", None::<&ItemQuery>).await
    }

    pub async fn fetch_shipping_info(
        &self,
        address: &Address,
        item: &Item,
    ) -> Result<Vec<LogisticChannel>, ApiError> {
        self.post(
            "/api/v1/logistics/channels",
            &ShippingRequest {
                address,
                shop_id: item.shop_id,
                item_id: item.item_id,
            },
        )
        .await
    }

    /// Pre-validates the chosen item/variant for checkout. A structured
    /// [`CODE_ALREADY_VALIDATED`](crate::CODE_ALREADY_VALIDATED) error here is
    /// benign on repeat runs.
    pub async fn validate_checkout(&self, item: &CheckoutableItem) -> Result<(), ApiError> {
        #[derive(Serialize)]
        struct ValidateRequest {
            shop_id: i64,
            item_id: i64,
            model_id: i64,
        }
        self.post::<serde_json::Value>(
            "/api/v1/checkout/validate",
            &ValidateRequest {
                shop_id: item.shop_id(),
                item_id: item.item_id(),
                model_id: item.chosen().model_id,
            },
        )
        .await
        .map(|_| ())
    }

    /// Runs the quick checkout-get, returning parameters enriched with the
    /// server-issued order token required by [`Client::place_order`].
    pub async fn checkout_get_quick(
        &self,
        params: CheckoutParams,
    ) -> Result<CheckoutParams, ApiError> {
        self.post("/api/v1/checkout/get", &params).await
    }

    /// Places the order using enriched checkout parameters.
    pub async fn place_order(&self, params: &CheckoutParams) -> Result<(), ApiError> {
        self.post::<serde_json::Value>("/api/v1/checkout/place_order", params)
            .await
            .map(|_| ())
    }
}

fn anonymous_csrf_token() -> String {
    // Derived from the clock rather than a global RNG seed; only anonymous
    // browsing paths ever hit this.
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{nanos:032x}")
}

async fn decode_envelope<T: DeserializeOwned>(
    path: &'static str,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, body));
    }
    let envelope: Envelope<T> = response.json().await?;
    envelope.into_data(path)
}

fn status_error(status: StatusCode, body: String) -> ApiError {
    // Error bodies still use the envelope shape when the server produced them.
    if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
        if envelope.error != 0 {
            return ApiError::Api {
                code: envelope.error,
                message: envelope
                    .error_msg
                    .unwrap_or_else(|| "unspecified error".to_string()),
            };
        }
    }
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body
    };
    ApiError::Status(status, message)
}
