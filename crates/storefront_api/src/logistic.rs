use serde::{Deserialize, Serialize};

/// A shipping channel offered for an item/address pair. Channels the server
/// cannot serve carry a warning instead of a usable price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticChannel {
    pub channel_id: i64,
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub warning: Option<String>,
}

impl LogisticChannel {
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }

    pub fn warning(&self) -> &str {
        self.warning.as_deref().unwrap_or_default()
    }
}
