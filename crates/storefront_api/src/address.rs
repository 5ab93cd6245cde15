use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub city: String,
    #[serde(default)]
    pub detail: String,
    /// Marks the account's chosen delivery address.
    #[serde(default)]
    pub delivery: bool,
}

/// Address list as returned by the address endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addresses(pub Vec<Address>);

impl Addresses {
    /// The delivery address, falling back to the first entry when none is
    /// flagged.
    pub fn delivery_address(&self) -> Option<&Address> {
        self.0
            .iter()
            .find(|address| address.delivery)
            .or_else(|| self.0.first())
    }
}
