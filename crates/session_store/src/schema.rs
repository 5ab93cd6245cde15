use serde::{Deserialize, Serialize};

pub const SESSION_FILE_VERSION: u32 = 1;

/// One browser cookie persisted for a saved login.
///
/// Expiry is kept as epoch seconds when the browser export carried one; the
/// storefront client rebuilds its jar from these fields verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

fn default_path() -> String {
    "/".to_string()
}

/// A saved login session: the cookie set plus the username it resolved to the
/// last time it was probed. `saved_at` is an RFC3339 timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub saved_at: String,
    pub cookies: Vec<StoredCookie>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    pub version: u32,
    #[serde(default)]
    pub sessions: Vec<SavedSession>,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            version: SESSION_FILE_VERSION,
            sessions: Vec::new(),
        }
    }
}
