use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://mall.example.com";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11) flashcart/0.1";

/// Explicit client configuration; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// A cookie handed to the client at construction, typically restored from a
/// saved session or parsed from a browser export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl SessionCookie {
    /// Renders the cookie in `Set-Cookie` form for jar insertion.
    pub(crate) fn to_cookie_string(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        let domain = self.domain.trim_start_matches('.');
        if !domain.is_empty() {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        out.push_str("; Path=");
        out.push_str(if self.path.is_empty() { "/" } else { &self.path });
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::SessionCookie;

    #[test]
    fn cookie_string_includes_attributes() {
        let cookie = SessionCookie {
            name: "sid".to_string(),
            value: "abc".to_string(),
            domain: ".mall.example.com".to_string(),
            path: String::new(),
            secure: true,
            http_only: true,
        };
        assert_eq!(
            cookie.to_cookie_string(),
            "sid=abc; Domain=mall.example.com; Path=/; Secure; HttpOnly"
        );
    }
}
