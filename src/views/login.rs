//! Cookie login: paste a browser cookie export (the JSON array produced by
//! cookie-editor extensions), verify it against the account endpoint, and
//! persist the session.

use serde::Deserialize;
use storefront_api::{AccountInfo, ApiError, Client, ClientConfig, SessionCookie};

use crate::event::{Cmd, Event, WinSize};
use crate::key::matches_key;
use crate::navigator::{pop, push_and_remove_until, View};
use crate::style;
use crate::views::account::AccountView;
use crate::views::{block_on_api, to_stored_cookies, Busy, Ctx};
use crate::widgets::Input;

struct LoginChecked {
    result: Result<AccountInfo, ApiError>,
    cookies: Vec<SessionCookie>,
}

/// One entry of a browser cookie export. Expiry is deliberately ignored; the
/// storefront accepts session cookies without it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedCookie {
    name: String,
    value: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    http_only: bool,
}

pub struct LoginView {
    ctx: Ctx,
    input: Input,
    busy: Busy,
    error: Option<String>,
}

impl LoginView {
    pub fn new(ctx: Ctx) -> Self {
        Self {
            ctx,
            input: Input::new(r#"[{"name":"SPC_SES","value":"...","domain":"..."}, ...]"#),
            busy: Busy::new(),
            error: None,
        }
    }

    fn submit(&mut self) -> Option<Cmd> {
        let cookies = match parse_cookie_export(self.input.value()) {
            Ok(cookies) => cookies,
            Err(err) => {
                self.error = Some(err);
                return None;
            }
        };
        self.error = None;
        let spin = self.busy.start();
        let config = ClientConfig::default().with_base_url(&self.ctx.config.base_url);
        let verify = Cmd::task(move || {
            let result = Client::with_cookies(config, &cookies)
                .and_then(|client| block_on_api(client.fetch_account_info()));
            Some(LoginChecked { result, cookies })
        });
        Cmd::batch(vec![spin, verify])
    }

    fn save_session(&mut self, info: &AccountInfo, cookies: &[SessionCookie]) {
        let mut store = self.ctx.store.lock().unwrap_or_else(|e| e.into_inner());
        let result = store
            .insert_front(Some(info.username.clone()), to_stored_cookies(cookies))
            .and_then(|()| store.save());
        if let Err(err) = result {
            tracing::warn!(%err, "failed to persist session");
            self.error = Some(err.to_string());
        }
    }
}

/// Parses a browser cookie-export JSON array into session cookies.
fn parse_cookie_export(input: &str) -> Result<Vec<SessionCookie>, String> {
    let exported: Vec<ExportedCookie> =
        serde_json::from_str(input).map_err(|_| "not a valid json input".to_string())?;
    if exported.is_empty() {
        return Err("the export contains no cookies".to_string());
    }
    Ok(exported
        .into_iter()
        .map(|cookie| SessionCookie {
            name: cookie.name,
            value: unquote(&cookie.value).to_string(),
            domain: cookie.domain,
            path: if cookie.path.is_empty() {
                "/".to_string()
            } else {
                cookie.path
            },
            secure: cookie.secure,
            http_only: cookie.http_only,
        })
        .collect())
}

/// Some exports double-encode the value as a quoted JSON string.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

impl View for LoginView {
    fn render(&mut self, _size: WinSize) -> String {
        let mut lines = vec![
            style::bold("Cookie login"),
            String::new(),
            "Paste the cookie export (JSON array) of a browser session:".to_string(),
            self.input.render(),
            String::new(),
        ];
        if self.busy.active() {
            lines.push(format!(
                "{} verifying cookies...",
                style::accent(self.busy.frame())
            ));
        } else if let Some(error) = &self.error {
            lines.push(style::error(error));
        }
        lines.push(
            [
                style::key_help("enter", "verify"),
                style::key_help("esc", "back"),
            ]
            .join(style::KEY_SEP),
        );
        lines.join("\n")
    }

    fn handle_event(&mut self, event: &Event) -> Option<Cmd> {
        if let Some(cmd) = self.busy.handle_event(event) {
            return Some(cmd);
        }
        if let Some(checked) = event.message::<LoginChecked>() {
            self.busy.stop();
            match &checked.result {
                Ok(info) => {
                    let info = info.clone();
                    self.save_session(&info, &checked.cookies);
                    // Back to a rebuilt account list with the new session on
                    // top; the old stack is stale.
                    return Some(push_and_remove_until(
                        AccountView::new(self.ctx.clone()),
                        |_, _| false,
                    ));
                }
                Err(err) => {
                    tracing::warn!(%err, "cookie verification failed");
                    self.error = Some(err.to_string());
                }
            }
            return None;
        }

        let Event::Input(data) = event else {
            return None;
        };
        if self.busy.active() {
            return None;
        }
        if matches_key(data, "enter") {
            return self.submit();
        }
        if matches_key(data, "esc") {
            return Some(pop());
        }
        self.input.handle_input(data);
        None
    }
}
