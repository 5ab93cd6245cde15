//! Account picker: saved sessions from disk plus the cookie-login entry.
//!
//! On entry every stored cookie set is checked against the storefront; dead
//! sessions are pruned from disk and the survivors keep their pre-built
//! clients so selecting one needs no further network round trip.

use std::sync::Arc;

use session_store::SavedSession;
use storefront_api::{Client, ClientConfig};

use crate::event::{Cmd, Event, WinSize};
use crate::key::matches_key;
use crate::navigator::{push, replace, View};
use crate::style;
use crate::views::login::LoginView;
use crate::views::url::UrlView;
use crate::views::{block_on_api, to_session_cookies, Busy, Ctx};
use crate::widgets::{SelectList, SelectRow};

struct SessionsChecked {
    alive: Vec<(SavedSession, Arc<Client>)>,
}

pub struct AccountView {
    ctx: Ctx,
    list: SelectList,
    /// Verified client per listed session, same order as the list rows.
    clients: Vec<Arc<Client>>,
    busy: Busy,
    error: Option<String>,
}

impl AccountView {
    pub fn new(ctx: Ctx) -> Self {
        let list = Self::build_list(&ctx);
        Self {
            ctx,
            list,
            clients: Vec::new(),
            busy: Busy::new(),
            error: None,
        }
    }

    fn build_list(ctx: &Ctx) -> SelectList {
        let store = ctx.store.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<SelectRow> = store
            .sessions()
            .iter()
            .map(|session| {
                let name = session.username.as_deref().unwrap_or("(unknown)");
                SelectRow::new(format!("{name}  saved {}", session.saved_at))
            })
            .collect();
        rows.push(SelectRow::new("Log in with a cookie string"));
        SelectList::new(rows, 8)
    }

    fn session_count(&self) -> usize {
        self.list.len() - 1
    }

    /// Resolves each stored cookie set to its username, dropping sessions the
    /// storefront no longer accepts.
    fn check_sessions(&mut self) -> Option<Cmd> {
        let sessions = {
            let store = self.ctx.store.lock().unwrap_or_else(|e| e.into_inner());
            store.sessions().to_vec()
        };
        if sessions.is_empty() {
            return None;
        }
        let config = ClientConfig::default().with_base_url(&self.ctx.config.base_url);
        let spin = self.busy.start();
        let check = Cmd::task(move || {
            let mut alive = Vec::with_capacity(sessions.len());
            for mut session in sessions {
                let cookies = to_session_cookies(&session.cookies);
                let verified = Client::with_cookies(config.clone(), &cookies).and_then(|client| {
                    let client = Arc::new(client);
                    let info = block_on_api(client.fetch_account_info())?;
                    Ok((info, client))
                });
                match verified {
                    Ok((info, client)) => {
                        session.username = Some(info.username);
                        alive.push((session, client));
                    }
                    Err(err) => {
                        tracing::warn!(%err, "dropping dead session");
                    }
                }
            }
            Some(SessionsChecked { alive })
        });
        Cmd::batch(vec![spin, check])
    }

    fn apply_check(&mut self, checked: &SessionsChecked) {
        self.busy.stop();
        let (sessions, clients): (Vec<_>, Vec<_>) = checked.alive.iter().cloned().unzip();
        {
            let mut store = self.ctx.store.lock().unwrap_or_else(|e| e.into_inner());
            store.retain_sessions(sessions);
            if let Err(err) = store.save() {
                tracing::warn!(%err, "failed to persist pruned sessions");
                self.error = Some(err.to_string());
            }
        }
        self.clients = clients;
        self.list = Self::build_list(&self.ctx);
    }

    fn open_selected(&mut self) -> Option<Cmd> {
        let index = self.list.selected();
        let client = Arc::clone(self.clients.get(index)?);
        let username = {
            let store = self.ctx.store.lock().unwrap_or_else(|e| e.into_inner());
            store
                .sessions()
                .get(index)?
                .username
                .clone()
                .unwrap_or_else(|| "(unknown)".to_string())
        };
        Some(replace(UrlView::new(self.ctx.clone(), client, username)))
    }

    fn delete_selected(&mut self) {
        let index = self.list.selected();
        if index >= self.session_count() {
            return;
        }
        let mut store = self.ctx.store.lock().unwrap_or_else(|e| e.into_inner());
        let mut sessions = store.sessions().to_vec();
        sessions.remove(index);
        store.retain_sessions(sessions);
        if let Err(err) = store.save() {
            tracing::warn!(%err, "failed to persist session removal");
            self.error = Some(err.to_string());
        }
        drop(store);
        if index < self.clients.len() {
            self.clients.remove(index);
        }
        self.list = Self::build_list(&self.ctx);
    }
}

impl View for AccountView {
    fn init(&mut self) -> Option<Cmd> {
        self.check_sessions()
    }

    fn render(&mut self, size: WinSize) -> String {
        let mut lines = vec![style::bold("Accounts"), String::new()];
        lines.push(self.list.render(size.width));
        lines.push(String::new());
        if self.busy.active() {
            lines.push(format!(
                "{} checking saved sessions...",
                style::accent(self.busy.frame())
            ));
        } else if let Some(error) = &self.error {
            lines.push(style::error(error));
        }
        lines.push(
            [
                style::key_help("↑/↓", "move"),
                style::key_help("enter", "select"),
                style::key_help("d", "remove"),
                style::key_help("ctrl+c", "quit"),
            ]
            .join(style::KEY_SEP),
        );
        lines.join("\n")
    }

    fn handle_event(&mut self, event: &Event) -> Option<Cmd> {
        if let Some(cmd) = self.busy.handle_event(event) {
            return Some(cmd);
        }
        if let Some(checked) = event.message::<SessionsChecked>() {
            self.apply_check(checked);
            return None;
        }

        let Event::Input(data) = event else {
            return None;
        };
        if self.busy.active() {
            return None;
        }
        if self.list.handle_input(data) {
            return None;
        }
        if matches_key(data, "enter") {
            if self.list.selected() == self.session_count() {
                return Some(push(LoginView::new(self.ctx.clone())));
            }
            return self.open_selected();
        }
        if matches_key(data, "d") {
            self.delete_selected();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use session_store::{SessionStore, StoredCookie};

    fn ctx(tag: &str) -> Ctx {
        let dir = std::env::temp_dir().join(format!(
            "flashcart-account-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let store = SessionStore::load_or_default(dir.join("state.json")).expect("store");
        Ctx::new(AppConfig::default(), store)
    }

    fn session(name: &str) -> SavedSession {
        SavedSession {
            username: Some(name.to_string()),
            saved_at: "2024-01-01T00:00:00Z".to_string(),
            cookies: vec![StoredCookie {
                name: "SPC_SES".to_string(),
                value: name.to_string(),
                domain: ".mall.example.com".to_string(),
                path: "/".to_string(),
                secure: true,
                http_only: true,
                expires_at: None,
            }],
        }
    }

    #[test]
    fn empty_store_skips_the_session_check() {
        let mut view = AccountView::new(ctx("empty"));
        assert!(view.init().is_none());
        let frame = view.render(WinSize {
            width: 80,
            height: 24,
        });
        assert!(frame.contains("Log in with a cookie string"));
    }

    #[test]
    fn init_checks_stored_sessions() {
        let ctx = ctx("checked");
        {
            let mut store = ctx.store.lock().unwrap();
            store.retain_sessions(vec![session("alice")]);
        }
        let mut view = AccountView::new(ctx);
        assert!(view.init().is_some());
        assert!(view.busy.active());
        // input is ignored while the check runs
        assert!(view.handle_event(&Event::Input("\r".to_string())).is_none());
    }

    #[test]
    fn dead_sessions_are_pruned_from_the_store() {
        let ctx = ctx("prune");
        {
            let mut store = ctx.store.lock().unwrap();
            store.retain_sessions(vec![session("alice"), session("bob")]);
        }
        let mut view = AccountView::new(ctx.clone());
        view.busy.start();
        let client = Arc::new(Client::new(ClientConfig::default()).expect("client"));
        view.handle_event(&Event::Message(Box::new(SessionsChecked {
            alive: vec![(session("bob"), client)],
        })));
        assert!(!view.busy.active());
        assert_eq!(view.session_count(), 1);
        assert_eq!(view.clients.len(), 1);
        let store = ctx.store.lock().unwrap();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].username.as_deref(), Some("bob"));
    }

    #[test]
    fn enter_on_login_row_pushes_the_login_screen() {
        let mut view = AccountView::new(ctx("loginrow"));
        let cmd = view.handle_event(&Event::Input("\r".to_string()));
        assert!(matches!(cmd, Some(Cmd::Nav(_))));
    }

    #[test]
    fn delete_ignores_the_login_row() {
        let mut view = AccountView::new(ctx("delete"));
        view.handle_event(&Event::Input("d".to_string()));
        assert_eq!(view.list.len(), 1);
    }
}
