//! The interactive screens, in visit order: account picker, cookie login,
//! product URL, variant picker, payment picker, delivery picker, and finally
//! the checkout screen.

pub mod account;
pub mod item;
pub mod login;
pub mod logistic;
pub mod payment;
pub mod url;

use std::future::Future;
use std::sync::{Arc, Mutex};

use session_store::{SessionStore, StoredCookie};
use storefront_api::{
    ApiError, Address, CheckoutableItem, Client, LogisticChannel, PaymentSelection, SessionCookie,
};

use crate::checkout::{CheckoutApi, CheckoutView, PurchaseIntent};
use crate::config::AppConfig;
use crate::event::{Cmd, Event};
use crate::navigator::push_and_remove_until;
use crate::widgets::{Spinner, SpinnerTick};

pub use account::AccountView;

/// Shared handles threaded from screen to screen.
#[derive(Clone)]
pub struct Ctx {
    pub config: Arc<AppConfig>,
    pub store: Arc<Mutex<SessionStore>>,
}

impl Ctx {
    pub fn new(config: AppConfig, store: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
        }
    }
}

/// Drives one API call to completion from a task thread. Browsing screens
/// make one call at a time, so a throwaway single-threaded runtime per call
/// is fine; only the checkout pipeline keeps a long-lived one.
pub(crate) fn block_on_api<T>(
    future: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build async runtime");
    runtime.block_on(future)
}

/// Spinner state shared by every screen that runs a background call.
pub(crate) struct Busy {
    spinner: Spinner,
    active: bool,
}

impl Busy {
    pub fn new() -> Self {
        Self {
            spinner: Spinner::new(),
            active: false,
        }
    }

    /// Marks the screen busy and kicks off the animation.
    pub fn start(&mut self) -> Cmd {
        self.active = true;
        Spinner::tick()
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn frame(&self) -> &'static str {
        self.spinner.frame()
    }

    /// Keeps the animation running; call first from `handle_event`.
    pub fn handle_event(&mut self, event: &Event) -> Option<Cmd> {
        if event.message::<SpinnerTick>().is_some() {
            self.spinner.advance();
            return self.active.then(Spinner::tick);
        }
        None
    }
}

/// Hands everything picked so far to the checkout screen. The browsing
/// stack is discarded: checkout is one-way, its only exits are success,
/// failure, or aborting the program.
pub(crate) fn start_checkout(
    ctx: &Ctx,
    client: &Arc<Client>,
    item: CheckoutableItem,
    address: Address,
    payment: PaymentSelection,
    logistic: LogisticChannel,
) -> Cmd {
    let api: Arc<dyn CheckoutApi> = Arc::clone(client) as Arc<dyn CheckoutApi>;
    push_and_remove_until(
        CheckoutView::new(
            api,
            PurchaseIntent {
                item,
                address,
                payment,
                logistic,
            },
            ctx.config.pipeline.clone(),
            &ctx.config.currency,
        ),
        |_, _| false,
    )
}

pub(crate) fn to_session_cookies(cookies: &[StoredCookie]) -> Vec<SessionCookie> {
    cookies
        .iter()
        .map(|cookie| SessionCookie {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            secure: cookie.secure,
            http_only: cookie.http_only,
        })
        .collect()
}

pub(crate) fn to_stored_cookies(cookies: &[SessionCookie]) -> Vec<StoredCookie> {
    cookies
        .iter()
        .map(|cookie| StoredCookie {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            secure: cookie.secure,
            http_only: cookie.http_only,
            expires_at: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_conversion_round_trips() {
        let stored = vec![StoredCookie {
            name: "SPC_SES".to_string(),
            value: "abc".to_string(),
            domain: ".mall.example.com".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            expires_at: Some(1_900_000_000),
        }];
        let session = to_session_cookies(&stored);
        assert_eq!(session[0].name, "SPC_SES");
        let back = to_stored_cookies(&session);
        assert_eq!(back[0].domain, ".mall.example.com");
        // expiry is a persistence detail the client never needs
        assert_eq!(back[0].expires_at, None);
    }

    #[test]
    fn busy_spinner_rearms_only_while_active() {
        let mut busy = Busy::new();
        let _ = busy.start();
        let tick = Event::Message(Box::new(SpinnerTick));
        assert!(busy.handle_event(&tick).is_some());
        busy.stop();
        assert!(busy.handle_event(&tick).is_none());
    }
}
