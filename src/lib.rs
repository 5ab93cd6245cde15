//! Interactive flash-sale checkout assistant.
//!
//! The crate splits into a small TUI runtime (stack [`Navigator`] over
//! [`View`]s, driven by [`Program`]) and the timed
//! [`checkout`](crate::checkout) pipeline that fires the actual purchase
//! requests. The storefront client and the on-disk session store live in
//! their own crates.

pub mod checkout;
pub mod config;
pub mod event;
pub mod key;
pub mod logging;
pub mod navigator;
pub mod program;
pub mod style;
pub mod terminal;
pub mod text;
pub mod views;
pub mod widgets;

pub use config::{AppConfig, PipelineConfig, ValidatedPolicy};
pub use event::{Cmd, Event, Msg, WinSize};
pub use navigator::{
    pop, pop_with_result, push, push_and_remove_until, replace, Control, NavRequest, Navigator,
    View,
};
pub use program::{EventSender, Program};
pub use terminal::Terminal;
#[cfg(unix)]
pub use terminal::{install_panic_cleanup, ProcessTerminal};
pub use views::{AccountView, Ctx};
