//! Payment picker: the supported channels, with bank/store options expanded
//! into their own rows.

use std::sync::Arc;

use storefront_api::{
    ApiError, Address, CheckoutableItem, Client, LogisticChannel, PaymentSelection,
    PAYMENT_CHANNELS,
};

use crate::event::{Cmd, Event, WinSize};
use crate::key::matches_key;
use crate::navigator::{replace, View};
use crate::style;
use crate::views::logistic::LogisticView;
use crate::views::{block_on_api, start_checkout, Busy, Ctx};
use crate::widgets::{SelectList, SelectRow};

struct LogisticsFetched {
    result: Result<(Address, Vec<LogisticChannel>), ApiError>,
}

pub struct PaymentView {
    ctx: Ctx,
    client: Arc<Client>,
    item: CheckoutableItem,
    selections: Vec<PaymentSelection>,
    list: SelectList,
    busy: Busy,
    error: Option<String>,
}

impl PaymentView {
    pub fn new(ctx: Ctx, client: Arc<Client>, item: CheckoutableItem) -> Self {
        let mut selections = Vec::new();
        let mut rows = Vec::new();
        for channel in PAYMENT_CHANNELS {
            if channel.options.is_empty() {
                selections.push(channel.select());
                rows.push(SelectRow::new(channel.name));
                continue;
            }
            for option in channel.options {
                selections.push(channel.select_option(option));
                rows.push(SelectRow::new(format!("{} / {}", channel.name, option.name)));
            }
        }
        Self {
            ctx,
            client,
            item,
            selections,
            list: SelectList::new(rows, 10),
            busy: Busy::new(),
            error: None,
        }
    }

    fn submit(&mut self) -> Option<Cmd> {
        self.list.selected_row()?;
        self.error = None;
        let spin = self.busy.start();
        let client = Arc::clone(&self.client);
        let item = self.item.item.clone();
        let fetch = Cmd::task(move || {
            let result = block_on_api(async {
                let addresses = client.fetch_addresses().await?;
                let address = addresses
                    .delivery_address()
                    .cloned()
                    .ok_or(ApiError::NoDeliveryAddress)?;
                let channels = client.fetch_shipping_info(&address, &item).await?;
                Ok((address, channels))
            });
            Some(LogisticsFetched { result })
        });
        Cmd::batch(vec![spin, fetch])
    }

    fn proceed(&mut self, address: Address, channels: Vec<LogisticChannel>) -> Cmd {
        let payment = self.selections[self.list.selected()].clone();
        let mut usable = channels.iter().filter(|channel| !channel.has_warning());
        match (usable.next(), usable.next()) {
            // One workable courier: nothing to pick, go straight to checkout.
            (Some(only), None) => start_checkout(
                &self.ctx,
                &self.client,
                self.item.clone(),
                address,
                payment,
                only.clone(),
            ),
            // No courier can deliver this order; the final frame shows the
            // reason and the program exits.
            (None, _) => {
                self.error = Some("no courier can deliver to this address".to_string());
                Cmd::Quit
            }
            _ => replace(LogisticView::new(
                self.ctx.clone(),
                Arc::clone(&self.client),
                self.item.clone(),
                address,
                payment,
                channels,
            )),
        }
    }
}

impl View for PaymentView {
    fn render(&mut self, size: WinSize) -> String {
        let mut lines = vec![style::bold("Payment"), String::new()];
        lines.push(self.list.render(size.width));
        lines.push(String::new());
        if self.busy.active() {
            lines.push(format!(
                "{} loading delivery options...",
                style::accent(self.busy.frame())
            ));
        } else if let Some(error) = &self.error {
            lines.push(style::error(error));
        }
        lines.push(
            [
                style::key_help("↑/↓", "move"),
                style::key_help("enter", "select"),
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
        if let Some(fetched) = event.message::<LogisticsFetched>() {
            self.busy.stop();
            match &fetched.result {
                Ok((address, channels)) => {
                    return Some(self.proceed(address.clone(), channels.clone()));
                }
                Err(err) => {
                    tracing::warn!(%err, "loading delivery options failed");
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
        if self.list.handle_input(data) {
            return None;
        }
        if matches_key(data, "enter") {
            return self.submit();
        }
        None
    }
}
