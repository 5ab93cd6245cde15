//! Delivery picker. Couriers the storefront flags with a warning cannot be
//! used for this address and are shown greyed out.

use std::sync::Arc;

use storefront_api::{
    format_price, Address, CheckoutableItem, Client, LogisticChannel, PaymentSelection,
};

use crate::event::{Cmd, Event, WinSize};
use crate::key::matches_key;
use crate::navigator::View;
use crate::style;
use crate::views::{start_checkout, Ctx};
use crate::widgets::{SelectList, SelectRow};

pub struct LogisticView {
    ctx: Ctx,
    client: Arc<Client>,
    item: CheckoutableItem,
    address: Address,
    payment: PaymentSelection,
    channels: Vec<LogisticChannel>,
    list: SelectList,
}

impl LogisticView {
    pub fn new(
        ctx: Ctx,
        client: Arc<Client>,
        item: CheckoutableItem,
        address: Address,
        payment: PaymentSelection,
        channels: Vec<LogisticChannel>,
    ) -> Self {
        let currency = &ctx.config.currency;
        let rows = channels
            .iter()
            .map(|channel| {
                let text = format!(
                    "{}  {}",
                    channel.name,
                    format_price(currency, channel.price)
                );
                if channel.has_warning() {
                    SelectRow::disabled(format!("{text}  ({})", channel.warning()))
                } else {
                    SelectRow::new(text)
                }
            })
            .collect();
        Self {
            ctx,
            client,
            item,
            address,
            payment,
            channels,
            list: SelectList::new(rows, 8),
        }
    }
}

impl View for LogisticView {
    fn render(&mut self, size: WinSize) -> String {
        let mut lines = vec![
            style::bold("Delivery"),
            style::blurred(&format!(
                "to {}, {}",
                self.address.name, self.address.city
            )),
            String::new(),
        ];
        lines.push(self.list.render(size.width));
        lines.push(String::new());
        lines.push(
            [
                style::key_help("↑/↓", "move"),
                style::key_help("enter", "start checkout"),
                style::key_help("ctrl+c", "quit"),
            ]
            .join(style::KEY_SEP),
        );
        lines.join("\n")
    }

    fn handle_event(&mut self, event: &Event) -> Option<Cmd> {
        let Event::Input(data) = event else {
            return None;
        };
        if self.list.handle_input(data) {
            return None;
        }
        if matches_key(data, "enter") {
            self.list.selected_row()?;
            let logistic = self.channels.get(self.list.selected())?.clone();
            return Some(start_checkout(
                &self.ctx,
                &self.client,
                self.item.clone(),
                self.address.clone(),
                self.payment.clone(),
                logistic,
            ));
        }
        None
    }
}
