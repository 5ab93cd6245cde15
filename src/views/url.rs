//! Product URL entry; resolves the link to an item before handing off to the
//! variant picker.

use std::sync::Arc;

use storefront_api::{parse_item_url, Client, Item};

use crate::event::{Cmd, Event, WinSize};
use crate::key::matches_key;
use crate::navigator::{replace, View};
use crate::style;
use crate::views::item::ItemView;
use crate::views::{block_on_api, Busy, Ctx};
use crate::widgets::Input;

struct ItemFetched {
    result: Result<Item, String>,
}

/// Rejects items the pipeline could never buy: nothing on sale now or
/// upcoming, or no upcoming sale to wait for and nothing in stock.
fn sale_gate(item: &Item) -> Result<(), &'static str> {
    if !item.is_flash_sale() && !item.has_upcoming_flash_sale() {
        return Err("this item has no flash sale");
    }
    if !item.has_upcoming_flash_sale() && item.stock == 0 {
        return Err("item is out of stock");
    }
    Ok(())
}

pub struct UrlView {
    ctx: Ctx,
    client: Arc<Client>,
    username: String,
    input: Input,
    busy: Busy,
    error: Option<String>,
}

impl UrlView {
    pub fn new(ctx: Ctx, client: Arc<Client>, username: String) -> Self {
        Self {
            ctx,
            client,
            username,
            input: Input::new("https://mall.example.com/product/..."),
            busy: Busy::new(),
            error: None,
        }
    }

    fn submit(&mut self) -> Option<Cmd> {
        let url = self.input.value().trim().to_string();
        if let Err(err) = parse_item_url(&url) {
            self.error = Some(err.to_string());
            return None;
        }
        self.error = None;
        let spin = self.busy.start();
        let client = Arc::clone(&self.client);
        let fetch = Cmd::task(move || {
            let result = block_on_api(client.fetch_item_from_url(&url))
                .map_err(|err| err.to_string())
                .and_then(|item| match sale_gate(&item) {
                    Ok(()) => Ok(item),
                    Err(reason) => Err(reason.to_string()),
                });
            Some(ItemFetched { result })
        });
        Cmd::batch(vec![spin, fetch])
    }
}

impl View for UrlView {
    fn render(&mut self, _size: WinSize) -> String {
        let mut lines = vec![
            format!(
                "{}  {}",
                style::bold("Product"),
                style::blurred(&format!("logged in as {}", self.username))
            ),
            String::new(),
            "Paste the product link:".to_string(),
            self.input.render(),
            String::new(),
        ];
        if self.busy.active() {
            lines.push(format!(
                "{} loading item...",
                style::accent(self.busy.frame())
            ));
        } else if let Some(error) = &self.error {
            lines.push(style::error(error));
        }
        lines.push(
            [
                style::key_help("enter", "load"),
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
        if let Some(fetched) = event.message::<ItemFetched>() {
            self.busy.stop();
            match &fetched.result {
                Ok(item) => {
                    return Some(replace(ItemView::new(
                        self.ctx.clone(),
                        Arc::clone(&self.client),
                        item.clone(),
                    )));
                }
                Err(err) => {
                    tracing::warn!(%err, "item rejected");
                    self.error = Some(err.clone());
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
        self.input.handle_input(data);
        None
    }
}
