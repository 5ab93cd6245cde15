//! Variant picker: item summary, the currently chosen variant, and one
//! arrow-key selector per tier variation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use storefront_api::{format_price, CheckoutableItem, Client, Item, TierVariation};

use crate::checkout::format_countdown;
use crate::event::{Cmd, Event, WinSize};
use crate::key::matches_key;
use crate::navigator::{replace, View};
use crate::style;
use crate::views::payment::PaymentView;
use crate::views::Ctx;

pub struct ItemView {
    ctx: Ctx,
    client: Arc<Client>,
    item: Item,
    citem: Option<CheckoutableItem>,
    /// Selected option index per tier variation.
    tier_focus: Vec<usize>,
    /// Focused row: one per tier, then the confirm button at `tiers()`.
    focus: usize,
    error: Option<String>,
}

impl ItemView {
    pub fn new(ctx: Ctx, client: Arc<Client>, item: Item) -> Self {
        let tier_focus = vec![0; item.tier_variations.len()];
        let citem = CheckoutableItem::choose_by_tier(item.clone(), &tier_focus);
        let focus = if fixed_choice(&item.tier_variations) {
            item.tier_variations.len()
        } else {
            0
        };
        Self {
            ctx,
            client,
            item,
            citem,
            tier_focus,
            focus,
            error: None,
        }
    }

    fn tiers(&self) -> usize {
        self.item.tier_variations.len()
    }

    fn reresolve(&mut self) {
        self.citem = CheckoutableItem::choose_by_tier(self.item.clone(), &self.tier_focus);
    }

    fn sale_line(&self) -> Option<String> {
        if self.item.is_flash_sale() {
            return Some(style::warn("flash sale live"));
        }
        let start = self.item.upcoming_sale_start()?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let mut line = if start > now {
            format!("sale opens in {}", format_countdown((start - now) as u64))
        } else {
            "sale opening now".to_string()
        };
        if let Some(hidden) = self.item.hidden_price() {
            line.push_str(&format!("  sale price {hidden}"));
        }
        Some(style::warn(&line))
    }

    fn chosen_panel(&self) -> Vec<String> {
        let Some(citem) = &self.citem else {
            return vec![style::error("no purchasable variants")];
        };
        let model = citem.chosen();
        let stock = model.stock.to_string();
        vec![
            style::bold("Variant"),
            format!("  {}", model.name),
            format!(
                "  {}  stock {}",
                style::accent(&format_price(&self.ctx.config.currency, model.price)),
                if model.stock > 0 {
                    stock
                } else {
                    style::error(&stock)
                }
            ),
            format!(
                "  flash sale: {}",
                if model.has_upcoming_flash_sale {
                    style::success("yes")
                } else {
                    style::error("no")
                }
            ),
        ]
    }

    fn tier_line(&self, index: usize, tier: &TierVariation) -> String {
        let selected = self.tier_focus[index];
        let option = tier.options.get(selected).map_or("", String::as_str);
        let left = if selected == 0 { "  " } else { "< " };
        let right = if selected + 1 >= tier.options.len() {
            "  "
        } else {
            " >"
        };
        let selector = format!("{left}{option}{right}");
        if self.focus == index {
            format!("{}  {}", style::focused(&tier.name), style::focused(&selector))
        } else {
            format!("{}  {}", tier.name, style::blurred(&selector))
        }
    }

    fn shift_option(&mut self, delta: isize) {
        let Some(tier) = self.item.tier_variations.get(self.focus) else {
            return;
        };
        let last = tier.options.len().saturating_sub(1);
        let current = self.tier_focus[self.focus];
        let next = if delta < 0 {
            current.saturating_sub(1)
        } else {
            (current + 1).min(last)
        };
        if next != current {
            self.tier_focus[self.focus] = next;
            self.reresolve();
        }
    }

    fn confirm(&mut self) -> Option<Cmd> {
        let Some(citem) = &self.citem else {
            self.error = Some("no purchasable variants".to_string());
            return None;
        };
        if !citem.chosen().has_upcoming_flash_sale {
            self.error = Some("this variant has no upcoming flash sale".to_string());
            return None;
        }
        Some(replace(PaymentView::new(
            self.ctx.clone(),
            Arc::clone(&self.client),
            citem.clone(),
        )))
    }
}

impl View for ItemView {
    fn render(&mut self, _size: WinSize) -> String {
        let mut lines = vec![
            style::bold(&self.item.name),
            format!(
                "{}  stock {}",
                style::accent(&format_price(&self.ctx.config.currency, self.item.price)),
                self.item.stock
            ),
        ];
        if !self.item.categories.is_empty() {
            lines.push(style::blurred(&self.item.categories.join(" / ")));
        }
        if let Some(sale) = self.sale_line() {
            lines.push(sale);
        }
        lines.push(String::new());
        lines.extend(self.chosen_panel());
        lines.push(String::new());

        for (index, tier) in self.item.tier_variations.iter().enumerate() {
            lines.push(self.tier_line(index, tier));
        }
        let confirm = if self.focus == self.tiers() {
            style::focused("[ Next ]")
        } else {
            style::blurred("[ Next ]")
        };
        lines.push(confirm);
        lines.push(String::new());
        if let Some(error) = &self.error {
            lines.push(style::error(error));
        }
        lines.push(
            [
                style::key_help("↑/↓", "move"),
                style::key_help("←/→", "change option"),
                style::key_help("enter", "confirm"),
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
        if matches_key(data, "enter") {
            if self.focus == self.tiers() {
                return self.confirm();
            }
            self.focus += 1;
            return None;
        }
        if fixed_choice(&self.item.tier_variations) {
            return None;
        }
        if matches_key(data, "up") || matches_key(data, "shift+tab") {
            self.focus = self.focus.saturating_sub(1);
        } else if matches_key(data, "down") || matches_key(data, "tab") {
            self.focus = (self.focus + 1).min(self.tiers());
        } else if matches_key(data, "left") {
            self.shift_option(-1);
        } else if matches_key(data, "right") {
            self.shift_option(1);
        }
        None
    }
}

/// A single tier with a single option leaves nothing to pick, so the focus
/// stays on the confirm button.
fn fixed_choice(tiers: &[TierVariation]) -> bool {
    tiers.len() == 1 && tiers[0].options.len() == 1
}
