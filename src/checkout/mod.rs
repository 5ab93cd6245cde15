//! Checkout screen: shows the sale countdown, the four pipeline stages, and
//! the final outcome.

pub mod pipeline;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use storefront_api::format_price;

use crate::event::{Cmd, Event, WinSize};
use crate::navigator::View;
use crate::style;
use crate::widgets::{Spinner, SpinnerTick};

pub use pipeline::{
    CheckoutApi, CheckoutPipeline, ProgressMsg, ProgressSender, PurchaseIntent, TaskStatus,
    TASK_TITLES,
};

use crate::config::PipelineConfig;

struct CountdownTick;

enum Outcome {
    Success(Duration),
    Failure { task: usize, error: String },
}

pub struct CheckoutView {
    /// Consumed on init when the pipeline thread starts.
    pipeline: Option<CheckoutPipeline>,
    tasks: [TaskStatus; 4],
    outcome: Option<Outcome>,
    sale_start: Option<i64>,
    spinner: Spinner,
    item_name: String,
    price_label: String,
}

impl CheckoutView {
    pub fn new(
        api: Arc<dyn CheckoutApi>,
        intent: PurchaseIntent,
        config: PipelineConfig,
        currency: &str,
    ) -> Self {
        let item_name = intent.item.item.name.clone();
        let price_label = format_price(currency, intent.item.chosen().price);
        let sale_start = intent.item.item.upcoming_sale_start();
        Self {
            pipeline: Some(CheckoutPipeline::new(api, intent, config)),
            tasks: [TaskStatus::Pending; 4],
            outcome: None,
            sale_start,
            spinner: Spinner::new(),
            item_name,
            price_label,
        }
    }

    fn finished(&self) -> bool {
        self.outcome.is_some()
    }

    fn seconds_until_sale(&self) -> Option<u64> {
        let sale_start = self.sale_start?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let remaining = sale_start - now;
        (remaining > 0).then_some(remaining as u64)
    }

    fn status_glyph(&self, status: TaskStatus) -> String {
        match status {
            TaskStatus::Pending => style::blurred("○"),
            TaskStatus::Running => style::accent(self.spinner.frame()),
            TaskStatus::Done => style::success("✓"),
            TaskStatus::Failed => style::error("✗"),
        }
    }
}

/// Fires shortly after the next wall-clock second boundary, so the countdown
/// ticks in step with the clock rather than with view creation time.
fn countdown_tick() -> Cmd {
    Cmd::task(|| {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let to_boundary = 1_000_000_000u64 - u64::from(now.subsec_nanos());
        thread::sleep(Duration::from_nanos(to_boundary).max(Duration::from_millis(10)));
        Some(CountdownTick)
    })
}

pub(crate) fn format_countdown(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

impl View for CheckoutView {
    fn init(&mut self) -> Option<Cmd> {
        let mut cmds = vec![Spinner::tick()];
        if self.seconds_until_sale().is_some() {
            cmds.push(countdown_tick());
        }
        if let Some(pipeline) = self.pipeline.take() {
            cmds.push(Cmd::stream(move |sender| {
                let progress = ProgressSender::new(move |msg| sender.post(msg));
                pipeline.execute(progress);
            }));
        }
        Cmd::batch(cmds)
    }

    fn render(&mut self, _size: WinSize) -> String {
        let mut lines = vec![
            style::bold("Checkout"),
            format!("{}  {}", self.item_name, style::accent(&self.price_label)),
            String::new(),
        ];

        if let Some(remaining) = self.seconds_until_sale() {
            lines.push(format!(
                "Sale opens in {}",
                style::warn(&format_countdown(remaining))
            ));
            lines.push(String::new());
        }

        for (index, title) in TASK_TITLES.iter().enumerate() {
            lines.push(format!("{} {title}", self.status_glyph(self.tasks[index])));
        }
        lines.push(String::new());

        match &self.outcome {
            Some(Outcome::Success(elapsed)) => {
                lines.push(style::success(&format!(
                    "Order placed in {} ms",
                    elapsed.as_millis()
                )));
            }
            Some(Outcome::Failure { task, error }) => {
                lines.push(style::error(&format!(
                    "{} failed: {error}",
                    TASK_TITLES[*task]
                )));
            }
            None => {
                lines.push(style::key_help("ctrl+c", "abort"));
            }
        }
        lines.join("\n")
    }

    fn handle_event(&mut self, event: &Event) -> Option<Cmd> {
        if event.message::<SpinnerTick>().is_some() {
            self.spinner.advance();
            return (!self.finished()).then(Spinner::tick);
        }
        if event.message::<CountdownTick>().is_some() {
            return self
                .seconds_until_sale()
                .is_some()
                .then(countdown_tick);
        }
        if let Some(progress) = event.message::<ProgressMsg>() {
            match progress {
                ProgressMsg::Task { index, status } => {
                    if let Some(slot) = self.tasks.get_mut(*index) {
                        *slot = *status;
                    }
                    return None;
                }
                ProgressMsg::Failed { task, error } => {
                    self.outcome = Some(Outcome::Failure {
                        task: *task,
                        error: error.clone(),
                    });
                }
                ProgressMsg::Succeeded { elapsed } => {
                    self.outcome = Some(Outcome::Success(*elapsed));
                }
            }
            // The outcome is final either way; the loop paints this frame
            // once more and exits, which also abandons any calls still in
            // flight after a failure.
            return Some(Cmd::Quit);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storefront_api::{
        ApiError, CheckoutParams, CheckoutableItem, Item, ItemVariant, LogisticChannel,
        PaymentSelection,
    };

    struct NoopApi;

    #[async_trait]
    impl CheckoutApi for NoopApi {
        async fn fetch_item(&self, _shop_id: i64, _item_id: i64) -> Result<Item, ApiError> {
            Err(ApiError::MissingData("test api"))
        }
        async fn validate_checkout(&self, _item: &CheckoutableItem) -> Result<(), ApiError> {
            Ok(())
        }
        async fn checkout_get_quick(
            &self,
            params: CheckoutParams,
        ) -> Result<CheckoutParams, ApiError> {
            Ok(params)
        }
        async fn place_order(&self, _params: &CheckoutParams) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn view() -> CheckoutView {
        let item = Item {
            shop_id: 1,
            item_id: 2,
            name: "widget".to_string(),
            price: 5_000_000,
            stock: 3,
            categories: Vec::new(),
            flash_sale: true,
            upcoming_flash_sale: None,
            models: vec![ItemVariant {
                model_id: 9,
                name: "red".to_string(),
                price: 5_000_000,
                stock: 3,
                tier_index: vec![0],
                has_upcoming_flash_sale: false,
            }],
            tier_variations: Vec::new(),
        };
        let intent = PurchaseIntent {
            item: CheckoutableItem::choose(item, 9).expect("variant"),
            address: storefront_api::Address {
                id: 1,
                name: "A".to_string(),
                phone: "0800".to_string(),
                city: "Jakarta".to_string(),
                detail: "Street".to_string(),
                delivery: true,
            },
            payment: PaymentSelection {
                channel_id: 8_003_001,
                name: "Wallet balance".to_string(),
                option_info: None,
            },
            logistic: LogisticChannel {
                channel_id: 1,
                name: "Standard".to_string(),
                price: 10_000,
                warning: None,
            },
        };
        CheckoutView::new(
            Arc::new(NoopApi),
            intent,
            PipelineConfig::default(),
            "Rp",
        )
    }

    #[test]
    fn countdown_formats_hours_minutes_seconds() {
        assert_eq!(format_countdown(0), "00:00:00");
        assert_eq!(format_countdown(61), "00:01:01");
        assert_eq!(format_countdown(3 * 3600 + 42 * 60 + 5), "03:42:05");
        assert_eq!(format_countdown(100 * 3600), "100:00:00");
    }

    #[test]
    fn progress_messages_update_the_stage_list() {
        let mut view = view();
        view.handle_event(&Event::Message(Box::new(ProgressMsg::Task {
            index: 1,
            status: TaskStatus::Running,
        })));
        assert_eq!(view.tasks[1], TaskStatus::Running);

        view.handle_event(&Event::Message(Box::new(ProgressMsg::Task {
            index: 1,
            status: TaskStatus::Done,
        })));
        assert_eq!(view.tasks[1], TaskStatus::Done);
    }

    #[test]
    fn failure_outcome_is_rendered_with_the_stage_title() {
        let mut view = view();
        view.handle_event(&Event::Message(Box::new(ProgressMsg::Failed {
            task: 2,
            error: "out of stock".to_string(),
        })));
        let frame = view.render(WinSize {
            width: 80,
            height: 24,
        });
        assert!(frame.contains("Fetching order token failed: out of stock"));
    }

    #[test]
    fn success_outcome_quits_the_program() {
        let mut view = view();
        let cmd = view.handle_event(&Event::Message(Box::new(ProgressMsg::Succeeded {
            elapsed: Duration::from_millis(321),
        })));
        assert!(matches!(cmd, Some(Cmd::Quit)));
    }

    #[test]
    fn failure_outcome_quits_the_program() {
        let mut view = view();
        view.handle_event(&Event::Message(Box::new(ProgressMsg::Task {
            index: 1,
            status: TaskStatus::Running,
        })));
        let cmd = view.handle_event(&Event::Message(Box::new(ProgressMsg::Failed {
            task: 1,
            error: "validation rejected".to_string(),
        })));
        assert!(matches!(cmd, Some(Cmd::Quit)));
        assert!(matches!(view.outcome, Some(Outcome::Failure { task: 1, .. })));
    }

    #[test]
    fn stage_updates_alone_do_not_quit() {
        let mut view = view();
        let cmd = view.handle_event(&Event::Message(Box::new(ProgressMsg::Task {
            index: 2,
            status: TaskStatus::Done,
        })));
        assert!(cmd.is_none());
    }

    #[test]
    fn success_outcome_reports_elapsed_milliseconds() {
        let mut view = view();
        view.handle_event(&Event::Message(Box::new(ProgressMsg::Succeeded {
            elapsed: Duration::from_millis(321),
        })));
        let frame = view.render(WinSize {
            width: 80,
            height: 24,
        });
        assert!(frame.contains("Order placed in 321 ms"));
    }
}
