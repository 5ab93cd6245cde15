//! The timed checkout pipeline.
//!
//! Four stages run against the storefront: refresh the item at the sale
//! boundary, validate the checkout, run checkout-get for the order token,
//! and place the order. Validation, checkout-get, and place-order are
//! launched concurrently with a configurable stagger; place-order blocks on
//! the enriched parameters handed over by checkout-get.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::oneshot;

use storefront_api::{
    ApiError, Address, CheckoutParams, CheckoutableItem, Client, Item, LogisticChannel,
    PaymentSelection,
};

use crate::config::{PipelineConfig, ValidatedPolicy};

/// The four stages, in launch order.
pub const TASK_TITLES: [&str; 4] = [
    "Refreshing item",
    "Validating checkout",
    "Fetching order token",
    "Placing order",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

/// Progress reported to the owning view. `Failed` and `Succeeded` are
/// terminal; the sender guarantees at most one of them per run.
#[derive(Debug)]
pub enum ProgressMsg {
    Task { index: usize, status: TaskStatus },
    Failed { task: usize, error: String },
    Succeeded { elapsed: Duration },
}

struct ProgressInner {
    sink: Box<dyn Fn(ProgressMsg) + Send + Sync>,
    terminated: AtomicBool,
}

/// Gated progress channel. Stage tasks keep running after a failure; their
/// late reports are discarded so the view sees exactly one outcome.
#[derive(Clone)]
pub struct ProgressSender {
    inner: Arc<ProgressInner>,
}

impl ProgressSender {
    pub fn new(sink: impl Fn(ProgressMsg) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(ProgressInner {
                sink: Box::new(sink),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    pub fn task(&self, index: usize, status: TaskStatus) {
        if self.inner.terminated.load(Ordering::SeqCst) {
            return;
        }
        (self.inner.sink)(ProgressMsg::Task { index, status });
    }

    pub fn fail(&self, task: usize, error: impl ToString) {
        if self.inner.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        (self.inner.sink)(ProgressMsg::Task {
            index: task,
            status: TaskStatus::Failed,
        });
        (self.inner.sink)(ProgressMsg::Failed {
            task,
            error: error.to_string(),
        });
    }

    pub fn succeed(&self, elapsed: Duration) {
        if self.inner.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        (self.inner.sink)(ProgressMsg::Succeeded { elapsed });
    }
}

/// The slice of the storefront client the pipeline depends on.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    async fn fetch_item(&self, shop_id: i64, item_id: i64) -> Result<Item, ApiError>;
    async fn validate_checkout(&self, item: &CheckoutableItem) -> Result<(), ApiError>;
    async fn checkout_get_quick(&self, params: CheckoutParams)
        -> Result<CheckoutParams, ApiError>;
    async fn place_order(&self, params: &CheckoutParams) -> Result<(), ApiError>;
}

#[async_trait]
impl CheckoutApi for Client {
    async fn fetch_item(&self, shop_id: i64, item_id: i64) -> Result<Item, ApiError> {
        Client::fetch_item(self, shop_id, item_id).await
    }

    async fn validate_checkout(&self, item: &CheckoutableItem) -> Result<(), ApiError> {
        Client::validate_checkout(self, item).await
    }

    async fn checkout_get_quick(
        &self,
        params: CheckoutParams,
    ) -> Result<CheckoutParams, ApiError> {
        Client::checkout_get_quick(self, params).await
    }

    async fn place_order(&self, params: &CheckoutParams) -> Result<(), ApiError> {
        Client::place_order(self, params).await
    }
}

/// Everything the user picked on the way here.
pub struct PurchaseIntent {
    pub item: CheckoutableItem,
    pub address: Address,
    pub payment: PaymentSelection,
    pub logistic: LogisticChannel,
}

pub struct CheckoutPipeline {
    api: Arc<dyn CheckoutApi>,
    intent: PurchaseIntent,
    config: PipelineConfig,
}

impl CheckoutPipeline {
    pub fn new(api: Arc<dyn CheckoutApi>, intent: PurchaseIntent, config: PipelineConfig) -> Self {
        Self {
            api,
            intent,
            config,
        }
    }

    /// Blocking entry point; the owning view hands this to a stream thread so
    /// request latency never contends with the paint loop.
    pub fn execute(self, progress: ProgressSender) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build();
        match runtime {
            Ok(runtime) => runtime.block_on(self.run(progress)),
            Err(err) => {
                tracing::error!(%err, "failed to build checkout runtime");
                progress.fail(0, err);
            }
        }
    }

    pub async fn run(self, progress: ProgressSender) {
        let Self {
            api,
            intent,
            config,
        } = self;
        let PurchaseIntent {
            item,
            address,
            payment,
            logistic,
        } = intent;

        progress.task(0, TaskStatus::Running);
        if let Some(sale_start) = item.item.upcoming_sale_start() {
            wait_for_sale(sale_start, config.lead_time).await;
        }
        // The elapsed clock starts after the wait but before the refresh
        // fetch, so reported timings cover every network call.
        let started = tokio::time::Instant::now();
        let item = match refresh_item(api.as_ref(), item).await {
            Ok(item) => item,
            Err(err) => {
                tracing::warn!(%err, "item refresh failed");
                progress.fail(0, err);
                return;
            }
        };
        progress.task(0, TaskStatus::Done);

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let params =
            CheckoutParams::new(address, &item, payment, logistic).with_timestamp(timestamp);
        let (params_tx, params_rx) = oneshot::channel::<CheckoutParams>();

        let validate = {
            let api = Arc::clone(&api);
            let progress = progress.clone();
            let policy = config.validated_policy;
            tokio::spawn(async move {
                progress.task(1, TaskStatus::Running);
                match api.validate_checkout(&item).await {
                    Ok(()) => progress.task(1, TaskStatus::Done),
                    Err(err) if err.is_already_validated()
                        && policy == ValidatedPolicy::TreatAsSuccess =>
                    {
                        tracing::info!("checkout already validated by an earlier run");
                        progress.task(1, TaskStatus::Done);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "checkout validation failed");
                        progress.fail(1, err);
                    }
                }
            })
        };

        let checkout_get = {
            let api = Arc::clone(&api);
            let progress = progress.clone();
            let params = params.clone();
            let stagger = config.stagger;
            tokio::spawn(async move {
                tokio::time::sleep(stagger).await;
                progress.task(2, TaskStatus::Running);
                match api.checkout_get_quick(params).await {
                    Ok(enriched) => {
                        progress.task(2, TaskStatus::Done);
                        // Receiver gone means the pipeline already failed.
                        let _ = params_tx.send(enriched);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "checkout-get failed");
                        progress.fail(2, err);
                    }
                }
            })
        };

        let place_order = {
            let api = Arc::clone(&api);
            let progress = progress.clone();
            let stagger = config.stagger;
            tokio::spawn(async move {
                tokio::time::sleep(stagger * 2).await;
                progress.task(3, TaskStatus::Running);
                // Sender dropped means checkout-get failed and already
                // reported; nothing left to do here.
                let Ok(params) = params_rx.await else {
                    return;
                };
                match api.place_order(&params).await {
                    Ok(()) => {
                        progress.task(3, TaskStatus::Done);
                        progress.succeed(started.elapsed());
                    }
                    Err(err) => {
                        tracing::warn!(%err, "place order failed");
                        progress.fail(3, err);
                    }
                }
            })
        };

        let _ = tokio::join!(validate, checkout_get, place_order);
    }
}

/// Sleeps until `lead_time` before the sale opens; a deadline already in the
/// past returns immediately.
async fn wait_for_sale(sale_start: i64, lead_time: Duration) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let opens_at = Duration::from_secs(sale_start.max(0) as u64);
    let wait = opens_at.saturating_sub(now).saturating_sub(lead_time);
    if !wait.is_zero() {
        tracing::info!(?wait, "waiting for sale window");
        tokio::time::sleep(wait).await;
    }
}

/// Re-reads the item and re-resolves the chosen variant for the sale price.
/// Items already on sale (or without an upcoming sale) go through unchanged.
async fn refresh_item(
    api: &dyn CheckoutApi,
    item: CheckoutableItem,
) -> Result<CheckoutableItem, ApiError> {
    if item.item.upcoming_sale_start().is_none() {
        return Ok(item);
    }
    let model_id = item.chosen().model_id;
    let fresh = api.fetch_item(item.shop_id(), item.item_id()).await?;
    CheckoutableItem::choose(fresh, model_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use storefront_api::{FlashSale, ItemVariant, PaymentSelection, CODE_ALREADY_VALIDATED};

    fn variant(model_id: i64) -> ItemVariant {
        ItemVariant {
            model_id,
            name: format!("variant {model_id}"),
            price: 1_000_000,
            stock: 5,
            tier_index: vec![0],
            has_upcoming_flash_sale: false,
        }
    }

    fn item(upcoming_sale: Option<i64>) -> Item {
        Item {
            shop_id: 11,
            item_id: 22,
            name: "widget".to_string(),
            price: 1_000_000,
            stock: 5,
            categories: vec!["gadgets".to_string()],
            flash_sale: upcoming_sale.is_none(),
            upcoming_flash_sale: upcoming_sale.map(|start_time| FlashSale {
                start_time,
                hidden_price: None,
            }),
            models: vec![variant(7)],
            tier_variations: Vec::new(),
        }
    }

    fn intent(upcoming_sale: Option<i64>) -> PurchaseIntent {
        PurchaseIntent {
            item: CheckoutableItem::choose(item(upcoming_sale), 7).expect("variant"),
            address: Address {
                id: 1,
                name: "A".to_string(),
                phone: "0800".to_string(),
                city: "Jakarta".to_string(),
                detail: "Street 1".to_string(),
                delivery: true,
            },
            payment: PaymentSelection {
                channel_id: 8_003_001,
                name: "Wallet balance".to_string(),
                option_info: None,
            },
            logistic: LogisticChannel {
                channel_id: 80_001,
                name: "Standard".to_string(),
                price: 10_000,
                warning: None,
            },
        }
    }

    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<(&'static str, tokio::time::Instant)>>,
        fetch_result: Mutex<Option<Result<Item, ApiError>>>,
        validate_error: Mutex<Option<ApiError>>,
        checkout_get_error: Mutex<Option<ApiError>>,
        place_order_error: Mutex<Option<ApiError>>,
    }

    impl MockApi {
        fn record(&self, name: &'static str) {
            self.calls
                .lock()
                .expect("calls lock")
                .push((name, tokio::time::Instant::now()));
        }

        fn call_names(&self) -> Vec<&'static str> {
            self.calls
                .lock()
                .expect("calls lock")
                .iter()
                .map(|(name, _)| *name)
                .collect()
        }

        fn call_time(&self, name: &'static str) -> Option<tokio::time::Instant> {
            self.calls
                .lock()
                .expect("calls lock")
                .iter()
                .find(|(call, _)| *call == name)
                .map(|(_, at)| *at)
        }
    }

    #[async_trait]
    impl CheckoutApi for MockApi {
        async fn fetch_item(&self, _shop_id: i64, _item_id: i64) -> Result<Item, ApiError> {
            self.record("fetch_item");
            self.fetch_result
                .lock()
                .expect("fetch lock")
                .take()
                .unwrap_or_else(|| Ok(item(None)))
        }

        async fn validate_checkout(&self, _item: &CheckoutableItem) -> Result<(), ApiError> {
            self.record("validate");
            match self.validate_error.lock().expect("validate lock").take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn checkout_get_quick(
            &self,
            params: CheckoutParams,
        ) -> Result<CheckoutParams, ApiError> {
            self.record("checkout_get");
            match self.checkout_get_error.lock().expect("get lock").take() {
                Some(err) => Err(err),
                None => {
                    let mut enriched = params;
                    enriched.order_token = Some("token".to_string());
                    enriched.checkout_sn = Some("sn".to_string());
                    Ok(enriched)
                }
            }
        }

        async fn place_order(&self, params: &CheckoutParams) -> Result<(), ApiError> {
            self.record("place_order");
            assert!(params.is_enriched(), "place_order needs enriched params");
            match self.place_order_error.lock().expect("place lock").take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn collector() -> (ProgressSender, Arc<Mutex<Vec<ProgressMsg>>>) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let sender = ProgressSender::new(move |msg| {
            sink.lock().expect("messages lock").push(msg);
        });
        (sender, messages)
    }

    fn terminal_messages(messages: &[ProgressMsg]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|msg| match msg {
                ProgressMsg::Failed { task, .. } => Some(format!("failed:{task}")),
                ProgressMsg::Succeeded { .. } => Some("succeeded".to_string()),
                ProgressMsg::Task { .. } => None,
            })
            .collect()
    }

    fn run_pipeline(api: Arc<MockApi>, intent: PurchaseIntent, config: PipelineConfig) -> CheckoutPipeline {
        CheckoutPipeline::new(api, intent, config)
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_runs_stages_in_launch_order() {
        let api = Arc::new(MockApi::default());
        let (progress, messages) = collector();
        run_pipeline(Arc::clone(&api), intent(None), PipelineConfig::default())
            .run(progress)
            .await;

        assert_eq!(api.call_names(), vec!["validate", "checkout_get", "place_order"]);
        let messages = messages.lock().expect("messages lock");
        assert_eq!(terminal_messages(&messages), vec!["succeeded"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stages_launch_with_the_configured_stagger() {
        let api = Arc::new(MockApi::default());
        let (progress, _messages) = collector();
        let config = PipelineConfig {
            stagger: Duration::from_millis(100),
            ..PipelineConfig::default()
        };
        run_pipeline(Arc::clone(&api), intent(None), config)
            .run(progress)
            .await;

        let validate = api.call_time("validate").expect("validate ran");
        let checkout_get = api.call_time("checkout_get").expect("checkout_get ran");
        let place_order = api.call_time("place_order").expect("place_order ran");
        assert_eq!(checkout_get - validate, Duration::from_millis(100));
        assert_eq!(place_order - validate, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn checkout_get_failure_skips_place_order() {
        let api = Arc::new(MockApi::default());
        *api.checkout_get_error.lock().expect("get lock") = Some(ApiError::Api {
            code: 500,
            message: "server said no".to_string(),
        });
        let (progress, messages) = collector();
        run_pipeline(Arc::clone(&api), intent(None), PipelineConfig::default())
            .run(progress)
            .await;

        // place_order launched but bailed out on the dropped handoff.
        assert!(!api.call_names().contains(&"place_order"));
        let messages = messages.lock().expect("messages lock");
        assert_eq!(terminal_messages(&messages), vec!["failed:2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn already_validated_is_success_by_default() {
        let api = Arc::new(MockApi::default());
        *api.validate_error.lock().expect("validate lock") = Some(ApiError::Api {
            code: CODE_ALREADY_VALIDATED,
            message: "validated".to_string(),
        });
        let (progress, messages) = collector();
        run_pipeline(Arc::clone(&api), intent(None), PipelineConfig::default())
            .run(progress)
            .await;

        let messages = messages.lock().expect("messages lock");
        assert_eq!(terminal_messages(&messages), vec!["succeeded"]);
    }

    #[tokio::test(start_paused = true)]
    async fn strict_policy_reports_already_validated_as_failure() {
        let api = Arc::new(MockApi::default());
        *api.validate_error.lock().expect("validate lock") = Some(ApiError::Api {
            code: CODE_ALREADY_VALIDATED,
            message: "validated".to_string(),
        });
        let (progress, messages) = collector();
        let config = PipelineConfig {
            validated_policy: ValidatedPolicy::TreatAsFailure,
            ..PipelineConfig::default()
        };
        run_pipeline(Arc::clone(&api), intent(None), config)
            .run(progress)
            .await;

        let messages = messages.lock().expect("messages lock");
        let terminal = terminal_messages(&messages);
        assert_eq!(terminal.len(), 1, "exactly one outcome: {terminal:?}");
        assert_eq!(terminal[0], "failed:1");
    }

    #[tokio::test(start_paused = true)]
    async fn upcoming_sale_waits_then_refetches_before_firing() {
        let sale_start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_secs() as i64
            + 3600;
        let api = Arc::new(MockApi::default());
        let (progress, messages) = collector();
        let config = PipelineConfig {
            lead_time: Duration::from_secs(1),
            ..PipelineConfig::default()
        };
        let before = tokio::time::Instant::now();
        run_pipeline(Arc::clone(&api), intent(Some(sale_start)), config)
            .run(progress)
            .await;

        let waited = tokio::time::Instant::now() - before;
        assert!(
            waited >= Duration::from_secs(3500),
            "expected a long paused-clock wait, got {waited:?}"
        );
        let calls = api.call_names();
        assert_eq!(calls.first(), Some(&"fetch_item"));
        let messages = messages.lock().expect("messages lock");
        assert_eq!(terminal_messages(&messages), vec!["succeeded"]);
        // Reported elapsed covers the calls only, never the sale wait.
        let elapsed = messages
            .iter()
            .find_map(|msg| match msg {
                ProgressMsg::Succeeded { elapsed } => Some(*elapsed),
                _ => None,
            })
            .expect("succeeded message");
        assert_eq!(elapsed, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn variant_gone_after_refresh_fails_the_first_stage() {
        let sale_start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_secs() as i64
            + 10;
        let api = Arc::new(MockApi::default());
        let mut gone = item(None);
        gone.models = vec![variant(99)];
        *api.fetch_result.lock().expect("fetch lock") = Some(Ok(gone));
        let (progress, messages) = collector();
        run_pipeline(
            Arc::clone(&api),
            intent(Some(sale_start)),
            PipelineConfig::default(),
        )
        .run(progress)
        .await;

        let messages = messages.lock().expect("messages lock");
        assert_eq!(terminal_messages(&messages), vec!["failed:0"]);
        assert!(!api.call_names().contains(&"validate"));
    }

    #[test]
    fn progress_sender_delivers_at_most_one_terminal_message() {
        let (progress, messages) = collector();
        progress.task(1, TaskStatus::Running);
        progress.fail(1, "boom");
        progress.succeed(Duration::from_millis(5));
        progress.fail(2, "late");
        progress.task(3, TaskStatus::Done);

        let messages = messages.lock().expect("messages lock");
        assert_eq!(terminal_messages(&messages), vec!["failed:1"]);
        // Non-terminal reports after the outcome are dropped too.
        assert_eq!(messages.len(), 3);
    }
}
