use std::sync::Arc;

use chrono::{ DateTime, Utc };
use tokio::sync::{ watch, Semaphore };
use tokio::task::JoinHandle;
use tokio::time::{ interval, timeout, MissedTickBehavior };

use crate::config::EvaluatorConfig;
use crate::db::entity::{ account, alert };
use crate::db::{ AlertStore, ListAlertsCriteria };
use crate::enums::{ AlertKind, AlertOp, AlertStatus };
use crate::error::{ AppError, Result };
use crate::notify::PushSender;
use crate::uniswap::PriceOracle;

/// Counters for one evaluation pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Rows pulled from the store this pass.
    pub selected: usize,
    /// Rows not evaluated: wrong status, expired, or unparseable predicate.
    pub skipped: usize,
    /// Pair price fetches that failed; the affected alert waits for the
    /// next pass.
    pub fetch_failures: usize,
    pub triggered: usize,
    pub notified: usize,
}

/// Periodically pulls a batch of alerts, prices their pairs against the
/// shared ETH reference price, and dispatches notifications for the ones
/// whose predicate holds. Passes are strictly serialized; work inside a
/// pass fans out per alert.
pub struct AlertEvaluator {
    store: Arc<AlertStore>,
    oracle: Arc<dyn PriceOracle>,
    notifier: Arc<dyn PushSender>,
    config: EvaluatorConfig,
}

/// Owner handle for the background loop.
pub struct EvaluatorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl EvaluatorHandle {
    /// Signals the loop to stop and waits for the in-flight pass to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<AlertStore>,
        oracle: Arc<dyn PriceOracle>,
        notifier: Arc<dyn PushSender>,
        config: EvaluatorConfig
    ) -> Self {
        Self { store, oracle, notifier, config }
    }

    /// Starts the evaluation loop on a background task.
    pub fn spawn(self) -> EvaluatorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        EvaluatorHandle { shutdown: shutdown_tx, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.config.batch_size,
            max_concurrent_fetches = self.config.max_concurrent_fetches,
            "alert evaluator started"
        );

        let mut tick = interval(self.config.interval);
        // An overrunning pass must delay the next one, not stack behind it.
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match timeout(self.config.pass_timeout, self.evaluate_pass()).await {
                        Ok(Ok(summary)) => {
                            if summary.selected > 0 {
                                tracing::debug!(?summary, "evaluation pass finished");
                            }
                        }
                        Ok(Err(e)) => {
                            tracing::error!(error = %e, "evaluation pass failed");
                        }
                        // Expiry during the fetch phase drops the pass before
                        // any send starts. Sends already spawned when the
                        // deadline hits finish on their own tasks.
                        Err(_) => {
                            tracing::warn!(
                                timeout_secs = self.config.pass_timeout.as_secs(),
                                "evaluation pass exceeded its deadline"
                            );
                        }
                    }
                }
                _ = shutdown.changed() => {
                    tracing::info!("alert evaluator stopped");
                    return;
                }
            }
        }
    }

    async fn evaluate_pass(&self) -> Result<PassSummary> {
        let criteria = ListAlertsCriteria {
            account: self.config.account_scope,
            offset: 0,
            limit: self.config.batch_size,
        };
        let (batch, _) = self.store.find_alerts(self.store.db(), &criteria).await?;

        let mut summary = PassSummary { selected: batch.len(), ..Default::default() };
        if batch.is_empty() {
            return Ok(summary);
        }

        // One reference price per pass; if it cannot be fetched there is
        // nothing to compare against and the whole pass is abandoned.
        let eth_price = self.oracle.eth_price().await?;

        let now = Utc::now();
        let mut due: Vec<(alert::Model, account::Model)> = Vec::new();
        for (alert, account) in batch {
            if is_due(&alert, now) {
                due.push((alert, account));
            } else {
                summary.skipped += 1;
            }
        }

        // Bounded fan-out: each task owns result slot `idx`, so one slow or
        // failing fetch cannot touch another alert's price.
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches));
        let mut fetches: Vec<JoinHandle<(usize, Result<f64>)>> = Vec::with_capacity(due.len());
        for (idx, (alert, _)) in due.iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned().await
                .map_err(|_| AppError::Internal("fetch semaphore closed".to_string()))?;
            let oracle = self.oracle.clone();
            let pair_address = alert.pair_address.clone();
            fetches.push(
                tokio::spawn(async move {
                    let result = oracle.derived_eth(&pair_address).await;
                    drop(permit);
                    (idx, result)
                })
            );
        }

        let mut pair_prices: Vec<Option<f64>> = vec![None; due.len()];
        for handle in fetches {
            match handle.await {
                Ok((idx, Ok(price))) => {
                    pair_prices[idx] = Some(price);
                }
                Ok((idx, Err(e))) => {
                    summary.fetch_failures += 1;
                    tracing::warn!(
                        alert_id = due[idx].0.id,
                        error = %e,
                        "pair price fetch failed, alert waits for the next pass"
                    );
                }
                Err(e) => {
                    summary.fetch_failures += 1;
                    tracing::error!(error = %e, "pair price fetch task panicked");
                }
            }
        }

        // Predicates are decided per alert, then the sends fan out.
        let mut sends: Vec<JoinHandle<bool>> = Vec::new();
        for (idx, (alert, account)) in due.into_iter().enumerate() {
            let Some(pair_price) = pair_prices[idx] else {
                continue;
            };
            let computed = eth_price * pair_price;
            match is_triggered(&alert, computed) {
                Ok(true) => {
                    summary.triggered += 1;
                    let store = self.store.clone();
                    let notifier = self.notifier.clone();
                    sends.push(
                        tokio::spawn(async move {
                            dispatch(store, notifier, alert, account, computed).await
                        })
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    summary.skipped += 1;
                    tracing::warn!(
                        alert_id = alert.id,
                        error = %e,
                        "alert predicate cannot be evaluated, skipping"
                    );
                }
            }
        }

        for handle in sends {
            match handle.await {
                Ok(true) => {
                    summary.notified += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(error = %e, "notification task panicked");
                }
            }
        }

        Ok(summary)
    }
}

fn is_due(alert: &alert::Model, now: DateTime<Utc>) -> bool {
    match alert.alert_status.parse::<AlertStatus>() {
        Ok(AlertStatus::Active) => {}
        Ok(_) => {
            return false;
        }
        Err(_) => {
            tracing::warn!(
                alert_id = alert.id,
                status = %alert.alert_status,
                "unknown alert status, skipping"
            );
            return false;
        }
    }
    alert.expiration_time > now
}

fn is_triggered(alert: &alert::Model, computed: f64) -> Result<bool> {
    match alert.alert_type.parse::<AlertKind>()? {
        AlertKind::Price => {}
    }
    let op = alert.alert_option.parse::<AlertOp>()?;
    let threshold = alert.alert_value
        .parse::<f64>()
        .map_err(|_| {
            AppError::InvalidInput(format!("Invalid alert value: {}", alert.alert_value))
        })?;
    Ok(op.compare(computed, threshold))
}

/// Sends the notification and, only once the send succeeded, retires the
/// alert inside a transaction. A failed retirement leaves the alert active,
/// so delivery is at least once rather than lost.
async fn dispatch(
    store: Arc<AlertStore>,
    notifier: Arc<dyn PushSender>,
    alert: alert::Model,
    account: account::Model,
    computed: f64
) -> bool {
    if let Err(e) = notifier.send(&alert.title, &alert.body, &account.device_token).await {
        tracing::error!(alert_id = alert.id, error = %e, "notification dispatch failed");
        return false;
    }
    tracing::info!(
        alert_id = alert.id,
        slug = %alert.slug,
        computed,
        "alert triggered, notification sent"
    );

    let alert_id = alert.id;
    let tx_store = store.clone();
    let marked = store.run_in_tx(move |txn| {
        Box::pin(async move { tx_store.mark_alert_triggered(txn, alert_id).await })
    }).await;
    if let Err(e) = marked {
        tracing::error!(alert_id, error = %e, "failed to retire triggered alert");
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::{ HashMap, HashSet };
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use migration::{ Migrator, MigratorTrait };
    use sea_orm::{ ActiveModelTrait, ConnectOptions, Database, Set };

    use super::*;
    use crate::db::NewAlert;

    #[derive(Default)]
    struct FakeOracle {
        eth_price: f64,
        eth_fails: bool,
        eth_calls: AtomicUsize,
        pair_prices: HashMap<String, f64>,
        delays: HashMap<String, Duration>,
        fetches_in_flight: AtomicUsize,
        peak_fetches: AtomicUsize,
    }

    #[async_trait]
    impl PriceOracle for FakeOracle {
        async fn eth_price(&self) -> Result<f64> {
            self.eth_calls.fetch_add(1, Ordering::SeqCst);
            if self.eth_fails {
                return Err(AppError::Oracle("bundle fetch failed".to_string()));
            }
            Ok(self.eth_price)
        }

        async fn derived_eth(&self, pair_address: &str) -> Result<f64> {
            let running = self.fetches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_fetches.fetch_max(running, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(pair_address) {
                tokio::time::sleep(*delay).await;
            }
            self.fetches_in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.pair_prices.get(pair_address) {
                Some(price) => Ok(*price),
                None => Err(AppError::Oracle(format!("no liquidity for {}", pair_address))),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String, String)>>,
        fail_tokens: HashSet<String>,
    }

    impl RecordingSender {
        fn sent(&self) -> Vec<(String, String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushSender for RecordingSender {
        async fn send(&self, title: &str, body: &str, device_token: &str) -> Result<()> {
            if self.fail_tokens.contains(device_token) {
                return Err(AppError::Notify("device rejected".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string(), device_token.to_string()));
            Ok(())
        }
    }

    async fn test_store() -> Arc<AlertStore> {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(AlertStore::new(db))
    }

    async fn seed_account(store: &AlertStore, username: &str) -> account::Model {
        let now = Utc::now();
        account::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{}@example.com", username)),
            device_token: Set(format!("device-{}", username)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
            .insert(store.db()).await
            .unwrap()
    }

    async fn seed_alert(
        store: &AlertStore,
        account_id: i64,
        slug: &str,
        pair: &str,
        value: &str,
        option: &str,
        expires_in: ChronoDuration
    ) -> alert::Model {
        store
            .save_alert(store.db(), NewAlert {
                slug: slug.to_string(),
                title: format!("title {}", slug),
                body: format!("body {}", slug),
                pair_address: pair.to_string(),
                alert_type: "price".to_string(),
                alert_value: value.to_string(),
                alert_option: option.to_string(),
                expiration_time: Utc::now() + expires_in,
                alert_actions: "notification".to_string(),
                alert_status: AlertStatus::Active,
                account_id,
            }).await
            .unwrap()
    }

    fn test_config() -> EvaluatorConfig {
        EvaluatorConfig {
            interval: Duration::from_millis(10),
            batch_size: 50,
            max_concurrent_fetches: 4,
            pass_timeout: Duration::from_secs(5),
            account_scope: None,
        }
    }

    fn evaluator(
        store: Arc<AlertStore>,
        oracle: Arc<FakeOracle>,
        sender: Arc<RecordingSender>,
        config: EvaluatorConfig
    ) -> AlertEvaluator {
        AlertEvaluator::new(store, oracle, sender, config)
    }

    #[tokio::test]
    async fn empty_batch_makes_no_oracle_calls() {
        let store = test_store().await;
        let oracle = Arc::new(FakeOracle { eth_price: 2000.0, ..Default::default() });
        let sender = Arc::new(RecordingSender::default());

        let eval = evaluator(store, oracle.clone(), sender.clone(), test_config());
        let summary = eval.evaluate_pass().await.unwrap();

        assert_eq!(summary, PassSummary::default());
        assert_eq!(oracle.eth_calls.load(Ordering::SeqCst), 0);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn triggered_alert_notifies_and_retires() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "eth-moon", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;

        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let eval = evaluator(store.clone(), oracle, sender.clone(), test_config());

        // 2000.0 * 0.001 = 2.0 satisfies >= 1.5
        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.triggered, 1);
        assert_eq!(summary.notified, 1);

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "title eth-moon");
        assert_eq!(sent[0].2, "device-alice");

        let (row, _) = store.find_alert_by_slug(store.db(), "eth-moon").await.unwrap();
        assert_eq!(row.alert_status, "triggered");

        // The next pass sees the retired alert and stays quiet.
        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.notified, 0);
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn below_threshold_leaves_alert_active() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "eth-moon", "0xpair-a", "3.0", "gte", ChronoDuration::hours(1)).await;

        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let eval = evaluator(store.clone(), oracle, sender.clone(), test_config());

        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.triggered, 0);
        assert!(sender.sent().is_empty());

        let (row, _) = store.find_alert_by_slug(store.db(), "eth-moon").await.unwrap();
        assert_eq!(row.alert_status, "active");
    }

    #[tokio::test]
    async fn slow_or_failing_fetch_does_not_leak_into_other_alerts() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "pair-a", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;
        seed_alert(&store, owner.id, "pair-b", "0xpair-b", "1.5", "gte", ChronoDuration::hours(1)).await;
        seed_alert(&store, owner.id, "pair-c", "0xpair-c", "1.5", "gte", ChronoDuration::hours(1)).await;

        // pair-b has no price at all; pair-a answers late
        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([
                ("0xpair-a".to_string(), 0.001),
                ("0xpair-c".to_string(), 0.002),
            ]),
            delays: HashMap::from([("0xpair-a".to_string(), Duration::from_millis(50))]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let eval = evaluator(store.clone(), oracle, sender.clone(), test_config());

        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.selected, 3);
        assert_eq!(summary.fetch_failures, 1);
        assert_eq!(summary.triggered, 2);
        assert_eq!(summary.notified, 2);

        let mut titles: Vec<String> = sender
            .sent()
            .into_iter()
            .map(|(title, _, _)| title)
            .collect();
        titles.sort();
        assert_eq!(titles, ["title pair-a", "title pair-c"]);

        // The failed alert is untouched and will be retried next pass.
        let (row, _) = store.find_alert_by_slug(store.db(), "pair-b").await.unwrap();
        assert_eq!(row.alert_status, "active");
    }

    #[tokio::test]
    async fn reference_price_failure_abandons_the_pass() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "eth-moon", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;

        let oracle = Arc::new(FakeOracle { eth_fails: true, ..Default::default() });
        let sender = Arc::new(RecordingSender::default());
        let eval = evaluator(store.clone(), oracle, sender.clone(), test_config());

        let err = eval.evaluate_pass().await.unwrap_err();
        assert!(matches!(err, AppError::Oracle(_)));
        assert!(sender.sent().is_empty());

        let (row, _) = store.find_alert_by_slug(store.db(), "eth-moon").await.unwrap();
        assert_eq!(row.alert_status, "active");
    }

    #[tokio::test]
    async fn expired_and_unparseable_alerts_are_skipped() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "stale", "0xpair-a", "1.5", "gte", ChronoDuration::hours(-1)).await;
        seed_alert(&store, owner.id, "weird", "0xpair-a", "1.5", "sideways", ChronoDuration::hours(1)).await;

        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let eval = evaluator(store, oracle, sender.clone(), test_config());

        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.selected, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.triggered, 0);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_send_keeps_the_alert_eligible() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "eth-moon", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;

        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            ..Default::default()
        });
        let broken = Arc::new(RecordingSender {
            fail_tokens: HashSet::from(["device-alice".to_string()]),
            ..Default::default()
        });

        let eval = evaluator(store.clone(), oracle.clone(), broken.clone(), test_config());
        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.triggered, 1);
        assert_eq!(summary.notified, 0);

        let (row, _) = store.find_alert_by_slug(store.db(), "eth-moon").await.unwrap();
        assert_eq!(row.alert_status, "active");

        // A healthy sender delivers on the following pass.
        let working = Arc::new(RecordingSender::default());
        let eval = evaluator(store.clone(), oracle, working.clone(), test_config());
        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.notified, 1);
        assert_eq!(working.sent().len(), 1);

        let (row, _) = store.find_alert_by_slug(store.db(), "eth-moon").await.unwrap();
        assert_eq!(row.alert_status, "triggered");
    }

    #[tokio::test]
    async fn account_scope_limits_the_batch() {
        let store = test_store().await;
        let alice = seed_account(&store, "alice").await;
        let bob = seed_account(&store, "bob").await;
        seed_alert(&store, alice.id, "alice-alert", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;
        seed_alert(&store, bob.id, "bob-alert", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;

        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let config = EvaluatorConfig { account_scope: Some(alice.id), ..test_config() };
        let eval = evaluator(store, oracle, sender.clone(), config);

        let summary = eval.evaluate_pass().await.unwrap();
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.notified, 1);

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2, "device-alice");
    }

    #[tokio::test]
    async fn spawn_then_shutdown_stops_the_loop() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "eth-moon", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;

        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let eval = evaluator(store, oracle, sender.clone(), test_config());

        let handle = eval.spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        // The short-interval loop had time for at least one pass, and the
        // retirement keeps it at exactly one send.
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn overrunning_pass_skips_ticks_instead_of_stacking() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        // 2000.0 * 0.001 = 2.0 stays below 3.0, so every pass re-evaluates.
        seed_alert(&store, owner.id, "eth-moon", "0xpair-a", "3.0", "gte", ChronoDuration::hours(1)).await;

        // Each pair fetch outlives several 10ms ticks.
        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            delays: HashMap::from([("0xpair-a".to_string(), Duration::from_millis(35))]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let eval = evaluator(store, oracle.clone(), sender.clone(), test_config());

        let handle = eval.spawn();
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.shutdown().await;

        // The loop kept running passes, but never two at once.
        assert!(oracle.eth_calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(oracle.peak_fetches.load(Ordering::SeqCst), 1);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn pass_timeout_abandons_the_pass_but_not_the_loop() {
        let store = test_store().await;
        let owner = seed_account(&store, "alice").await;
        seed_alert(&store, owner.id, "eth-moon", "0xpair-a", "1.5", "gte", ChronoDuration::hours(1)).await;

        // The fetch can never finish inside the 50ms deadline, so the alert
        // would only fire if an abandoned pass could still dispatch.
        let oracle = Arc::new(FakeOracle {
            eth_price: 2000.0,
            pair_prices: HashMap::from([("0xpair-a".to_string(), 0.001)]),
            delays: HashMap::from([("0xpair-a".to_string(), Duration::from_secs(5))]),
            ..Default::default()
        });
        let sender = Arc::new(RecordingSender::default());
        let config = EvaluatorConfig { pass_timeout: Duration::from_millis(50), ..test_config() };
        let eval = evaluator(store.clone(), oracle.clone(), sender.clone(), config);

        let handle = eval.spawn();
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.shutdown().await;

        // Fresh passes kept being scheduled after each deadline, and none of
        // the abandoned ones dispatched anything.
        assert!(oracle.eth_calls.load(Ordering::SeqCst) >= 2);
        assert!(sender.sent().is_empty());

        let (row, _) = store.find_alert_by_slug(store.db(), "eth-moon").await.unwrap();
        assert_eq!(row.alert_status, "active");
    }
}
