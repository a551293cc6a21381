use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::{
    sync::watch,
    time::{sleep, timeout},
};
use tracing::{error, info, warn};

use super::{Endpoint, EndpointPool, EndpointStatus, EventFeed};
use crate::{
    configuration::Config,
    dao::EntityStore,
    error::Error,
    handler::map_event,
    model::EntityType,
    types::Block_Events,
};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub start_block: i64,
    pub block_range: i64,
    pub polling_interval: Duration,
    pub fetch_timeout: Duration,
    pub fetch_retries: u32,
    pub retry_backoff: Duration,
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        IngestOptions {
            start_block: config.start_block,
            block_range: config.block_range,
            polling_interval: Duration::from_millis(config.polling_interval_ms),
            fetch_timeout: Duration::from_secs(config.fetch_timeout),
            fetch_retries: config.fetch_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub blocks: u64,
    pub events: u64,
    pub inserted: u64,
    pub duplicates: u64,
    pub informational: u64,
    pub skipped: u64,
    pub rotations: u64,
    pub checkpoint: Option<i64>,
}

/// Single writer driving the feed into the store, block by block.
pub struct Ingestor<F: EventFeed> {
    feed: F,
    store: Arc<dyn EntityStore>,
    endpoints: EndpointPool,
    options: IngestOptions,
    status: watch::Sender<EndpointStatus>,
    stop: watch::Receiver<bool>,
    last_position: Option<(i64, i32)>,
    report: IngestReport,
}

impl<F: EventFeed> Ingestor<F> {
    pub fn new(
        feed: F,
        store: Arc<dyn EntityStore>,
        endpoints: EndpointPool,
        options: IngestOptions,
        status: watch::Sender<EndpointStatus>,
        stop: watch::Receiver<bool>,
    ) -> Self {
        status.send_replace(endpoints.status(None));

        Ingestor {
            feed,
            store,
            endpoints,
            options,
            status,
            stop,
            last_position: None,
            report: IngestReport::default(),
        }
    }

    pub fn endpoints(&self) -> &EndpointPool {
        &self.endpoints
    }

    pub fn report(&self) -> &IngestReport {
        &self.report
    }

    /// Follows the chain head until the stop signal flips.
    pub async fn run(&mut self) -> Result<IngestReport, Error> {
        self.drive(true).await
    }

    /// Processes everything up to the current head, then returns.
    pub async fn catch_up(&mut self) -> Result<IngestReport, Error> {
        self.drive(false).await
    }

    async fn drive(&mut self, follow: bool) -> Result<IngestReport, Error> {
        let mut next = match self.store.checkpoint().await? {
            Some(block) => block + 1,
            None => self.options.start_block,
        };

        info!(
            "Ingestion starting at block {} via {}",
            next,
            self.endpoints.current().name
        );

        loop {
            if self.stopped() {
                break;
            }

            let Some(head) = self
                .call_feed("latest block", |feed, endpoint| {
                    feed.latest_block(endpoint)
                })
                .await?
            else {
                break;
            };

            if next > head {
                if !follow || self.idle().await {
                    break;
                }
                continue;
            }

            let from = next;
            self.endpoints.start_at(from);

            let mut to = head.min(from + self.options.block_range - 1);
            if let Some(due) = self.endpoints.next_rotation_block() {
                to = to.min(due.max(from));
            }

            let Some(blocks) = self
                .call_feed("block range", move |feed, endpoint| {
                    feed.fetch_range(endpoint, from, to)
                })
                .await?
            else {
                break;
            };

            for block in &blocks {
                if block.number < from || block.number > to {
                    return Err(Error::FeedOrder(format!(
                        "block {} outside requested range {}-{}",
                        block.number, from, to
                    )));
                }

                self.apply_block(block).await?;

                if self.stopped() {
                    info!("Ingestion stopped after block {}", block.number);
                    return Ok(self.report.clone());
                }
            }

            self.store.save_checkpoint(to).await?;
            self.report.checkpoint = Some(to);
            self.observe_block(to);
            info!("Checkpoint at block {}", to);

            next = to + 1;
        }

        Ok(self.report.clone())
    }

    /// Maps and stores every event of one block, then checkpoints it.
    pub async fn apply_block(&mut self, block: &Block_Events) -> Result<(), Error> {
        for event in &block.events {
            let position = event.position();

            if event.block_number != block.number
                || self.last_position.is_some_and(|last| position <= last)
            {
                return Err(Error::FeedOrder(format!(
                    "event {}-{} in block {} after {:?}",
                    event.block_number,
                    event.log_index,
                    block.number,
                    self.last_position
                )));
            }

            self.last_position = Some(position);
            self.report.events += 1;

            match map_event(event) {
                Ok(Some(entity)) => {
                    if entity.entity_type() == EntityType::Price_Data_Stream {
                        self.store.upsert(&entity).await?;
                        self.report.inserted += 1;
                    } else if self.store.insert_if_absent(&entity).await? {
                        self.report.inserted += 1;
                    } else {
                        self.report.duplicates += 1;
                    }
                },
                Ok(None) => {
                    info!(
                        "{} from {} at {}-{}, user {}",
                        event.name,
                        event.contract,
                        event.block_number,
                        event.log_index,
                        event.args.get("user").map_or("-", String::as_str)
                    );
                    self.report.informational += 1;
                },
                Err(e) if e.is_mapping() => {
                    warn!(
                        "Skipping {} at {}-{} ({}): {}",
                        event.name,
                        event.block_number,
                        event.log_index,
                        event.transaction_hash,
                        e
                    );
                    self.report.skipped += 1;
                },
                Err(e) => return Err(e),
            }
        }

        self.store.save_checkpoint(block.number).await?;
        self.report.blocks += 1;
        self.report.checkpoint = Some(block.number);
        self.observe_block(block.number);

        Ok(())
    }

    fn observe_block(&mut self, block_number: i64) {
        if self.endpoints.advance_if_due(block_number) {
            self.report.rotations += 1;
        }
        self.status
            .send_replace(self.endpoints.status(Some(block_number)));
    }

    fn stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Waits one polling interval. Returns `true` when asked to stop.
    async fn idle(&mut self) -> bool {
        tokio::select! {
            _ = sleep(self.options.polling_interval) => false,
            changed = self.stop.changed() => changed.is_err() || *self.stop.borrow(),
        }
    }

    /// Retries transient failures with exponential backoff, then switches
    /// endpoint and starts over. `None` means a stop was requested meanwhile.
    async fn call_feed<T, C>(
        &mut self,
        what: &str,
        call: C,
    ) -> Result<Option<T>, Error>
    where
        C: for<'a> Fn(&'a F, &'a Endpoint) -> BoxFuture<'a, Result<T, Error>>,
    {
        let mut attempt: u32 = 0;
        let mut backoff = self.options.retry_backoff;

        loop {
            let endpoint = self.endpoints.current().clone();
            let result =
                timeout(self.options.fetch_timeout, call(&self.feed, &endpoint))
                    .await;

            let error = match result {
                Ok(Ok(value)) => return Ok(Some(value)),
                Ok(Err(e)) => e,
                Err(e) => Error::from(e),
            };

            if !error.is_transient() {
                error!("{} failed on {}: {}", what, endpoint.name, error);
                return Err(error);
            }

            attempt += 1;
            if attempt >= self.options.fetch_retries {
                warn!(
                    "{} failed {} times on {}, switching endpoint: {}",
                    what, attempt, endpoint.name, error
                );
                self.endpoints.force_advance();
                self.report.rotations += 1;
                self.status.send_replace(self.endpoints.status(None));
                attempt = 0;
                backoff = self.options.retry_backoff;
            } else {
                warn!(
                    "{} failed on {} (attempt {}/{}), retrying in {:?}: {}",
                    what,
                    endpoint.name,
                    attempt,
                    self.options.fetch_retries,
                    backoff,
                    error
                );
            }

            tokio::select! {
                _ = sleep(backoff) => {},
                changed = self.stop.changed() => {
                    if changed.is_err() || *self.stop.borrow() {
                        return Ok(None);
                    }
                },
            }

            backoff = backoff.saturating_mul(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{MemoryStore, ScanFilter},
        provider::ScriptedFeed,
        types::Chain_Event,
    };

    fn endpoints(names: &[&str]) -> EndpointPool {
        let list = names
            .iter()
            .map(|name| Endpoint::parse(&format!("https://{}", name)).unwrap())
            .collect();
        EndpointPool::new(list, 90).unwrap()
    }

    fn options() -> IngestOptions {
        IngestOptions {
            start_block: 100,
            block_range: 10,
            polling_interval: Duration::from_millis(5),
            fetch_timeout: Duration::from_secs(1),
            fetch_retries: 2,
            retry_backoff: Duration::from_millis(1),
        }
    }

    fn supply(block: i64, log: i32, amount: &str) -> Chain_Event {
        Chain_Event::new(
            "SupplyLiquidity",
            "0xP1",
            block,
            1_700_000_000 + block,
            &format!("0xh{}", block),
            log,
        )
        .with_arg("user", "0xU1")
        .with_arg("amount", amount)
        .with_arg("shares", amount)
    }

    fn block(number: i64, events: Vec<Chain_Event>) -> Block_Events {
        Block_Events {
            number,
            timestamp: 1_700_000_000 + number,
            events,
        }
    }

    fn ingestor(
        feed: ScriptedFeed,
        store: Arc<MemoryStore>,
        names: &[&str],
    ) -> (Ingestor<ScriptedFeed>, watch::Sender<bool>) {
        let pool = endpoints(names);
        let (status, _) = watch::channel(pool.status(None));
        let (stop_tx, stop_rx) = watch::channel(false);
        let ingestor =
            Ingestor::new(feed, store, pool, options(), status, stop_rx);
        (ingestor, stop_tx)
    }

    #[tokio::test]
    async fn ingests_and_checkpoints() {
        let feed = ScriptedFeed::new();
        feed.push_block(block(101, vec![supply(101, 0, "10"), supply(101, 1, "x")]))
            .unwrap();
        feed.push_block(block(
            103,
            vec![Chain_Event::new("Liquidate", "0xPos", 103, 1, "0xh", 0)],
        ))
        .unwrap();
        feed.set_head(115).unwrap();

        let store = Arc::new(MemoryStore::new());
        let (mut ingestor, _stop) = ingestor(feed, store.clone(), &["a"]);
        let report = ingestor.catch_up().await.unwrap();

        assert_eq!(report.events, 3);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.informational, 1);
        assert_eq!(store.checkpoint().await.unwrap(), Some(115));

        let rows = store
            .scan(EntityType::Liquidity_Supply, &ScanFilter::all())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn replay_is_idempotent() {
        let store = Arc::new(MemoryStore::new());

        for _ in 0..2 {
            let feed = ScriptedFeed::new();
            feed.push_block(block(101, vec![supply(101, 0, "10")])).unwrap();
            feed.push_block(block(102, vec![supply(102, 4, "20")])).unwrap();
            let (mut ingestor, _stop) = ingestor(feed, store.clone(), &["a"]);
            ingestor.catch_up().await.unwrap();
            store.set_checkpoint(99).await.unwrap();
        }

        assert_eq!(store.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn resumes_after_checkpoint() {
        let store = Arc::new(MemoryStore::new());
        store.set_checkpoint(101).await.unwrap();

        let feed = ScriptedFeed::new();
        feed.push_block(block(101, vec![supply(101, 0, "10")])).unwrap();
        feed.push_block(block(102, vec![supply(102, 0, "20")])).unwrap();
        let (mut ingestor, _stop) = ingestor(feed, store.clone(), &["a"]);
        let report = ingestor.catch_up().await.unwrap();

        assert_eq!(report.inserted, 1);
        assert!(store
            .get(EntityType::Liquidity_Supply, "0xh101-0")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn out_of_order_feed_is_fatal() {
        let feed = ScriptedFeed::new();
        feed.push_block(block(101, vec![supply(101, 2, "10"), supply(101, 1, "5")]))
            .unwrap();

        let store = Arc::new(MemoryStore::new());
        let (mut ingestor, _stop) = ingestor(feed, store.clone(), &["a"]);
        let err = ingestor.catch_up().await.unwrap_err();

        assert!(matches!(err, Error::FeedOrder(_)));
        assert_eq!(store.checkpoint().await.unwrap(), None);
    }

    #[tokio::test]
    async fn exhausted_retries_switch_endpoint() {
        let feed = ScriptedFeed::new();
        feed.push_block(block(101, vec![supply(101, 0, "10")])).unwrap();
        feed.fail("a", 2).unwrap();

        let store = Arc::new(MemoryStore::new());
        let (mut ingestor, _stop) = ingestor(feed, store.clone(), &["a", "b"]);
        let report = ingestor.catch_up().await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.rotations, 1);
        assert_eq!(ingestor.endpoints().current().name, "b");
        assert_eq!(&ingestor.feed.calls().unwrap()[..3], ["a", "a", "b"]);
    }

    #[tokio::test]
    async fn rotates_on_schedule_across_empty_ranges() {
        let feed = ScriptedFeed::new();
        feed.set_head(280).unwrap();

        let pool = endpoints(&["a", "b", "c"]);
        let (status, _) = watch::channel(pool.status(None));
        let (_stop, stop_rx) = watch::channel(false);
        let options = IngestOptions {
            start_block: 0,
            block_range: 100,
            ..options()
        };

        let store = Arc::new(MemoryStore::new());
        let mut ingestor =
            Ingestor::new(feed, store.clone(), pool, options, status, stop_rx);
        let report = ingestor.catch_up().await.unwrap();

        assert_eq!(report.rotations, 3);
        assert_eq!(ingestor.endpoints().current().name, "a");
        assert_eq!(store.checkpoint().await.unwrap(), Some(280));
    }

    #[tokio::test]
    async fn stop_signal_ends_follow_mode() {
        let feed = ScriptedFeed::new();
        feed.push_block(block(101, vec![supply(101, 0, "10")])).unwrap();

        let store = Arc::new(MemoryStore::new());
        let (mut ingestor, stop) = ingestor(feed, store.clone(), &["a"]);

        let handle = tokio::spawn(async move { ingestor.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.send(true).unwrap();

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(store.checkpoint().await.unwrap(), Some(101));
    }
}
