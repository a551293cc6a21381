use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use async_trait::async_trait;

use super::Endpoint;
use crate::{error::Error, types::Block_Events};

/// Ordered source of decoded chain logs.
#[async_trait]
pub trait EventFeed: Send + Sync {
    async fn latest_block(&self, endpoint: &Endpoint) -> Result<i64, Error>;

    /// Blocks in `[from, to]` that carry at least one matching log, in
    /// ascending block order with logs in log order.
    async fn fetch_range(
        &self,
        endpoint: &Endpoint,
        from: i64,
        to: i64,
    ) -> Result<Vec<Block_Events>, Error>;
}

#[derive(Debug, Default)]
struct Script {
    blocks: BTreeMap<i64, Block_Events>,
    head: i64,
    failures: HashMap<String, u32>,
    calls: Vec<String>,
}

/// In-process feed replaying prepared blocks. Failures can be queued per
/// endpoint name to exercise retry and rotation.
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    script: Mutex<Script>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        ScriptedFeed::default()
    }

    pub fn push_block(&self, block: Block_Events) -> Result<(), Error> {
        let mut script = self.lock()?;
        script.head = script.head.max(block.number);
        script.blocks.insert(block.number, block);
        Ok(())
    }

    pub fn set_head(&self, head: i64) -> Result<(), Error> {
        self.lock()?.head = head;
        Ok(())
    }

    /// The next `times` calls against `endpoint` fail with a feed error.
    pub fn fail(&self, endpoint: &str, times: u32) -> Result<(), Error> {
        self.lock()?.failures.insert(endpoint.to_owned(), times);
        Ok(())
    }

    /// Endpoint names in call order.
    pub fn calls(&self) -> Result<Vec<String>, Error> {
        Ok(self.lock()?.calls.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Script>, Error> {
        self.script
            .lock()
            .map_err(|e| Error::FeedError(e.to_string()))
    }

    fn record(&self, endpoint: &Endpoint) -> Result<(), Error> {
        let mut script = self.lock()?;
        script.calls.push(endpoint.name.to_owned());

        if let Some(remaining) = script.failures.get_mut(&endpoint.name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::FeedError(format!(
                    "{} unavailable",
                    endpoint.name
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventFeed for ScriptedFeed {
    async fn latest_block(&self, endpoint: &Endpoint) -> Result<i64, Error> {
        self.record(endpoint)?;
        Ok(self.lock()?.head)
    }

    async fn fetch_range(
        &self,
        endpoint: &Endpoint,
        from: i64,
        to: i64,
    ) -> Result<Vec<Block_Events>, Error> {
        self.record(endpoint)?;
        if from > to {
            return Ok(vec![]);
        }

        let script = self.lock()?;

        Ok(script
            .blocks
            .range(from..=to)
            .map(|(_, block)| block.clone())
            .collect())
    }
}
