use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One decoded log as delivered by the event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain_Event {
    pub name: String,
    pub contract: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    pub block_number: i64,
    pub block_timestamp: i64,
    pub transaction_hash: String,
    pub log_index: i32,
}

impl Chain_Event {
    pub fn new(
        name: &str,
        contract: &str,
        block_number: i64,
        block_timestamp: i64,
        transaction_hash: &str,
        log_index: i32,
    ) -> Self {
        Self {
            name: name.to_owned(),
            contract: contract.to_owned(),
            args: BTreeMap::new(),
            block_number,
            block_timestamp,
            transaction_hash: transaction_hash.to_owned(),
            log_index,
        }
    }

    pub fn with_arg(mut self, key: &str, value: &str) -> Self {
        self.args.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Position of the log in chain order.
    pub fn position(&self) -> (i64, i32) {
        (self.block_number, self.log_index)
    }
}

/// All logs of one block that matched the feed filter, in log order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block_Events {
    pub number: i64,
    pub timestamp: i64,
    pub events: Vec<Chain_Event>,
}
