use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
};

use async_trait::async_trait;
use ethers::{
    abi::{parse_abi, Event, RawLog, Token},
    providers::{Http, Middleware, Provider},
    types::{Address, BlockId, BlockNumber, Filter, Log, H256, U64},
    utils::to_checksum,
};
use tracing::debug;

use super::{Endpoint, EventFeed};
use crate::{
    error::Error,
    types::{Block_Events, Chain_Event},
};

/// Event layouts of the factory, pool and position contracts.
pub const EVENT_SIGNATURES: [&str; 14] = [
    "event LendingPoolCreated(address indexed collateralToken, address indexed borrowToken, address indexed lendingPool, uint256 ltv)",
    "event BasicTokenSenderAdded(uint256 indexed chainId, address indexed basicTokenSender)",
    "event TokenDataStreamAdded(address indexed token, address indexed dataStream)",
    "event CreatePosition(address indexed user, address indexed positionAddress)",
    "event SupplyLiquidity(address indexed user, uint256 amount, uint256 shares)",
    "event WithdrawLiquidity(address indexed user, uint256 amount, uint256 shares)",
    "event SupplyCollateral(address indexed user, uint256 amount)",
    "event BorrowDebt(address indexed user, uint256 amount, uint256 shares)",
    "event BorrowDebtCrosschain(address indexed user, uint256 amount, uint256 shares, uint256 chainId, address bridgeTokenSender)",
    "event RepayWithCollateralByPosition(address indexed user, uint256 amount, uint256 shares)",
    "event Liquidate(address indexed user)",
    "event SwapToken(address indexed user, address token, uint256 amount)",
    "event SwapTokenByPosition(address indexed user, address tokenIn, address tokenOut, uint256 amountIn, uint256 amountOut)",
    "event WithdrawCollateral(address indexed user, uint256 amount)",
];

/// `eth_getLogs` feed over the configured contract addresses.
#[derive(Debug)]
pub struct RpcFeed {
    providers: HashMap<String, Provider<Http>>,
    addresses: Vec<Address>,
    events: HashMap<H256, Event>,
}

impl RpcFeed {
    pub fn new(
        endpoints: &[Endpoint],
        contracts: &[String],
    ) -> Result<RpcFeed, Error> {
        let mut providers = HashMap::new();
        for endpoint in endpoints {
            let provider = Provider::<Http>::try_from(endpoint.url.as_str())
                .map_err(|e| Error::ConfigurationError(e.to_string()))?;
            providers.insert(endpoint.url.to_string(), provider);
        }

        let addresses = contracts
            .iter()
            .map(|item| {
                Address::from_str(item.trim()).map_err(|e| {
                    Error::ConfigurationError(format!(
                        "invalid contract address {}: {}",
                        item, e
                    ))
                })
            })
            .collect::<Result<Vec<Address>, Error>>()?;

        let abi = parse_abi(&EVENT_SIGNATURES)
            .map_err(|e| Error::ConfigurationError(e.to_string()))?;
        let events = abi
            .events()
            .map(|event| (event.signature(), event.clone()))
            .collect();

        Ok(RpcFeed {
            providers,
            addresses,
            events,
        })
    }

    fn provider(&self, endpoint: &Endpoint) -> Result<&Provider<Http>, Error> {
        self.providers.get(endpoint.url.as_str()).ok_or_else(|| {
            Error::FeedError(format!("no provider for {}", endpoint.name))
        })
    }

    fn decode(&self, log: &Log, timestamp: i64) -> Option<Chain_Event> {
        if log.removed == Some(true) {
            return None;
        }

        let block_number = log.block_number?.as_u64() as i64;
        let topic = log.topics.first()?;
        let event = self.events.get(topic)?;

        let mut item = Chain_Event::new(
            &event.name,
            &to_checksum(&log.address, None),
            block_number,
            timestamp,
            &format!("{:?}", log.transaction_hash.unwrap_or_default()),
            log.log_index.unwrap_or_default().as_u64() as i32,
        );

        let raw = RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        };

        match event.parse_log(raw) {
            Ok(parsed) => {
                for param in parsed.params {
                    item.args.insert(param.name, token_to_string(&param.value));
                }
            },
            Err(e) => {
                debug!(
                    "Could not decode {} at {}-{}: {}",
                    event.name, item.block_number, item.log_index, e
                );
            },
        }

        Some(item)
    }
}

fn token_to_string(token: &Token) -> String {
    match token {
        Token::Address(address) => to_checksum(address, None),
        Token::Uint(value) | Token::Int(value) => value.to_string(),
        other => other.to_string(),
    }
}

fn feed_error(e: impl std::fmt::Display) -> Error {
    Error::FeedError(e.to_string())
}

#[async_trait]
impl EventFeed for RpcFeed {
    async fn latest_block(&self, endpoint: &Endpoint) -> Result<i64, Error> {
        let number = self
            .provider(endpoint)?
            .get_block_number()
            .await
            .map_err(feed_error)?;

        Ok(number.as_u64() as i64)
    }

    async fn fetch_range(
        &self,
        endpoint: &Endpoint,
        from: i64,
        to: i64,
    ) -> Result<Vec<Block_Events>, Error> {
        if from > to {
            return Ok(vec![]);
        }

        let provider = self.provider(endpoint)?;
        let topics: Vec<H256> = self.events.keys().copied().collect();
        let filter = Filter::new()
            .address(self.addresses.clone())
            .topic0(topics)
            .from_block(from as u64)
            .to_block(to as u64);

        let logs = provider.get_logs(&filter).await.map_err(feed_error)?;

        let mut by_block: BTreeMap<u64, Vec<Log>> = BTreeMap::new();
        for log in logs {
            if let Some(number) = log.block_number {
                by_block.entry(number.as_u64()).or_default().push(log);
            }
        }

        let mut blocks = Vec::with_capacity(by_block.len());
        for (number, mut logs) in by_block {
            let block = provider
                .get_block(BlockId::Number(BlockNumber::Number(U64::from(
                    number,
                ))))
                .await
                .map_err(feed_error)?
                .ok_or_else(|| {
                    Error::FeedError(format!("block {} not found", number))
                })?;
            let timestamp = block.timestamp.as_u64() as i64;

            logs.sort_by_key(|log| log.log_index.unwrap_or_default());
            let events = logs
                .iter()
                .filter_map(|log| self.decode(log, timestamp))
                .collect();

            blocks.push(Block_Events {
                number: number as i64,
                timestamp,
                events,
            });
        }

        Ok(blocks)
    }
}
