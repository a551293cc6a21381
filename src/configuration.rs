use std::{
    collections::HashSet, env, fmt, fs, ops::Deref, str::FromStr, sync::Arc,
    time::Duration,
};

use tokio::sync::watch;
use tracing::info;

use crate::{
    aggregation::GlobalStats,
    cache::TimedCache,
    dao::{EntityStore, MemoryStore},
    error::Error,
    provider::{DatabasePool, Endpoint, EndpointStatus},
    query::QueryService,
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

pub struct State {
    pub config: Config,
    pub store: Arc<dyn EntityStore>,
    pub query: QueryService,
    pub endpoint_status: Option<watch::Receiver<EndpointStatus>>,
    pub stats_cache: TimedCache<GlobalStats>,
}

impl State {
    pub fn new(
        config: Config,
        store: Arc<dyn EntityStore>,
        endpoint_status: Option<watch::Receiver<EndpointStatus>>,
    ) -> State {
        let query = QueryService::new(store.clone());
        let stats_cache =
            TimedCache::new(Duration::from_secs(config.stats_cache_ttl));

        State {
            config,
            store,
            query,
            endpoint_status,
            stats_cache,
        }
    }

    pub fn endpoint_status(&self) -> Option<EndpointStatus> {
        self.endpoint_status
            .as_ref()
            .map(|status| status.borrow().clone())
    }
}

/// Opens the configured backend; the postgres schema is applied on open.
pub async fn open_store(config: &Config) -> Result<Arc<dyn EntityStore>, Error> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let database = DatabasePool::new(config).await?;
            database.init_migrations().await?;
            info!("Connected to postgres, schema is up to date");
            Ok(Arc::new(database))
        },
        StoreBackend::Memory => {
            info!("Using in-memory store, data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(value: &str) -> Result<StoreBackend, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(Error::ConfigurationError(format!(
                "STORE_BACKEND must be postgres or memory, got {}",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_endpoints: Vec<Endpoint>,
    pub rotation_threshold: u64,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub chain_id: u64,
    pub start_block: i64,
    pub factory_contract: Option<String>,
    pub pool_contracts: Vec<String>,
    pub position_contracts: Vec<String>,
    pub block_range: i64,
    pub polling_interval_ms: u64,
    pub fetch_timeout: u64,
    pub fetch_retries: u32,
    pub retry_backoff_ms: u64,
    pub enable_sync: bool,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub stats_cache_ttl: u64,
}

impl Config {
    /// Builds the configuration from any key lookup. Keys missing from the
    /// lookup fall back to the shipped `etl.conf` defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let or = |key: &str, default: &str| {
            get(key).unwrap_or_else(|| default.to_owned())
        };

        let rpc_endpoints = list(get("RPC_URLS"))
            .iter()
            .map(|url| Endpoint::parse(url))
            .collect::<Result<Vec<Endpoint>, Error>>()?;

        if rpc_endpoints.is_empty() {
            return Err(Error::ConfigurationError(String::from(
                "RPC_URLS is not set",
            )));
        }

        let store_backend: StoreBackend = or("STORE_BACKEND", "postgres").parse()?;
        let database_url = get("DATABASE_URL");

        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(Error::ConfigurationError(String::from(
                "DATABASE_URL is required for the postgres backend",
            )));
        }

        let block_range: i64 = or("BLOCK_RANGE", "100").parse()?;
        if block_range <= 0 {
            return Err(Error::ConfigurationError(String::from(
                "BLOCK_RANGE must be greater than zero",
            )));
        }

        let fetch_retries: u32 = or("FETCH_RETRIES", "5").parse()?;
        if fetch_retries == 0 {
            return Err(Error::ConfigurationError(String::from(
                "FETCH_RETRIES must be greater than zero",
            )));
        }

        Ok(Config {
            rpc_endpoints,
            rotation_threshold: or("ROTATION_THRESHOLD", "90").parse()?,
            store_backend,
            database_url,
            max_connections: or("MAX_CONNECTIONS", "20").parse()?,
            chain_id: or("CHAIN_ID", "128123").parse()?,
            start_block: or("START_BLOCK", "20856651").parse()?,
            factory_contract: get("FACTORY_CONTRACT"),
            pool_contracts: list(get("POOL_CONTRACTS")),
            position_contracts: list(get("POSITION_CONTRACTS")),
            block_range,
            polling_interval_ms: or("POLLING_INTERVAL_MS", "5000").parse()?,
            fetch_timeout: or("FETCH_TIMEOUT", "10").parse()?,
            fetch_retries,
            retry_backoff_ms: or("RETRY_BACKOFF_MS", "500").parse()?,
            enable_sync: or("ENABLE_SYNC", "true").parse()?,
            server_host: or("SERVER_HOST", "0.0.0.0"),
            port: or("PORT", "42069").parse()?,
            allowed_origins: list(Some(or("ALLOWED_ORIGINS", "*"))),
            stats_cache_ttl: or("STATS_CACHE_TTL", "15").parse()?,
        })
    }

    /// Every address the feed listens to: factory first, then pools and
    /// positions.
    pub fn contracts(&self) -> Vec<String> {
        self.factory_contract
            .iter()
            .chain(&self.pool_contracts)
            .chain(&self.position_contracts)
            .cloned()
            .collect()
    }
}

fn list(value: Option<String>) -> Vec<String> {
    value
        .map(|value| {
            value
                .split(',')
                .map(|item| item.trim().to_owned())
                .filter(|item| !item.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

pub fn get_configuration() -> Result<Config, Error> {
    Config::from_lookup(|key| env::var(key).ok())
}

/// Loads `etl.conf` and then the optional `.env` into the process
/// environment. Variables already set in the environment are kept.
pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";
    let etl_config_file: &str = "etl.conf";

    let directory = env!("CARGO_MANIFEST_DIR");
    let path = format!("{}/{}", directory, config_file);
    let etl_config_path = format!("{}/{}", directory, etl_config_file);

    let preset: HashSet<String> = env::vars().map(|(key, _)| key).collect();

    let etl_config_string = fs::read_to_string(etl_config_path)?;
    parse_config_string(&etl_config_string, &preset);

    if let Ok(config_string) = fs::read_to_string(path) {
        parse_config_string(&config_string, &preset);
    }

    Ok(())
}

fn parse_config_string(config: &str, preset: &HashSet<String>) {
    for (key, value) in parse_pairs(config) {
        if !preset.contains(key) {
            env::set_var(key, value);
        }
    }
}

fn parse_pairs(config: &str) -> Vec<(&str, &str)> {
    config
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let config = Config::from_lookup(lookup(&[
            ("RPC_URLS", "https://a.example/rpc, https://b.example/rpc"),
            ("STORE_BACKEND", "memory"),
        ]))
        .unwrap();

        assert_eq!(config.rpc_endpoints.len(), 2);
        assert_eq!(config.rpc_endpoints[1].name, "b.example");
        assert_eq!(config.rotation_threshold, 90);
        assert_eq!(config.start_block, 20856651);
        assert_eq!(config.port, 42069);
        assert_eq!(config.allowed_origins, vec!["*"]);
        assert!(config.enable_sync);
        assert!(config.contracts().is_empty());
    }

    #[test]
    fn contracts_keep_factory_first() {
        let config = Config::from_lookup(lookup(&[
            ("RPC_URLS", "https://a.example"),
            ("STORE_BACKEND", "memory"),
            ("FACTORY_CONTRACT", "0xF"),
            ("POOL_CONTRACTS", "0xP1,0xP2"),
            ("POSITION_CONTRACTS", ""),
        ]))
        .unwrap();

        assert_eq!(config.contracts(), vec!["0xF", "0xP1", "0xP2"]);
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[(
            "RPC_URLS",
            "https://a.example"
        )]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("RPC_URLS", "https://a.example"),
            ("STORE_BACKEND", "memory"),
            ("PORT", "http"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("RPC_URLS", "https://a.example"),
            ("STORE_BACKEND", "sqlite"),
        ]))
        .is_err());
    }

    #[test]
    fn parses_config_lines() {
        let pairs = parse_pairs("# comment\nPORT=8080\n\nRPC_URLS=a=b\nbad\n");
        assert_eq!(pairs, vec![("PORT", "8080"), ("RPC_URLS", "a=b")]);
    }
}
