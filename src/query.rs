//! Read-side views: filter and page requests turned into store scans and
//! aggregation calls.

use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    aggregation::{self, GlobalStats, PoolStats, UserOverview, UserStats},
    dao::{Cursor, EntityStore, Order, ScanFilter},
    error::Error,
    model::{
        Basic_Token_Sender, Entity, EntityType, Lending_Pool, Position,
        Price_Data_Stream,
    },
    provider::EndpointStatus,
};

pub const API_VERSION: &str = "2.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default: i64,
    pub cap: i64,
}

pub const ACTIVITY_LIMITS: Limits = Limits {
    default: 20,
    cap: 100,
};

pub const POSITION_LIMITS: Limits = Limits {
    default: 50,
    cap: 200,
};

pub const LIST_LIMITS: Limits = Limits {
    default: 100,
    cap: 1000,
};

/// Raw paging parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl PageQuery {
    pub fn new(limit: Option<i64>, cursor: Option<&str>) -> Self {
        PageQuery {
            limit,
            cursor: cursor.map(str::to_owned),
        }
    }

    /// Validated limit and cursor; non-positive limits are rejected, large
    /// ones are clamped.
    pub fn resolve(&self, limits: Limits) -> Result<(i64, Option<Cursor>), Error> {
        let limit = match self.limit {
            Some(limit) if limit <= 0 => {
                return Err(Error::InvalidOption {
                    option: format!("limit={}", limit),
                });
            },
            Some(limit) => limit.min(limits.cap),
            None => limits.default,
        };

        let cursor = match self.cursor.as_deref() {
            Some(value) if !value.is_empty() => Some(Cursor::from_str(value)?),
            _ => None,
        };

        Ok((limit, cursor))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, limit: i64, last: Option<Cursor>) -> Self {
        let full = i64::try_from(items.len()).unwrap_or(i64::MAX) >= limit;
        Page {
            items,
            next_cursor: if full {
                last.map(|cursor| cursor.to_string())
            } else {
                None
            },
        }
    }
}

/// One row of an activity feed, tagged with its entity type.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub entity: Entity,
}

impl From<Entity> for ActivityItem {
    fn from(entity: Entity) -> Self {
        ActivityItem {
            kind: entity.entity_type().to_string(),
            entity,
        }
    }
}

/// A position with its pool, when the pool row has been ingested.
#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    #[serde(flatten)]
    pub position: Position,
    pub pool: Option<Lending_Pool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolDetail {
    #[serde(flatten)]
    pub pool: Lending_Pool,
    pub stats: PoolStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    pub address: String,
    pub positions: Vec<PositionView>,
    pub activities: Vec<ActivityItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenView {
    pub address: String,
    pub data_stream: Option<String>,
    pub pools: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub tokens: Vec<TokenView>,
    pub price_data_streams: Vec<Price_Data_Stream>,
    pub basic_token_senders: Vec<Basic_Token_Sender>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub healthy: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub chain_id: u64,
    pub store: String,
    pub checkpoint: Option<i64>,
    pub endpoints: Option<EndpointStatus>,
}

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EntityStore>,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService").finish_non_exhaustive()
    }
}

impl QueryService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        QueryService { store }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub async fn pools(&self) -> Result<Vec<Lending_Pool>, Error> {
        let rows = self
            .store
            .scan(EntityType::Lending_Pool, &ScanFilter::all())
            .await?;

        Ok(rows.into_iter().filter_map(into_pool).collect())
    }

    pub async fn pool(&self, address: &str) -> Result<PoolDetail, Error> {
        let pool = self
            .store
            .get(EntityType::Lending_Pool, address)
            .await?
            .and_then(into_pool)
            .ok_or_else(|| Error::NotFound(format!("pool {}", address)))?;
        let stats = aggregation::pool_stats(self.store(), &pool.id).await?;

        Ok(PoolDetail { pool, stats })
    }

    pub async fn pool_activities(
        &self,
        address: &str,
        page: &PageQuery,
    ) -> Result<Page<ActivityItem>, Error> {
        self.activity_page(
            &EntityType::ACTIVITIES,
            ScanFilter::all().pool(address),
            page,
        )
        .await
    }

    pub async fn pool_positions(
        &self,
        address: &str,
        page: &PageQuery,
    ) -> Result<Page<PositionView>, Error> {
        self.positions(None, Some(address), page).await
    }

    pub async fn users(&self) -> Result<Vec<UserOverview>, Error> {
        aggregation::users(self.store()).await
    }

    /// Positions in creation order plus the most recent activity.
    pub async fn user(&self, address: &str) -> Result<UserDetail, Error> {
        let positions = self
            .positions(Some(address), None, &PageQuery::default())
            .await?
            .items;
        let activities = self
            .activity_page(
                &EntityType::ACTIVITIES,
                ScanFilter::all().user(address),
                &PageQuery::default(),
            )
            .await?
            .items;

        Ok(UserDetail {
            address: address.to_owned(),
            positions,
            activities,
        })
    }

    pub async fn user_summary(&self, address: &str) -> Result<UserStats, Error> {
        aggregation::user_stats(self.store(), address).await
    }

    /// Recent activity across pools, optionally restricted to one type.
    pub async fn activities(
        &self,
        kind: Option<&str>,
        page: &PageQuery,
    ) -> Result<Page<ActivityItem>, Error> {
        let types = match kind.filter(|value| !value.is_empty()) {
            Some(value) => vec![activity_type(value)?],
            None => EntityType::ACTIVITIES.to_vec(),
        };

        self.activity_page(&types, ScanFilter::all(), page).await
    }

    pub async fn positions(
        &self,
        user: Option<&str>,
        pool: Option<&str>,
        page: &PageQuery,
    ) -> Result<Page<PositionView>, Error> {
        let (limit, cursor) = page.resolve(POSITION_LIMITS)?;
        let filter = scoped(user, pool).cursor(cursor).limit(limit);
        let rows = self.store.scan(EntityType::Position, &filter).await?;
        let last = rows.last().map(Cursor::of);

        let mut pools: HashMap<String, Option<Lending_Pool>> = HashMap::new();
        let mut items = Vec::with_capacity(rows.len());

        for row in rows {
            let Entity::Position(position) = row else {
                continue;
            };

            let key = position.pool_address.to_lowercase();
            let pool = match pools.get(&key) {
                Some(pool) => pool.clone(),
                None => {
                    let pool = self.lending_pool(&position.pool_address).await?;
                    pools.insert(key, pool.clone());
                    pool
                },
            };

            items.push(PositionView { position, pool });
        }

        Ok(Page::new(items, limit, last))
    }

    pub async fn position(&self, address: &str) -> Result<PositionView, Error> {
        let Some(Entity::Position(position)) =
            self.store.get(EntityType::Position, address).await?
        else {
            return Err(Error::NotFound(format!("position {}", address)));
        };
        let pool = self.lending_pool(&position.pool_address).await?;

        Ok(PositionView { position, pool })
    }

    async fn lending_pool(
        &self,
        address: &str,
    ) -> Result<Option<Lending_Pool>, Error> {
        Ok(self
            .store
            .get(EntityType::Lending_Pool, address)
            .await?
            .and_then(into_pool))
    }

    /// Ascending list of one activity type.
    pub async fn list(
        &self,
        entity_type: EntityType,
        user: Option<&str>,
        pool: Option<&str>,
        page: &PageQuery,
    ) -> Result<Page<Entity>, Error> {
        let (limit, cursor) = page.resolve(LIST_LIMITS)?;
        let filter = scoped(user, pool).cursor(cursor).limit(limit);
        let rows = self.store.scan(entity_type, &filter).await?;
        let last = rows.last().map(Cursor::of);

        Ok(Page::new(rows, limit, last))
    }

    pub async fn tokens(&self) -> Result<Tokens, Error> {
        let pools = self.pools().await?;
        let price_data_streams: Vec<Price_Data_Stream> = self
            .store
            .scan(EntityType::Price_Data_Stream, &ScanFilter::all())
            .await?
            .into_iter()
            .filter_map(|row| match row {
                Entity::Price_Data_Stream(row) => Some(row),
                _ => None,
            })
            .collect();
        let basic_token_senders = self
            .store
            .scan(EntityType::Basic_Token_Sender, &ScanFilter::all())
            .await?
            .into_iter()
            .filter_map(|row| match row {
                Entity::Basic_Token_Sender(row) => Some(row),
                _ => None,
            })
            .collect();

        let mut tokens: BTreeMap<String, TokenView> = BTreeMap::new();
        for pool in &pools {
            for token in [&pool.collateral_token, &pool.borrow_token] {
                let view = tokens.entry(token.to_lowercase()).or_insert_with(|| {
                    TokenView {
                        address: token.to_owned(),
                        data_stream: price_data_streams
                            .iter()
                            .filter(|s| s.token.eq_ignore_ascii_case(token))
                            .max_by_key(|s| (s.block_number, s.log_index))
                            .map(|s| s.data_stream.to_owned()),
                        pools: vec![],
                    }
                });
                if !view.pools.contains(&pool.id) {
                    view.pools.push(pool.id.to_owned());
                }
            }
        }

        Ok(Tokens {
            tokens: tokens.into_values().collect(),
            price_data_streams,
            basic_token_senders,
        })
    }

    /// Most recently registered data stream for `token`.
    pub async fn token_data_stream(
        &self,
        token: &str,
    ) -> Result<Price_Data_Stream, Error> {
        let filter = ScanFilter::all().order(Order::Desc);
        self.store
            .scan(EntityType::Price_Data_Stream, &filter)
            .await?
            .into_iter()
            .find_map(|row| match row {
                Entity::Price_Data_Stream(row)
                    if row.token.eq_ignore_ascii_case(token) =>
                {
                    Some(row)
                },
                _ => None,
            })
            .ok_or_else(|| Error::NotFound(format!("data stream for {}", token)))
    }

    pub async fn stats(&self) -> Result<GlobalStats, Error> {
        aggregation::global_stats(self.store()).await
    }

    /// Never fails; an unreachable store is reported in the payload.
    pub async fn health(
        &self,
        chain_id: u64,
        endpoints: Option<EndpointStatus>,
    ) -> Health {
        let (store, checkpoint) = match self.store.health().await {
            Ok(()) => (
                String::from("ok"),
                self.store.checkpoint().await.ok().flatten(),
            ),
            Err(e) => (e.to_string(), None),
        };

        Health {
            healthy: store == "ok",
            message: String::from("Lending Pool API is healthy"),
            timestamp: Utc::now(),
            version: API_VERSION,
            chain_id,
            store,
            checkpoint,
            endpoints,
        }
    }

    /// Newest-first merge of per-type scans; each type contributes at most
    /// `limit` rows past the cursor, so the merged head is exact.
    async fn activity_page(
        &self,
        types: &[EntityType],
        filter: ScanFilter,
        page: &PageQuery,
    ) -> Result<Page<ActivityItem>, Error> {
        let (limit, cursor) = page.resolve(ACTIVITY_LIMITS)?;
        let filter = filter.order(Order::Desc).cursor(cursor).limit(limit);

        let mut rows = vec![];
        for entity_type in types {
            rows.extend(self.store.scan(*entity_type, &filter).await?);
        }

        rows.sort_by(|a, b| {
            b.position()
                .cmp(&a.position())
                .then_with(|| a.entity_type().cmp(&b.entity_type()))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(0));

        let last = rows.last().map(Cursor::of);
        let items = rows.into_iter().map(ActivityItem::from).collect();

        Ok(Page::new(items, limit, last))
    }
}

fn scoped(user: Option<&str>, pool: Option<&str>) -> ScanFilter {
    let mut filter = ScanFilter::all();
    if let Some(user) = user.filter(|value| !value.is_empty()) {
        filter = filter.user(user);
    }
    if let Some(pool) = pool.filter(|value| !value.is_empty()) {
        filter = filter.pool(pool);
    }
    filter
}

fn into_pool(entity: Entity) -> Option<Lending_Pool> {
    match entity {
        Entity::Lending_Pool(pool) => Some(pool),
        _ => None,
    }
}

fn activity_type(value: &str) -> Result<EntityType, Error> {
    EntityType::from_str(value)
        .ok()
        .filter(EntityType::is_activity)
        .ok_or_else(|| Error::InvalidOption {
            option: format!("type={}", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        custom_uint::Amount,
        dao::MemoryStore,
        model::{Borrow_Debt, Liquidity_Supply},
    };

    fn at(block: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + block, 0).unwrap()
    }

    fn pool(id: &str, block: i64) -> Entity {
        Entity::Lending_Pool(Lending_Pool {
            id: id.to_owned(),
            collateral_token: String::from("0xT1"),
            borrow_token: String::from("0xT2"),
            ltv: Amount::from(7000_u64),
            created_at: at(block),
            block_number: block,
            log_index: 0,
            transaction_hash: format!("0xpool{}", block),
        })
    }

    fn supply(pool: &str, user: &str, block: i64, log: i32) -> Entity {
        Entity::Liquidity_Supply(Liquidity_Supply {
            id: format!("0xs{}-{}", block, log),
            user: user.to_owned(),
            pool_address: pool.to_owned(),
            amount: Amount::from(1000_u64),
            shares: Amount::from(1000_u64),
            block_number: block,
            log_index: log,
            transaction_hash: format!("0xs{}", block),
            timestamp: at(block),
        })
    }

    fn borrow(pool: &str, user: &str, block: i64, log: i32) -> Entity {
        Entity::Borrow_Debt(Borrow_Debt {
            id: format!("0xb{}-{}", block, log),
            user: user.to_owned(),
            pool_address: pool.to_owned(),
            amount: Amount::from(10_u64),
            shares: Amount::from(10_u64),
            block_number: block,
            log_index: log,
            transaction_hash: format!("0xb{}", block),
            timestamp: at(block),
        })
    }

    fn position(pool: &str, user: &str, id: &str, block: i64) -> Entity {
        Entity::Position(Position {
            id: id.to_owned(),
            user: user.to_owned(),
            position_address: id.to_owned(),
            pool_address: pool.to_owned(),
            block_number: block,
            log_index: 0,
            transaction_hash: format!("0xp{}", block),
            timestamp: at(block),
        })
    }

    async fn service(rows: &[Entity]) -> QueryService {
        let store = MemoryStore::new();
        for row in rows {
            store.insert_if_absent(row).await.unwrap();
        }
        QueryService::new(Arc::new(store))
    }

    #[test]
    fn limits_are_validated_and_clamped() {
        let page = PageQuery::new(None, None);
        assert_eq!(page.resolve(ACTIVITY_LIMITS).unwrap(), (20, None));

        let page = PageQuery::new(Some(5000), Some("10-2"));
        assert_eq!(
            page.resolve(LIST_LIMITS).unwrap(),
            (1000, Some(Cursor::new(10, 2)))
        );

        assert!(PageQuery::new(Some(0), None)
            .resolve(POSITION_LIMITS)
            .is_err());
        assert!(PageQuery::new(None, Some("oops"))
            .resolve(POSITION_LIMITS)
            .is_err());
    }

    #[tokio::test]
    async fn activities_are_newest_first_across_types() {
        let query = service(&[
            supply("0xP1", "0xU1", 10, 0),
            borrow("0xP1", "0xU1", 11, 0),
            supply("0xP1", "0xU2", 12, 1),
            borrow("0xP2", "0xU2", 12, 0),
        ])
        .await;

        let page = query
            .activities(None, &PageQuery::new(Some(3), None))
            .await
            .unwrap();
        let ids: Vec<&str> =
            page.items.iter().map(|item| item.entity.id()).collect();

        assert_eq!(ids, vec!["0xs12-1", "0xb12-0", "0xb11-0"]);
        assert_eq!(page.items[0].kind, "liquidity_supply");
        assert_eq!(page.next_cursor.as_deref(), Some("11-0"));

        let next = query
            .activities(None, &PageQuery::new(Some(3), Some("11-0")))
            .await
            .unwrap();
        assert_eq!(next.items.len(), 1);
        assert_eq!(next.items[0].entity.id(), "0xs10-0");
        assert_eq!(next.next_cursor, None);
    }

    #[tokio::test]
    async fn activities_are_stable_and_filterable() {
        let query = service(&[
            supply("0xP1", "0xU1", 10, 0),
            borrow("0xP1", "0xU1", 11, 0),
        ])
        .await;

        let page = PageQuery::new(Some(10), None);
        let first = query.activities(None, &page).await.unwrap();
        let second = query.activities(None, &page).await.unwrap();
        let ids = |page: &Page<ActivityItem>| -> Vec<String> {
            page.items.iter().map(|i| i.entity.id().to_owned()).collect()
        };
        assert_eq!(ids(&first), ids(&second));

        let borrows = query
            .activities(Some("borrow_debt"), &page)
            .await
            .unwrap();
        assert_eq!(borrows.items.len(), 1);

        assert!(matches!(
            query.activities(Some("lending_pool"), &page).await,
            Err(Error::InvalidOption { .. })
        ));
    }

    #[tokio::test]
    async fn positions_resolve_pools_lazily() {
        let query = service(&[
            position("0xP1", "0xU1", "0xpos1", 5),
            position("0xP9", "0xU1", "0xpos2", 6),
            pool("0xp1", 1),
        ])
        .await;

        let page = query
            .positions(Some("0xu1"), None, &PageQuery::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(
            page.items[0].pool.as_ref().map(|p| p.id.as_str()),
            Some("0xp1")
        );
        assert!(page.items[1].pool.is_none());
    }

    #[tokio::test]
    async fn position_lookup_resolves_its_pool() {
        let query = service(&[
            position("0xP1", "0xU1", "0xPos1", 5),
            pool("0xP1", 1),
        ])
        .await;

        let view = query.position("0xpos1").await.unwrap();
        assert_eq!(view.position.id, "0xPos1");
        assert_eq!(view.pool.map(|p| p.id), Some(String::from("0xP1")));

        assert!(matches!(
            query.position("0xPos2").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_pool_is_not_found() {
        let query = service(&[pool("0xP1", 1)]).await;

        assert!(matches!(
            query.pool("0xP2").await,
            Err(Error::NotFound(_))
        ));

        let detail = query.pool("0XP1").await.unwrap();
        assert_eq!(detail.pool.id, "0xP1");
        assert_eq!(detail.stats.total_positions, 0);
    }

    #[tokio::test]
    async fn tokens_are_collected_from_pools() {
        let query = service(&[pool("0xP1", 1), pool("0xP2", 2)]).await;
        let tokens = query.tokens().await.unwrap();

        assert_eq!(tokens.tokens.len(), 2);
        assert_eq!(tokens.tokens[0].address, "0xT1");
        assert_eq!(tokens.tokens[0].pools, vec!["0xP1", "0xP2"]);
        assert!(tokens.price_data_streams.is_empty());
    }

    #[tokio::test]
    async fn token_view_uses_latest_data_stream() {
        let stream = |feed: &str, block: i64| {
            Entity::Price_Data_Stream(Price_Data_Stream {
                id: format!("0xT1-{}", feed),
                token: String::from("0xt1"),
                data_stream: feed.to_owned(),
                block_number: block,
                log_index: 0,
                transaction_hash: format!("0xd{}", block),
            })
        };
        let query = service(&[pool("0xP1", 1)]).await;
        query.store().upsert(&stream("0xNEW", 9)).await.unwrap();
        query.store().upsert(&stream("0xOLD", 5)).await.unwrap();

        let tokens = query.tokens().await.unwrap();
        let latest = query.token_data_stream("0xT1").await.unwrap();

        assert_eq!(latest.data_stream, "0xNEW");
        assert_eq!(tokens.tokens[0].data_stream.as_deref(), Some("0xNEW"));
    }

    #[tokio::test]
    async fn activity_item_carries_type() {
        let item = ActivityItem::from(supply("0xP1", "0xU1", 101, 0));
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["type"], "liquidity_supply");
        assert_eq!(value["id"], "0xs101-0");
        assert_eq!(value["amount"], "1000");
    }
}
