//! Pool, user and protocol statistics computed from store scans.
//!
//! Every total is exact big-integer addition; rows without an amount
//! contribute zero.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    custom_uint::Amount,
    dao::{EntityStore, ScanFilter},
    error::Error,
    model::{Entity, EntityType},
};

/// Entity types whose rows count as user transactions.
const TRANSACTIONS: [EntityType; 3] = [
    EntityType::Liquidity_Supply,
    EntityType::Collateral_Supply,
    EntityType::Borrow_Debt,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub pool_address: String,
    pub total_liquidity: Amount,
    pub total_collateral: Amount,
    pub total_borrowed: Amount,
    pub total_positions: u64,
    pub total_transactions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_address: String,
    pub total_positions: u64,
    pub active_positions: u64,
    pub total_liquidity_supplied: Amount,
    pub total_collateral_supplied: Amount,
    pub total_borrowed: Amount,
    pub total_transactions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_pools: u64,
    pub total_positions: u64,
    pub total_users: u64,
    pub total_transactions: u64,
    pub total_liquidity: Amount,
    pub total_collateral: Amount,
    pub total_borrowed: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOverview {
    pub address: String,
    pub total_positions: u64,
    pub total_transactions: u64,
    pub first_interaction: Option<DateTime<Utc>>,
    pub last_interaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Totals {
    liquidity: Amount,
    collateral: Amount,
    borrowed: Amount,
    positions: u64,
    transactions: u64,
}

fn total(rows: &[Entity]) -> Amount {
    rows.iter().filter_map(Entity::amount).sum()
}

async fn totals(
    store: &dyn EntityStore,
    filter: &ScanFilter,
) -> Result<Totals, Error> {
    let supplies = store.scan(EntityType::Liquidity_Supply, filter).await?;
    let collateral = store.scan(EntityType::Collateral_Supply, filter).await?;
    let borrows = store.scan(EntityType::Borrow_Debt, filter).await?;
    let positions = store.scan(EntityType::Position, filter).await?;

    Ok(Totals {
        liquidity: total(&supplies),
        collateral: total(&collateral),
        borrowed: total(&borrows),
        positions: positions.len() as u64,
        transactions: (supplies.len() + collateral.len() + borrows.len())
            as u64,
    })
}

pub async fn pool_stats(
    store: &dyn EntityStore,
    pool_address: &str,
) -> Result<PoolStats, Error> {
    let totals = totals(store, &ScanFilter::all().pool(pool_address)).await?;

    Ok(PoolStats {
        pool_address: pool_address.to_owned(),
        total_liquidity: totals.liquidity,
        total_collateral: totals.collateral,
        total_borrowed: totals.borrowed,
        total_positions: totals.positions,
        total_transactions: totals.transactions,
    })
}

pub async fn user_stats(
    store: &dyn EntityStore,
    user_address: &str,
) -> Result<UserStats, Error> {
    let totals = totals(store, &ScanFilter::all().user(user_address)).await?;

    Ok(UserStats {
        user_address: user_address.to_owned(),
        total_positions: totals.positions,
        active_positions: totals.positions,
        total_liquidity_supplied: totals.liquidity,
        total_collateral_supplied: totals.collateral,
        total_borrowed: totals.borrowed,
        total_transactions: totals.transactions,
    })
}

pub async fn global_stats(store: &dyn EntityStore) -> Result<GlobalStats, Error> {
    let filter = ScanFilter::all();
    let pools = store.scan(EntityType::Lending_Pool, &filter).await?;
    let totals = totals(store, &filter).await?;

    let mut users: HashSet<String> = HashSet::new();
    for entity_type in
        std::iter::once(EntityType::Position).chain(TRANSACTIONS)
    {
        for row in store.scan(entity_type, &filter).await? {
            if let Some(user) = row.user() {
                users.insert(user.to_lowercase());
            }
        }
    }

    Ok(GlobalStats {
        total_pools: pools.len() as u64,
        total_positions: totals.positions,
        total_users: users.len() as u64,
        total_transactions: totals.transactions,
        total_liquidity: totals.liquidity,
        total_collateral: totals.collateral,
        total_borrowed: totals.borrowed,
    })
}

/// Per-user roll-up keyed by lower-cased address, in address order. The
/// reported address keeps the case of the first row seen.
pub async fn users(store: &dyn EntityStore) -> Result<Vec<UserOverview>, Error> {
    let filter = ScanFilter::all();
    let mut overview: BTreeMap<String, UserOverview> = BTreeMap::new();

    let mut entry = |user: &str| -> String {
        let key = user.to_lowercase();
        overview.entry(key.clone()).or_insert_with(|| UserOverview {
            address: user.to_owned(),
            total_positions: 0,
            total_transactions: 0,
            first_interaction: None,
            last_interaction: None,
        });
        key
    };

    let mut keyed = vec![];
    for row in store.scan(EntityType::Position, &filter).await? {
        if let Some(user) = row.user() {
            keyed.push((entry(user), None));
        }
    }
    for entity_type in TRANSACTIONS {
        for row in store.scan(entity_type, &filter).await? {
            if let Some(user) = row.user() {
                keyed.push((entry(user), Some(row.timestamp())));
            }
        }
    }

    for (key, transaction) in keyed {
        let Some(item) = overview.get_mut(&key) else {
            continue;
        };

        match transaction {
            None => item.total_positions += 1,
            Some(timestamp) => {
                item.total_transactions += 1;
                if let Some(at) = timestamp {
                    item.first_interaction =
                        Some(item.first_interaction.map_or(at, |t| t.min(at)));
                    item.last_interaction =
                        Some(item.last_interaction.map_or(at, |t| t.max(at)));
                }
            },
        }
    }

    Ok(overview.into_values().collect())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::{
        dao::MemoryStore,
        model::{Borrow_Debt, Collateral_Supply, Position},
    };

    fn at(block: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + block, 0).unwrap()
    }

    fn collateral(pool: &str, user: &str, block: i64, amount: &str) -> Entity {
        Entity::Collateral_Supply(Collateral_Supply {
            id: format!("0xc{}-0", block),
            user: user.to_owned(),
            pool_address: pool.to_owned(),
            amount: Amount::from_str(amount).unwrap(),
            block_number: block,
            log_index: 0,
            transaction_hash: format!("0xc{}", block),
            timestamp: at(block),
        })
    }

    fn borrow(pool: &str, user: &str, block: i64, amount: u64) -> Entity {
        Entity::Borrow_Debt(Borrow_Debt {
            id: format!("0xb{}-1", block),
            user: user.to_owned(),
            pool_address: pool.to_owned(),
            amount: Amount::from(amount),
            shares: Amount::from(amount),
            block_number: block,
            log_index: 1,
            transaction_hash: format!("0xb{}", block),
            timestamp: at(block),
        })
    }

    fn position(pool: &str, user: &str, block: i64) -> Entity {
        Entity::Position(Position {
            id: format!("0xpos{}", block),
            user: user.to_owned(),
            position_address: format!("0xpos{}", block),
            pool_address: pool.to_owned(),
            block_number: block,
            log_index: 2,
            transaction_hash: format!("0xp{}", block),
            timestamp: at(block),
        })
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let rows = [
            collateral("0xP1", "0xAbC", 1, "18446744073709551615"),
            collateral("0xP1", "0xdef", 2, "18446744073709551615"),
            collateral("0xP2", "0xabc", 3, "7"),
            borrow("0xP1", "0xABC", 4, 50),
            position("0xp1", "0xabc", 5),
        ];
        for row in &rows {
            store.insert_if_absent(row).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn pool_totals_are_exact() {
        let store = seeded().await;
        let stats = pool_stats(&store, "0xP1").await.unwrap();

        assert_eq!(stats.total_collateral.to_string(), "36893488147419103230");
        assert_eq!(stats.total_borrowed, Amount::from(50_u64));
        assert_eq!(stats.total_liquidity, Amount::zero());
        assert_eq!(stats.total_positions, 1);
        assert_eq!(stats.total_transactions, 3);
    }

    #[tokio::test]
    async fn empty_pool_has_zero_totals() {
        let store = seeded().await;
        let stats = pool_stats(&store, "0xNone").await.unwrap();

        assert_eq!(stats.total_collateral, Amount::zero());
        assert_eq!(stats.total_positions, 0);
        assert_eq!(stats.total_transactions, 0);
    }

    #[tokio::test]
    async fn user_match_ignores_case() {
        let store = seeded().await;
        let stats = user_stats(&store, "0xABC").await.unwrap();

        assert_eq!(stats.user_address, "0xABC");
        assert_eq!(stats.total_collateral_supplied.to_string(), "18446744073709551622");
        assert_eq!(stats.total_borrowed, Amount::from(50_u64));
        assert_eq!(stats.total_positions, 1);
        assert_eq!(stats.active_positions, 1);
    }

    #[tokio::test]
    async fn global_counts_unique_users() {
        let store = seeded().await;
        let stats = global_stats(&store).await.unwrap();

        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_positions, 1);
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.total_pools, 0);

        assert_eq!(global_stats(&store).await.unwrap(), stats);
    }

    #[tokio::test]
    async fn users_roll_up() {
        let store = seeded().await;
        let list = users(&store).await.unwrap();

        assert_eq!(list.len(), 2);
        let abc = &list[0];
        assert_eq!(abc.address, "0xabc");
        assert_eq!(abc.total_positions, 1);
        assert_eq!(abc.total_transactions, 3);
        assert_eq!(abc.first_interaction, Some(at(1)));
        assert_eq!(abc.last_interaction, Some(at(4)));
    }
}
