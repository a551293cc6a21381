use std::{fmt, str::FromStr};

use async_trait::async_trait;

use crate::{
    error::Error,
    model::{Entity, EntityType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// Exclusive paging position, rendered as `{block_number}-{log_index}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub block_number: i64,
    pub log_index: i32,
}

impl Cursor {
    pub fn new(block_number: i64, log_index: i32) -> Self {
        Cursor {
            block_number,
            log_index,
        }
    }

    pub fn of(entity: &Entity) -> Self {
        let (block_number, log_index) = entity.position();
        Cursor::new(block_number, log_index)
    }

    /// Whether a row at `position` lies past the cursor in scan order.
    pub fn admits(&self, position: (i64, i32), order: Order) -> bool {
        let cursor = (self.block_number, self.log_index);
        match order {
            Order::Asc => position > cursor,
            Order::Desc => position < cursor,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.block_number, self.log_index)
    }
}

impl FromStr for Cursor {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidOption {
            option: format!("cursor={}", value),
        };

        let (block, log) = value.split_once('-').ok_or_else(invalid)?;
        let block_number: i64 = block.parse().map_err(|_| invalid())?;
        let log_index: i32 = log.parse().map_err(|_| invalid())?;

        if block_number < 0 || log_index < 0 {
            return Err(invalid());
        }

        Ok(Cursor::new(block_number, log_index))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    pub pool_address: Option<String>,
    pub user: Option<String>,
    pub order: Order,
    pub cursor: Option<Cursor>,
    pub limit: Option<i64>,
}

impl ScanFilter {
    pub fn all() -> Self {
        ScanFilter::default()
    }

    pub fn pool(mut self, pool_address: &str) -> Self {
        self.pool_address = Some(pool_address.to_owned());
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = Some(user.to_owned());
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn cursor(mut self, cursor: Option<Cursor>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Equality filters only; cursor and limit are applied by the scan.
    pub fn matches(&self, entity: &Entity) -> bool {
        let user = match &self.user {
            Some(user) => entity
                .user()
                .is_some_and(|value| value.eq_ignore_ascii_case(user)),
            None => true,
        };
        let pool = match &self.pool_address {
            Some(pool) => entity
                .pool_address()
                .is_some_and(|value| value.eq_ignore_ascii_case(pool)),
            None => true,
        };

        user && pool
    }
}

/// Keyed persistence for ingested entities plus the sync checkpoint.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Returns `false` when a row with the same id already exists.
    async fn insert_if_absent(&self, entity: &Entity) -> Result<bool, Error>;

    /// Last-write-wins; only price data streams are written this way.
    async fn upsert(&self, entity: &Entity) -> Result<(), Error>;

    async fn get(
        &self,
        entity_type: EntityType,
        id: &str,
    ) -> Result<Option<Entity>, Error>;

    async fn scan(
        &self,
        entity_type: EntityType,
        filter: &ScanFilter,
    ) -> Result<Vec<Entity>, Error>;

    async fn checkpoint(&self) -> Result<Option<i64>, Error>;

    /// Moves the checkpoint forward; older values are ignored.
    async fn save_checkpoint(&self, block_number: i64) -> Result<(), Error>;

    /// Operator rewind, overwrites unconditionally.
    async fn set_checkpoint(&self, block_number: i64) -> Result<(), Error>;

    async fn health(&self) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_parsing() {
        let cursor = Cursor::from_str("120-3").unwrap();
        assert_eq!(cursor, Cursor::new(120, 3));
        assert_eq!(cursor.to_string(), "120-3");

        assert!(Cursor::from_str("120").is_err());
        assert!(Cursor::from_str("abc-1").is_err());
        assert!(Cursor::from_str("1-x").is_err());
        assert!(Cursor::from_str("-1-2").is_err());
    }

    #[test]
    fn cursor_is_exclusive() {
        let cursor = Cursor::new(10, 2);
        assert!(!cursor.admits((10, 2), Order::Asc));
        assert!(!cursor.admits((10, 2), Order::Desc));
        assert!(cursor.admits((10, 3), Order::Asc));
        assert!(cursor.admits((9, 7), Order::Desc));
    }
}
