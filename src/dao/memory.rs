use std::{
    collections::{BTreeMap, HashMap},
    ops::Bound,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;

use super::store::{EntityStore, Order, ScanFilter};
use crate::{
    error::Error,
    model::{Entity, EntityType},
};

type RowKey = (i64, i32, String);

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<EntityType, BTreeMap<RowKey, Entity>>,
    ids: HashMap<(EntityType, String), RowKey>,
    journal: Vec<(EntityType, String)>,
    checkpoint: Option<i64>,
}

impl Tables {
    fn key(entity: &Entity) -> RowKey {
        (
            entity.block_number(),
            entity.log_index(),
            entity.id().to_lowercase(),
        )
    }

    fn put(&mut self, entity: &Entity) {
        let entity_type = entity.entity_type();
        let key = Self::key(entity);
        let id = (entity_type, entity.id().to_lowercase());

        if let Some(previous) = self.ids.insert(id.clone(), key.clone()) {
            if let Some(rows) = self.rows.get_mut(&entity_type) {
                rows.remove(&previous);
            }
        } else {
            self.journal.push(id);
        }

        self.rows
            .entry(entity_type)
            .or_default()
            .insert(key, entity.clone());
    }
}

/// Ordered in-memory store. Backs the test suite and `STORE_BACKEND=memory`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, Error> {
        self.tables
            .read()
            .map_err(|e| Error::StoreError(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, Error> {
        self.tables
            .write()
            .map_err(|e| Error::StoreError(e.to_string()))
    }

    /// Every row, grouped by entity type and ordered by chain position.
    pub fn snapshot(&self) -> Result<Vec<Entity>, Error> {
        let tables = self.read()?;
        let mut rows = vec![];

        for entity_type in EntityType::ALL {
            if let Some(table) = tables.rows.get(&entity_type) {
                rows.extend(table.values().cloned());
            }
        }

        Ok(rows)
    }

    /// Ids in the order they were first written.
    pub fn journal(&self) -> Result<Vec<String>, Error> {
        let tables = self.read()?;
        Ok(tables
            .journal
            .iter()
            .map(|(entity_type, id)| format!("{}:{}", entity_type, id))
            .collect())
    }

    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.read()?.ids.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert_if_absent(&self, entity: &Entity) -> Result<bool, Error> {
        let mut tables = self.write()?;
        let id = (entity.entity_type(), entity.id().to_lowercase());

        if tables.ids.contains_key(&id) {
            return Ok(false);
        }

        tables.put(entity);
        Ok(true)
    }

    async fn upsert(&self, entity: &Entity) -> Result<(), Error> {
        let mut tables = self.write()?;
        tables.put(entity);
        Ok(())
    }

    async fn get(
        &self,
        entity_type: EntityType,
        id: &str,
    ) -> Result<Option<Entity>, Error> {
        let tables = self.read()?;
        let entity = tables
            .ids
            .get(&(entity_type, id.to_lowercase()))
            .and_then(|key| {
                tables
                    .rows
                    .get(&entity_type)
                    .and_then(|rows| rows.get(key))
            })
            .cloned();

        Ok(entity)
    }

    async fn scan(
        &self,
        entity_type: EntityType,
        filter: &ScanFilter,
    ) -> Result<Vec<Entity>, Error> {
        let tables = self.read()?;
        let Some(rows) = tables.rows.get(&entity_type) else {
            return Ok(vec![]);
        };

        let range = match (&filter.cursor, filter.order) {
            (Some(cursor), Order::Asc) => rows.range((
                Bound::Excluded((
                    cursor.block_number,
                    cursor.log_index,
                    String::from("\u{10FFFF}"),
                )),
                Bound::Unbounded,
            )),
            (Some(cursor), Order::Desc) => rows.range((
                Bound::Unbounded,
                Bound::Excluded((
                    cursor.block_number,
                    cursor.log_index,
                    String::new(),
                )),
            )),
            (None, _) => rows.range::<RowKey, _>(..),
        };

        let iter: Box<dyn Iterator<Item = &Entity>> = match filter.order {
            Order::Asc => Box::new(range.map(|(_, entity)| entity)),
            Order::Desc => Box::new(range.rev().map(|(_, entity)| entity)),
        };

        let limit = filter
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(0))
            .unwrap_or(usize::MAX);

        Ok(iter
            .filter(|entity| match &filter.cursor {
                Some(cursor) => cursor.admits(entity.position(), filter.order),
                None => true,
            })
            .filter(|entity| filter.matches(entity))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn checkpoint(&self) -> Result<Option<i64>, Error> {
        Ok(self.read()?.checkpoint)
    }

    async fn save_checkpoint(&self, block_number: i64) -> Result<(), Error> {
        let mut tables = self.write()?;
        if tables.checkpoint.map_or(true, |current| block_number > current) {
            tables.checkpoint = Some(block_number);
        }
        Ok(())
    }

    async fn set_checkpoint(&self, block_number: i64) -> Result<(), Error> {
        self.write()?.checkpoint = Some(block_number);
        Ok(())
    }

    async fn health(&self) -> Result<(), Error> {
        self.read().map(drop)
    }
}
