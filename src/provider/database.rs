use async_trait::async_trait;
use tracing::info;

use crate::{
    configuration::Config,
    dao::{
        read_migration, EntityStore, PoolOption, PoolType, ScanFilter,
        MIGRATIONS,
    },
    error::Error,
    model::{
        Basic_Token_Sender, Borrow_Debt, Borrow_Debt_Crosschain, Checkpoint,
        Collateral_Supply, Entity, EntityType, Lending_Pool, Liquidity_Supply,
        Liquidity_Withdraw, Position, Price_Data_Stream,
        Repay_With_Collateral, Table,
    },
};

#[derive(Debug)]
pub struct DatabasePool {
    pub lending_pool: Table<Lending_Pool>,
    pub position: Table<Position>,
    pub liquidity_supply: Table<Liquidity_Supply>,
    pub liquidity_withdraw: Table<Liquidity_Withdraw>,
    pub collateral_supply: Table<Collateral_Supply>,
    pub borrow_debt: Table<Borrow_Debt>,
    pub borrow_debt_crosschain: Table<Borrow_Debt_Crosschain>,
    pub repay_with_collateral: Table<Repay_With_Collateral>,
    pub price_data_stream: Table<Price_Data_Stream>,
    pub basic_token_sender: Table<Basic_Token_Sender>,
    pub checkpoint: Table<Checkpoint>,
    pub pool: PoolType,
}

impl DatabasePool {
    pub async fn new(config: &Config) -> Result<DatabasePool, Error> {
        let database_url = config.database_url.as_deref().ok_or_else(|| {
            Error::ConfigurationError(String::from(
                "DATABASE_URL is required for the postgres backend",
            ))
        })?;

        let pool = PoolOption::new()
            .max_connections(config.max_connections)
            .connect(database_url)
            .await?;

        Ok(DatabasePool {
            pool: pool.clone(),
            lending_pool: Table::new(pool.clone()),
            position: Table::new(pool.clone()),
            liquidity_supply: Table::new(pool.clone()),
            liquidity_withdraw: Table::new(pool.clone()),
            collateral_supply: Table::new(pool.clone()),
            borrow_debt: Table::new(pool.clone()),
            borrow_debt_crosschain: Table::new(pool.clone()),
            repay_with_collateral: Table::new(pool.clone()),
            price_data_stream: Table::new(pool.clone()),
            basic_token_sender: Table::new(pool.clone()),
            checkpoint: Table::new(pool),
        })
    }

    pub async fn init_migrations(&self) -> Result<(), Error> {
        let dir = env!("CARGO_MANIFEST_DIR");

        for file in MIGRATIONS {
            let data = read_migration(dir, file)?;
            sqlx::raw_sql(data.as_str()).execute(&self.pool).await?;
        }

        info!("Applied {} schema files", MIGRATIONS.len());

        Ok(())
    }

    pub fn get_pool(&self) -> &PoolType {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for DatabasePool {
    async fn insert_if_absent(&self, entity: &Entity) -> Result<bool, Error> {
        let inserted = match entity {
            Entity::Lending_Pool(row) => self.lending_pool.insert(row).await?,
            Entity::Position(row) => self.position.insert(row).await?,
            Entity::Liquidity_Supply(row) => {
                self.liquidity_supply.insert(row).await?
            },
            Entity::Liquidity_Withdraw(row) => {
                self.liquidity_withdraw.insert(row).await?
            },
            Entity::Collateral_Supply(row) => {
                self.collateral_supply.insert(row).await?
            },
            Entity::Borrow_Debt(row) => self.borrow_debt.insert(row).await?,
            Entity::Borrow_Debt_Crosschain(row) => {
                self.borrow_debt_crosschain.insert(row).await?
            },
            Entity::Repay_With_Collateral(row) => {
                self.repay_with_collateral.insert(row).await?
            },
            Entity::Price_Data_Stream(row) => {
                self.price_data_stream.insert(row).await?
            },
            Entity::Basic_Token_Sender(row) => {
                self.basic_token_sender.insert(row).await?
            },
        };

        Ok(inserted)
    }

    async fn upsert(&self, entity: &Entity) -> Result<(), Error> {
        match entity {
            Entity::Price_Data_Stream(row) => {
                self.price_data_stream.upsert(row).await?;
                Ok(())
            },
            other => Err(Error::StoreError(format!(
                "upsert not supported for {}",
                other.entity_type()
            ))),
        }
    }

    async fn get(
        &self,
        entity_type: EntityType,
        id: &str,
    ) -> Result<Option<Entity>, Error> {
        let entity = match entity_type {
            EntityType::Lending_Pool => {
                self.lending_pool.get(id).await?.map(Entity::Lending_Pool)
            },
            EntityType::Position => {
                self.position.get(id).await?.map(Entity::Position)
            },
            EntityType::Liquidity_Supply => self
                .liquidity_supply
                .get(id)
                .await?
                .map(Entity::Liquidity_Supply),
            EntityType::Liquidity_Withdraw => self
                .liquidity_withdraw
                .get(id)
                .await?
                .map(Entity::Liquidity_Withdraw),
            EntityType::Collateral_Supply => self
                .collateral_supply
                .get(id)
                .await?
                .map(Entity::Collateral_Supply),
            EntityType::Borrow_Debt => {
                self.borrow_debt.get(id).await?.map(Entity::Borrow_Debt)
            },
            EntityType::Borrow_Debt_Crosschain => self
                .borrow_debt_crosschain
                .get(id)
                .await?
                .map(Entity::Borrow_Debt_Crosschain),
            EntityType::Repay_With_Collateral => self
                .repay_with_collateral
                .get(id)
                .await?
                .map(Entity::Repay_With_Collateral),
            EntityType::Price_Data_Stream => self
                .price_data_stream
                .get(id)
                .await?
                .map(Entity::Price_Data_Stream),
            EntityType::Basic_Token_Sender => self
                .basic_token_sender
                .get(id)
                .await?
                .map(Entity::Basic_Token_Sender),
        };

        Ok(entity)
    }

    async fn scan(
        &self,
        entity_type: EntityType,
        filter: &ScanFilter,
    ) -> Result<Vec<Entity>, Error> {
        fn wrap<T>(rows: Vec<T>, f: fn(T) -> Entity) -> Vec<Entity> {
            rows.into_iter().map(f).collect()
        }

        let rows = match entity_type {
            EntityType::Lending_Pool => {
                wrap(self.lending_pool.scan(filter).await?, Entity::Lending_Pool)
            },
            EntityType::Position => {
                wrap(self.position.scan(filter).await?, Entity::Position)
            },
            EntityType::Liquidity_Supply => wrap(
                self.liquidity_supply.scan(filter).await?,
                Entity::Liquidity_Supply,
            ),
            EntityType::Liquidity_Withdraw => wrap(
                self.liquidity_withdraw.scan(filter).await?,
                Entity::Liquidity_Withdraw,
            ),
            EntityType::Collateral_Supply => wrap(
                self.collateral_supply.scan(filter).await?,
                Entity::Collateral_Supply,
            ),
            EntityType::Borrow_Debt => {
                wrap(self.borrow_debt.scan(filter).await?, Entity::Borrow_Debt)
            },
            EntityType::Borrow_Debt_Crosschain => wrap(
                self.borrow_debt_crosschain.scan(filter).await?,
                Entity::Borrow_Debt_Crosschain,
            ),
            EntityType::Repay_With_Collateral => wrap(
                self.repay_with_collateral.scan(filter).await?,
                Entity::Repay_With_Collateral,
            ),
            EntityType::Price_Data_Stream => wrap(
                self.price_data_stream.scan(filter).await?,
                Entity::Price_Data_Stream,
            ),
            EntityType::Basic_Token_Sender => wrap(
                self.basic_token_sender.scan(filter).await?,
                Entity::Basic_Token_Sender,
            ),
        };

        Ok(rows)
    }

    async fn checkpoint(&self) -> Result<Option<i64>, Error> {
        Ok(self.checkpoint.get_block().await?)
    }

    async fn save_checkpoint(&self, block_number: i64) -> Result<(), Error> {
        Ok(self.checkpoint.save(block_number).await?)
    }

    async fn set_checkpoint(&self, block_number: i64) -> Result<(), Error> {
        Ok(self.checkpoint.set(block_number).await?)
    }

    async fn health(&self) -> Result<(), Error> {
        Ok(self.checkpoint.ping().await?)
    }
}
