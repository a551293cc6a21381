use sqlx::Error;

use crate::model::{Liquidity_Supply, Stored, Table};

impl Stored for Liquidity_Supply {
    const TABLE: &'static str = "Liquidity_Supply";
    const USER_COLUMN: Option<&'static str> = Some("user");
    const POOL_COLUMN: Option<&'static str> = Some("pool_address");
}

impl Table<Liquidity_Supply> {
    pub async fn insert(&self, data: &Liquidity_Supply) -> Result<bool, Error> {
        const SQL: &str = r#"
        INSERT INTO "Liquidity_Supply" (
            "id",
            "user",
            "pool_address",
            "amount",
            "shares",
            "block_number",
            "log_index",
            "transaction_hash",
            "timestamp"
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT ((lower("id"))) DO NOTHING
        "#;

        sqlx::query(SQL)
            .bind(&data.id)
            .bind(&data.user)
            .bind(&data.pool_address)
            .bind(&data.amount)
            .bind(&data.shares)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .bind(data.timestamp)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
    }
}
