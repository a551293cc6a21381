use sqlx::Error;

use crate::model::{Collateral_Supply, Stored, Table};

impl Stored for Collateral_Supply {
    const TABLE: &'static str = "Collateral_Supply";
    const USER_COLUMN: Option<&'static str> = Some("user");
    const POOL_COLUMN: Option<&'static str> = Some("pool_address");
}

impl Table<Collateral_Supply> {
    pub async fn insert(
        &self,
        data: &Collateral_Supply,
    ) -> Result<bool, Error> {
        const SQL: &str = r#"
        INSERT INTO "Collateral_Supply" (
            "id",
            "user",
            "pool_address",
            "amount",
            "block_number",
            "log_index",
            "transaction_hash",
            "timestamp"
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT ((lower("id"))) DO NOTHING
        "#;

        sqlx::query(SQL)
            .bind(&data.id)
            .bind(&data.user)
            .bind(&data.pool_address)
            .bind(&data.amount)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .bind(data.timestamp)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
    }
}
