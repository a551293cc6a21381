use sqlx::Error;

use crate::model::{Borrow_Debt_Crosschain, Stored, Table};

impl Stored for Borrow_Debt_Crosschain {
    const TABLE: &'static str = "Borrow_Debt_Crosschain";
    const USER_COLUMN: Option<&'static str> = Some("user");
    const POOL_COLUMN: Option<&'static str> = Some("pool_address");
}

impl Table<Borrow_Debt_Crosschain> {
    pub async fn insert(
        &self,
        data: &Borrow_Debt_Crosschain,
    ) -> Result<bool, Error> {
        const SQL: &str = r#"
        INSERT INTO "Borrow_Debt_Crosschain" (
            "id",
            "user",
            "pool_address",
            "amount",
            "shares",
            "chain_id",
            "bridge_token_sender",
            "block_number",
            "log_index",
            "transaction_hash",
            "timestamp"
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT ((lower("id"))) DO NOTHING
        "#;

        sqlx::query(SQL)
            .bind(&data.id)
            .bind(&data.user)
            .bind(&data.pool_address)
            .bind(&data.amount)
            .bind(&data.shares)
            .bind(&data.chain_id)
            .bind(&data.bridge_token_sender)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .bind(data.timestamp)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
    }
}
