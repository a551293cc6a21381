use sqlx::Error;

use crate::model::{Lending_Pool, Stored, Table};

impl Stored for Lending_Pool {
    const TABLE: &'static str = "Lending_Pool";
    const POOL_COLUMN: Option<&'static str> = Some("id");
}

impl Table<Lending_Pool> {
    pub async fn insert(&self, data: &Lending_Pool) -> Result<bool, Error> {
        const SQL: &str = r#"
        INSERT INTO "Lending_Pool" (
            "id",
            "collateral_token",
            "borrow_token",
            "ltv",
            "created_at",
            "block_number",
            "log_index",
            "transaction_hash"
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT ((lower("id"))) DO NOTHING
        "#;

        sqlx::query(SQL)
            .bind(&data.id)
            .bind(&data.collateral_token)
            .bind(&data.borrow_token)
            .bind(&data.ltv)
            .bind(data.created_at)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
    }
}
