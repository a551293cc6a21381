use sqlx::Error;

use crate::model::{Position, Stored, Table};

impl Stored for Position {
    const TABLE: &'static str = "Position";
    const USER_COLUMN: Option<&'static str> = Some("user");
    const POOL_COLUMN: Option<&'static str> = Some("pool_address");
}

impl Table<Position> {
    pub async fn insert(&self, data: &Position) -> Result<bool, Error> {
        const SQL: &str = r#"
        INSERT INTO "Position" (
            "id",
            "user",
            "position_address",
            "pool_address",
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
            .bind(&data.position_address)
            .bind(&data.pool_address)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .bind(data.timestamp)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
    }
}
