use sqlx::Error;

use crate::model::{Price_Data_Stream, Stored, Table};

impl Stored for Price_Data_Stream {
    const TABLE: &'static str = "Price_Data_Stream";
}

impl Table<Price_Data_Stream> {
    pub async fn insert(
        &self,
        data: &Price_Data_Stream,
    ) -> Result<bool, Error> {
        const SQL: &str = r#"
        INSERT INTO "Price_Data_Stream" (
            "id",
            "token",
            "data_stream",
            "block_number",
            "log_index",
            "transaction_hash"
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT ((lower("id"))) DO NOTHING
        "#;

        sqlx::query(SQL)
            .bind(&data.id)
            .bind(&data.token)
            .bind(&data.data_stream)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
    }

    /// Re-registering a stream replaces its block metadata.
    pub async fn upsert(&self, data: &Price_Data_Stream) -> Result<(), Error> {
        const SQL: &str = r#"
        INSERT INTO "Price_Data_Stream" (
            "id",
            "token",
            "data_stream",
            "block_number",
            "log_index",
            "transaction_hash"
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT ((lower("id"))) DO UPDATE SET
            "id" = EXCLUDED."id",
            "token" = EXCLUDED."token",
            "data_stream" = EXCLUDED."data_stream",
            "block_number" = EXCLUDED."block_number",
            "log_index" = EXCLUDED."log_index",
            "transaction_hash" = EXCLUDED."transaction_hash"
        "#;

        sqlx::query(SQL)
            .bind(&data.id)
            .bind(&data.token)
            .bind(&data.data_stream)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .execute(&self.pool)
            .await
            .map(drop)
    }
}
