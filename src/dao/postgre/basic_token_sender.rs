use sqlx::Error;

use crate::model::{Basic_Token_Sender, Stored, Table};

impl Stored for Basic_Token_Sender {
    const TABLE: &'static str = "Basic_Token_Sender";
}

impl Table<Basic_Token_Sender> {
    pub async fn insert(
        &self,
        data: &Basic_Token_Sender,
    ) -> Result<bool, Error> {
        const SQL: &str = r#"
        INSERT INTO "Basic_Token_Sender" (
            "id",
            "chain_id",
            "basic_token_sender",
            "block_number",
            "log_index",
            "transaction_hash"
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT ((lower("id"))) DO NOTHING
        "#;

        sqlx::query(SQL)
            .bind(&data.id)
            .bind(&data.chain_id)
            .bind(&data.basic_token_sender)
            .bind(data.block_number)
            .bind(data.log_index)
            .bind(&data.transaction_hash)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
    }
}
