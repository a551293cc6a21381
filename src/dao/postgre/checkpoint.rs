use sqlx::Error;

use crate::model::{Checkpoint, Table};

const CHECKPOINT_ID: i16 = 1;

impl Table<Checkpoint> {
    pub async fn get_block(&self) -> Result<Option<i64>, Error> {
        const SQL: &str = r#"
        SELECT * FROM "Checkpoint" WHERE "id" = $1
        "#;

        sqlx::query_as(SQL)
            .bind(CHECKPOINT_ID)
            .fetch_optional(&self.pool)
            .await
            .map(|row: Option<Checkpoint>| row.map(|item| item.block_number))
    }

    pub async fn save(&self, block_number: i64) -> Result<(), Error> {
        const SQL: &str = r#"
        INSERT INTO "Checkpoint" ("id", "block_number", "updated_at")
        VALUES ($1, $2, now())
        ON CONFLICT ("id") DO UPDATE SET
            "block_number" = GREATEST(
                "Checkpoint"."block_number",
                EXCLUDED."block_number"
            ),
            "updated_at" = now()
        "#;

        sqlx::query(SQL)
            .bind(CHECKPOINT_ID)
            .bind(block_number)
            .execute(&self.pool)
            .await
            .map(drop)
    }

    pub async fn set(&self, block_number: i64) -> Result<(), Error> {
        const SQL: &str = r#"
        INSERT INTO "Checkpoint" ("id", "block_number", "updated_at")
        VALUES ($1, $2, now())
        ON CONFLICT ("id") DO UPDATE SET
            "block_number" = EXCLUDED."block_number",
            "updated_at" = now()
        "#;

        sqlx::query(SQL)
            .bind(CHECKPOINT_ID)
            .bind(block_number)
            .execute(&self.pool)
            .await
            .map(drop)
    }

    pub async fn ping(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(drop)
    }
}
