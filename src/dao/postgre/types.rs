use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres,
};

pub type PoolType = PgPool;
pub type PoolOption = PgPoolOptions;
pub type DBRow = PgRow;
pub type DataBase = Postgres;
