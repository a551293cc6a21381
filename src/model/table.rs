use std::marker::{self, PhantomData};

use sqlx::{Error, FromRow, QueryBuilder};

use crate::dao::{DBRow, DataBase, Order, PoolType, ScanFilter};

/// Binds a model to its table and the columns scans filter on.
pub trait Stored {
    const TABLE: &'static str;
    const USER_COLUMN: Option<&'static str> = None;
    const POOL_COLUMN: Option<&'static str> = None;
}

#[derive(Debug)]
pub struct Table<T> {
    pub pool: PoolType,
    _phantomdata: marker::PhantomData<T>,
}

impl<T> Table<T> {
    pub fn new(pool: PoolType) -> Self {
        Table {
            pool,
            _phantomdata: PhantomData,
        }
    }
}

impl<T> Table<T>
where
    T: Stored + for<'r> FromRow<'r, DBRow> + Send + Unpin,
{
    pub async fn get(&self, id: &str) -> Result<Option<T>, Error> {
        let sql = format!(
            r#"SELECT * FROM "{}" WHERE lower("id") = lower($1) LIMIT 1"#,
            T::TABLE
        );

        sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await
    }

    /// Filters, cursor and limit are all pushed into the statement.
    pub async fn scan(&self, filter: &ScanFilter) -> Result<Vec<T>, Error> {
        let mut query: QueryBuilder<DataBase> =
            QueryBuilder::new(format!(r#"SELECT * FROM "{}" WHERE TRUE"#, T::TABLE));

        if let Some(user) = &filter.user {
            match T::USER_COLUMN {
                Some(column) => {
                    query
                        .push(format!(r#" AND lower("{}") = lower("#, column))
                        .push_bind(user.to_owned())
                        .push(")");
                },
                None => return Ok(vec![]),
            }
        }

        if let Some(pool_address) = &filter.pool_address {
            match T::POOL_COLUMN {
                Some(column) => {
                    query
                        .push(format!(r#" AND lower("{}") = lower("#, column))
                        .push_bind(pool_address.to_owned())
                        .push(")");
                },
                None => return Ok(vec![]),
            }
        }

        if let Some(cursor) = &filter.cursor {
            let op = match filter.order {
                Order::Asc => ">",
                Order::Desc => "<",
            };
            query
                .push(format!(r#" AND ("block_number", "log_index") {} ("#, op))
                .push_bind(cursor.block_number)
                .push(", ")
                .push_bind(cursor.log_index)
                .push(")");
        }

        let direction = match filter.order {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        };
        query.push(format!(
            r#" ORDER BY "block_number" {0}, "log_index" {0}, "id" {0}"#,
            direction
        ));

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        query.build_query_as().fetch_all(&self.pool).await
    }
}
