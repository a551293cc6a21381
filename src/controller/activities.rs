use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use super::ok;
use crate::{
    configuration::{AppState, State},
    error::Error,
    query::PageQuery,
};

#[derive(Debug, Deserialize)]
pub struct Query {
    r#type: Option<String>,
    limit: Option<i64>,
    cursor: Option<String>,
}

#[get("/activities")]
pub async fn index(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    let page = PageQuery::new(data.limit, data.cursor.as_deref());
    let data = state.query.activities(data.r#type.as_deref(), &page).await?;
    Ok(ok(data))
}
