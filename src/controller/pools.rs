use actix_web::{get, web, HttpResponse};

use super::ok;
use crate::{
    configuration::{AppState, State},
    error::Error,
    query::PageQuery,
};

#[get("/pools")]
pub async fn index(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data = state.query.pools().await?;
    Ok(ok(data))
}

#[get("/pools/{address}")]
pub async fn detail(
    state: web::Data<AppState<State>>,
    address: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let data = state.query.pool(&address).await?;
    Ok(ok(data))
}

#[get("/pools/{address}/activities")]
pub async fn activities(
    state: web::Data<AppState<State>>,
    address: web::Path<String>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let data = state.query.pool_activities(&address, &page).await?;
    Ok(ok(data))
}

#[get("/pools/{address}/positions")]
pub async fn positions(
    state: web::Data<AppState<State>>,
    address: web::Path<String>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse, Error> {
    let data = state.query.pool_positions(&address, &page).await?;
    Ok(ok(data))
}
