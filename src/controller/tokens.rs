use actix_web::{get, web, HttpResponse};

use super::ok;
use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/tokens")]
pub async fn index(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data = state.query.tokens().await?;
    Ok(ok(data))
}

#[get("/tokens/{token}/data-stream")]
pub async fn data_stream(
    state: web::Data<AppState<State>>,
    token: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let data = state.query.token_data_stream(&token).await?;
    Ok(ok(data))
}
