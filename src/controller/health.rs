use actix_web::{get, web, HttpResponse};

use super::ok;
use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/health")]
pub async fn index(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data = state
        .query
        .health(state.config.chain_id, state.endpoint_status())
        .await;
    Ok(ok(data))
}
