//! Per-type activity lists, ascending by chain position.

use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use super::ok;
use crate::{
    configuration::{AppState, State},
    error::Error,
    model::EntityType,
    query::PageQuery,
};

#[derive(Debug, Deserialize)]
pub struct Query {
    user: Option<String>,
    pool: Option<String>,
    limit: Option<i64>,
    cursor: Option<String>,
}

async fn list(
    state: &State,
    entity_type: EntityType,
    data: &Query,
) -> Result<HttpResponse, Error> {
    let page = PageQuery::new(data.limit, data.cursor.as_deref());
    let data = state
        .query
        .list(entity_type, data.user.as_deref(), data.pool.as_deref(), &page)
        .await?;
    Ok(ok(data))
}

#[get("/liquidity-supplies")]
pub async fn liquidity_supplies(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    list(&state, EntityType::Liquidity_Supply, &data).await
}

#[get("/liquidity-withdrawals")]
pub async fn liquidity_withdrawals(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    list(&state, EntityType::Liquidity_Withdraw, &data).await
}

#[get("/collateral-supplies")]
pub async fn collateral_supplies(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    list(&state, EntityType::Collateral_Supply, &data).await
}

#[get("/borrow-debts")]
pub async fn borrow_debts(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    list(&state, EntityType::Borrow_Debt, &data).await
}

#[get("/borrow-debts-crosschain")]
pub async fn borrow_debts_crosschain(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    list(&state, EntityType::Borrow_Debt_Crosschain, &data).await
}

#[get("/repay-with-collaterals")]
pub async fn repay_with_collaterals(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    list(&state, EntityType::Repay_With_Collateral, &data).await
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use chrono::DateTime;

    use super::*;
    use crate::{
        controller::testing,
        custom_uint::Amount,
        model::{Borrow_Debt_Crosschain, Entity},
    };

    fn crosschain(block: i64) -> Entity {
        Entity::Borrow_Debt_Crosschain(Borrow_Debt_Crosschain {
            id: format!("0xx{}-3", block),
            user: String::from("0xU1"),
            pool_address: String::from("0xP1"),
            amount: Amount::from(40_u64),
            shares: Amount::from(40_u64),
            chain_id: Amount::from(43113_u64),
            bridge_token_sender: String::from("0xBridge"),
            block_number: block,
            log_index: 3,
            transaction_hash: format!("0xx{}", block),
            timestamp: DateTime::from_timestamp(1_700_000_000 + block, 0)
                .unwrap(),
        })
    }

    #[actix_web::test]
    async fn lists_ascending_with_cursor() {
        let state =
            testing::state(&[crosschain(7), crosschain(5), crosschain(6)]).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(borrow_debts_crosschain)
                .service(borrow_debts),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/borrow-debts-crosschain?limit=2")
            .to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["data"]["items"][0]["id"], "0xx5-3");
        assert_eq!(body["data"]["items"][1]["chainId"], "43113");
        assert_eq!(body["data"]["nextCursor"], "6-3");

        let request = test::TestRequest::get()
            .uri("/borrow-debts-crosschain?cursor=6-3&pool=0xp1")
            .to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["data"]["items"][0]["id"], "0xx7-3");
        assert_eq!(body["data"]["nextCursor"], serde_json::Value::Null);

        let request = test::TestRequest::get().uri("/borrow-debts").to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["data"]["items"], serde_json::json!([]));
    }
}
