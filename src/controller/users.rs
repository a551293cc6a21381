use actix_web::{get, web, HttpResponse};

use super::ok;
use crate::{
    configuration::{AppState, State},
    error::Error,
};

#[get("/users")]
pub async fn index(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data = state.query.users().await?;
    Ok(ok(data))
}

#[get("/users/{address}")]
pub async fn detail(
    state: web::Data<AppState<State>>,
    address: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let data = state.query.user(&address).await?;
    Ok(ok(data))
}

#[get("/users/{address}/summary")]
pub async fn summary(
    state: web::Data<AppState<State>>,
    address: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let data = state.query.user_summary(&address).await?;
    Ok(ok(data))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use chrono::DateTime;

    use super::*;
    use crate::{
        controller::testing,
        custom_uint::Amount,
        model::{Collateral_Supply, Entity},
    };

    fn collateral(user: &str, block: i64, amount: u64) -> Entity {
        Entity::Collateral_Supply(Collateral_Supply {
            id: format!("0xc{}-0", block),
            user: user.to_owned(),
            pool_address: String::from("0xP1"),
            amount: Amount::from(amount),
            block_number: block,
            log_index: 0,
            transaction_hash: format!("0xc{}", block),
            timestamp: DateTime::from_timestamp(1_700_000_000 + block, 0)
                .unwrap(),
        })
    }

    #[actix_web::test]
    async fn summary_matches_any_case() {
        let state = testing::state(&[
            collateral("0xAbC", 1, u64::MAX),
            collateral("0xabc", 2, 1),
        ])
        .await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(index)
                .service(summary)
                .service(detail),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/users/0xABC/summary")
            .to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(
            body["data"]["totalCollateralSupplied"],
            "18446744073709551616"
        );
        assert_eq!(body["data"]["totalTransactions"], 2);

        let request = test::TestRequest::get().uri("/users/0xabc").to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["data"]["activities"][0]["id"], "0xc2-0");
        assert_eq!(body["data"]["positions"], serde_json::json!([]));

        let request = test::TestRequest::get().uri("/users").to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    }
}
