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
    user: Option<String>,
    pool: Option<String>,
    limit: Option<i64>,
    cursor: Option<String>,
}

#[get("/positions")]
pub async fn index(
    state: web::Data<AppState<State>>,
    data: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    let page = PageQuery::new(data.limit, data.cursor.as_deref());
    let data = state
        .query
        .positions(data.user.as_deref(), data.pool.as_deref(), &page)
        .await?;
    Ok(ok(data))
}

#[get("/positions/{address}")]
pub async fn detail(
    state: web::Data<AppState<State>>,
    address: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let data = state.query.position(&address).await?;
    Ok(ok(data))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use chrono::DateTime;

    use super::*;
    use crate::{
        controller::testing,
        model::{Entity, Position},
    };

    fn position(user: &str, pool: &str, block: i64) -> Entity {
        Entity::Position(Position {
            id: format!("0xpos{}", block),
            user: user.to_owned(),
            position_address: format!("0xpos{}", block),
            pool_address: pool.to_owned(),
            block_number: block,
            log_index: 0,
            transaction_hash: format!("0xp{}", block),
            timestamp: DateTime::from_timestamp(1_700_000_000 + block, 0)
                .unwrap(),
        })
    }

    #[actix_web::test]
    async fn filters_by_user_and_pool() {
        let state = testing::state(&[
            position("0xU1", "0xP1", 1),
            position("0xU1", "0xP2", 2),
            position("0xU2", "0xP1", 3),
        ])
        .await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(index),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/positions?user=0xu1&pool=0xp1")
            .to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        let items = &body["data"]["items"];

        assert_eq!(items.as_array().map(Vec::len), Some(1));
        assert_eq!(items[0]["positionAddress"], "0xpos1");
        assert_eq!(items[0]["pool"], serde_json::Value::Null);
    }

    #[actix_web::test]
    async fn detail_returns_one_position() {
        let state = testing::state(&[position("0xU1", "0xP1", 1)]).await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(detail),
        )
        .await;

        let request = test::TestRequest::get()
            .uri("/positions/0xPOS1")
            .to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user"], "0xU1");

        let request = test::TestRequest::get()
            .uri("/positions/0xpos9")
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 404);
    }
}
