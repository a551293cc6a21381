use actix_web::{get, web, HttpResponse};

use super::ok;
use crate::{
    configuration::{AppState, State},
    error::Error,
};

const CACHE_KEY: &str = "global_stats";

#[get("/stats")]
pub async fn index(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    let data = state
        .stats_cache
        .get_or_load(CACHE_KEY, || state.query.stats())
        .await?;
    Ok(ok(data))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};

    use super::*;
    use crate::controller::testing;

    #[actix_web::test]
    async fn empty_store_has_zero_stats() {
        let state = testing::state(&[]).await;
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(index),
        )
        .await;

        let request = test::TestRequest::get().uri("/stats").to_request();
        let body: serde_json::Value =
            test::call_and_read_body_json(&app, request).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["totalPools"], 0);
        assert_eq!(body["data"]["totalLiquidity"], "0");
    }
}
