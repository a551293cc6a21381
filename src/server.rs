use actix_cors::Cors;
use actix_web::{dev::Server, http::header, middleware, web, App, HttpServer};
use tracing::info;

use crate::{
    configuration::{AppState, State},
    controller::{
        activities, health, lists, not_found, pools, positions, query_config,
        stats, tokens, users,
    },
    error::Error,
};

/// Local front-ends allowed when `ALLOWED_ORIGINS` lists none.
const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:8080",
];

pub fn init_server(app_state: AppState<State>) -> Result<Server, Error> {
    let host = app_state.config.server_host.to_owned();
    let port = app_state.config.port;

    let server = HttpServer::new(move || {
        let app = app_state.clone();
        let allowed_cors = String::from("*");
        let cors_access_all =
            app.config.allowed_origins.contains(&allowed_cors);
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                if cors_access_all {
                    return true;
                }
                let Ok(origin) = origin.to_str() else {
                    return false;
                };
                let allowed = &app.config.allowed_origins;
                if allowed.is_empty() {
                    return DEFAULT_ORIGINS.contains(&origin);
                }
                allowed.iter().any(|item| item == origin)
            })
            .allowed_methods(vec!["GET", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT])
            .allowed_header(header::CONTENT_TYPE);

        App::new()
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .app_data(web::Data::new(app_state.clone()))
            .app_data(query_config())
            .service(
                web::scope("/api")
                    .service(pools::index)
                    .service(pools::detail)
                    .service(pools::activities)
                    .service(pools::positions)
                    .service(users::index)
                    .service(users::detail)
                    .service(users::summary)
                    .service(activities::index)
                    .service(positions::index)
                    .service(positions::detail)
                    .service(lists::liquidity_supplies)
                    .service(lists::liquidity_withdrawals)
                    .service(lists::collateral_supplies)
                    .service(lists::borrow_debts)
                    .service(lists::borrow_debts_crosschain)
                    .service(lists::repay_with_collaterals)
                    .service(tokens::index)
                    .service(tokens::data_stream)
                    .service(stats::index)
                    .service(health::index),
            )
            .default_service(web::to(not_found))
    })
    .bind((host.as_str(), port))?
    .disable_signals()
    .run();

    info!("API listening on {}:{}", host, port);

    Ok(server)
}
