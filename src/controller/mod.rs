//! REST handlers mounted under `/api`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::Error;

pub mod activities;
pub mod health;
pub mod lists;
pub mod pools;
pub mod positions;
pub mod stats;
pub mod tokens;
pub mod users;

#[derive(Debug, Serialize)]
pub struct Response<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Response {
        success: true,
        data,
    })
}

/// Malformed query strings become `400` failure envelopes.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _| {
        Error::InvalidOption {
            option: err.to_string(),
        }
        .into()
    })
}

pub async fn not_found(request: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "success": false,
        "error": "Not found",
        "message": format!(
            "The requested endpoint {} does not exist",
            request.path()
        ),
    }))
}
