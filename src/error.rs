use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sqlx::error::Error as SQL_ERROR;
use std::{
    io::Error as IO_ERROR, num::ParseIntError,
    str::ParseBoolError as PARSE_BOOL_ERROR,
};
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tracing::subscriber::SetGlobalDefaultError as TRACING_GLOBAL_DEFAULT_ERROR;
use url::ParseError as URL_ERROR;

use crate::custom_uint::ParseAmountError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] IO_ERROR),

    #[error("{0}")]
    URL(#[from] URL_ERROR),

    #[error("{0}")]
    INT(#[from] ParseIntError),

    #[error("{0}")]
    SQL(#[from] SQL_ERROR),

    #[error("{0}")]
    TokioJoinError(#[from] JoinError),

    #[error("{0}")]
    TokioElapsedError(#[from] Elapsed),

    #[error("{0}")]
    ParseBoolError(#[from] PARSE_BOOL_ERROR),

    #[error("Tracing error: {0}")]
    SetGlobalDefaultError(#[from] TRACING_GLOBAL_DEFAULT_ERROR),

    #[error("Field not exists: {0}")]
    FieldNotExist(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] ParseAmountError),

    #[error("Decode DateTime error: {0}")]
    DecodeDateTimeError(String),

    #[error("Event not supported: {0}")]
    UnsupportedEvent(String),

    #[error("Feed error: {0}")]
    FeedError(String),

    #[error("Feed out of order: {0}")]
    FeedOrder(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid option {option}")]
    InvalidOption { option: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Upstream failures worth retrying against the same or the next endpoint.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::FeedError(_)
                | Error::TokioElapsedError(_)
                | Error::Io(_)
        )
    }

    /// Malformed payloads that the ingestor skips instead of stopping.
    pub fn is_mapping(&self) -> bool {
        matches!(
            self,
            Error::FieldNotExist(_)
                | Error::InvalidAmount(_)
                | Error::DecodeDateTimeError(_)
                | Error::UnsupportedEvent(_)
                | Error::INT(_)
        )
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request - client sent invalid input
            Error::InvalidOption { .. }
            | Error::FieldNotExist(_)
            | Error::InvalidAmount(_)
            | Error::DecodeDateTimeError(_)
            | Error::ParseBoolError(_)
            | Error::INT(_) => StatusCode::BAD_REQUEST,

            Error::NotFound(_) => StatusCode::NOT_FOUND,

            // 502 Bad Gateway - upstream service error
            Error::FeedError(_) | Error::FeedOrder(_) => {
                StatusCode::BAD_GATEWAY
            },

            Error::TokioElapsedError(_) => StatusCode::GATEWAY_TIMEOUT,

            Error::StoreError(_) | Error::SQL(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            },

            Error::Io(_)
            | Error::URL(_)
            | Error::TokioJoinError(_)
            | Error::SetGlobalDefaultError(_)
            | Error::UnsupportedEvent(_)
            | Error::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = serde_json::json!({
            "success": false,
            "error": status.canonical_reason().unwrap_or("Unknown"),
            "message": self.to_string(),
        });
        HttpResponse::build(status).json(body)
    }
}
