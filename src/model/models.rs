//! Consolidated database models
//!
//! One struct per stored entity. Field names double as column names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::custom_uint::Amount;

// =============================================================================
// FACTORY DOMAIN
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lending_Pool {
    pub id: String,
    pub collateral_token: String,
    pub borrow_token: String,
    pub ltv: Amount,
    pub created_at: DateTime<Utc>,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price_Data_Stream {
    pub id: String,
    pub token: String,
    pub data_stream: String,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basic_Token_Sender {
    pub id: String,
    pub chain_id: Amount,
    pub basic_token_sender: String,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
}

// =============================================================================
// POOL DOMAIN
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    pub user: String,
    pub position_address: String,
    pub pool_address: String,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liquidity_Supply {
    pub id: String,
    pub user: String,
    pub pool_address: String,
    pub amount: Amount,
    pub shares: Amount,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liquidity_Withdraw {
    pub id: String,
    pub user: String,
    pub pool_address: String,
    pub amount: Amount,
    pub shares: Amount,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collateral_Supply {
    pub id: String,
    pub user: String,
    pub pool_address: String,
    pub amount: Amount,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrow_Debt {
    pub id: String,
    pub user: String,
    pub pool_address: String,
    pub amount: Amount,
    pub shares: Amount,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrow_Debt_Crosschain {
    pub id: String,
    pub user: String,
    pub pool_address: String,
    pub amount: Amount,
    pub shares: Amount,
    pub chain_id: Amount,
    pub bridge_token_sender: String,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repay_With_Collateral {
    pub id: String,
    pub user: String,
    pub pool_address: String,
    pub amount: Amount,
    pub shares: Amount,
    pub block_number: i64,
    pub log_index: i32,
    pub transaction_hash: String,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// SYNC STATE
// =============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct Checkpoint {
    pub id: i16,
    pub block_number: i64,
    pub updated_at: DateTime<Utc>,
}
