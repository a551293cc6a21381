use std::{fmt, io, str::FromStr};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{
    Basic_Token_Sender, Borrow_Debt, Borrow_Debt_Crosschain,
    Collateral_Supply, Lending_Pool, Liquidity_Supply, Liquidity_Withdraw,
    Position, Price_Data_Stream, Repay_With_Collateral,
};
use crate::custom_uint::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityType {
    Lending_Pool,
    Position,
    Liquidity_Supply,
    Liquidity_Withdraw,
    Collateral_Supply,
    Borrow_Debt,
    Borrow_Debt_Crosschain,
    Repay_With_Collateral,
    Price_Data_Stream,
    Basic_Token_Sender,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::Lending_Pool,
        EntityType::Position,
        EntityType::Liquidity_Supply,
        EntityType::Liquidity_Withdraw,
        EntityType::Collateral_Supply,
        EntityType::Borrow_Debt,
        EntityType::Borrow_Debt_Crosschain,
        EntityType::Repay_With_Collateral,
        EntityType::Price_Data_Stream,
        EntityType::Basic_Token_Sender,
    ];

    /// Entity types that show up in activity feeds.
    pub const ACTIVITIES: [EntityType; 6] = [
        EntityType::Liquidity_Supply,
        EntityType::Liquidity_Withdraw,
        EntityType::Collateral_Supply,
        EntityType::Borrow_Debt,
        EntityType::Borrow_Debt_Crosschain,
        EntityType::Repay_With_Collateral,
    ];

    pub fn is_activity(&self) -> bool {
        Self::ACTIVITIES.contains(self)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntityType::Lending_Pool => write!(f, "lending_pool"),
            EntityType::Position => write!(f, "position"),
            EntityType::Liquidity_Supply => write!(f, "liquidity_supply"),
            EntityType::Liquidity_Withdraw => write!(f, "liquidity_withdraw"),
            EntityType::Collateral_Supply => write!(f, "collateral_supply"),
            EntityType::Borrow_Debt => write!(f, "borrow_debt"),
            EntityType::Borrow_Debt_Crosschain => {
                write!(f, "borrow_debt_crosschain")
            },
            EntityType::Repay_With_Collateral => {
                write!(f, "repay_with_collateral")
            },
            EntityType::Price_Data_Stream => write!(f, "price_data_stream"),
            EntityType::Basic_Token_Sender => write!(f, "basic_token_sender"),
        }
    }
}

impl FromStr for EntityType {
    type Err = io::Error;

    fn from_str(value: &str) -> Result<EntityType, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|item| item.to_string() == value)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Entity type not supported: {}", value),
                )
            })
    }
}

/// A stored row of any entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Lending_Pool(Lending_Pool),
    Position(Position),
    Liquidity_Supply(Liquidity_Supply),
    Liquidity_Withdraw(Liquidity_Withdraw),
    Collateral_Supply(Collateral_Supply),
    Borrow_Debt(Borrow_Debt),
    Borrow_Debt_Crosschain(Borrow_Debt_Crosschain),
    Repay_With_Collateral(Repay_With_Collateral),
    Price_Data_Stream(Price_Data_Stream),
    Basic_Token_Sender(Basic_Token_Sender),
}

macro_rules! with_row {
    ($entity:expr, $row:ident => $body:expr) => {
        match $entity {
            Entity::Lending_Pool($row) => $body,
            Entity::Position($row) => $body,
            Entity::Liquidity_Supply($row) => $body,
            Entity::Liquidity_Withdraw($row) => $body,
            Entity::Collateral_Supply($row) => $body,
            Entity::Borrow_Debt($row) => $body,
            Entity::Borrow_Debt_Crosschain($row) => $body,
            Entity::Repay_With_Collateral($row) => $body,
            Entity::Price_Data_Stream($row) => $body,
            Entity::Basic_Token_Sender($row) => $body,
        }
    };
}

impl Entity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Entity::Lending_Pool(_) => EntityType::Lending_Pool,
            Entity::Position(_) => EntityType::Position,
            Entity::Liquidity_Supply(_) => EntityType::Liquidity_Supply,
            Entity::Liquidity_Withdraw(_) => EntityType::Liquidity_Withdraw,
            Entity::Collateral_Supply(_) => EntityType::Collateral_Supply,
            Entity::Borrow_Debt(_) => EntityType::Borrow_Debt,
            Entity::Borrow_Debt_Crosschain(_) => {
                EntityType::Borrow_Debt_Crosschain
            },
            Entity::Repay_With_Collateral(_) => {
                EntityType::Repay_With_Collateral
            },
            Entity::Price_Data_Stream(_) => EntityType::Price_Data_Stream,
            Entity::Basic_Token_Sender(_) => EntityType::Basic_Token_Sender,
        }
    }

    pub fn id(&self) -> &str {
        with_row!(self, row => row.id.as_str())
    }

    pub fn block_number(&self) -> i64 {
        with_row!(self, row => row.block_number)
    }

    pub fn log_index(&self) -> i32 {
        with_row!(self, row => row.log_index)
    }

    pub fn transaction_hash(&self) -> &str {
        with_row!(self, row => row.transaction_hash.as_str())
    }

    /// Chain position, the ordering key of every scan.
    pub fn position(&self) -> (i64, i32) {
        (self.block_number(), self.log_index())
    }

    pub fn user(&self) -> Option<&str> {
        match self {
            Entity::Position(row) => Some(&row.user),
            Entity::Liquidity_Supply(row) => Some(&row.user),
            Entity::Liquidity_Withdraw(row) => Some(&row.user),
            Entity::Collateral_Supply(row) => Some(&row.user),
            Entity::Borrow_Debt(row) => Some(&row.user),
            Entity::Borrow_Debt_Crosschain(row) => Some(&row.user),
            Entity::Repay_With_Collateral(row) => Some(&row.user),
            Entity::Lending_Pool(_)
            | Entity::Price_Data_Stream(_)
            | Entity::Basic_Token_Sender(_) => None,
        }
    }

    /// Pool the row belongs to; a pool row belongs to itself.
    pub fn pool_address(&self) -> Option<&str> {
        match self {
            Entity::Lending_Pool(row) => Some(&row.id),
            Entity::Position(row) => Some(&row.pool_address),
            Entity::Liquidity_Supply(row) => Some(&row.pool_address),
            Entity::Liquidity_Withdraw(row) => Some(&row.pool_address),
            Entity::Collateral_Supply(row) => Some(&row.pool_address),
            Entity::Borrow_Debt(row) => Some(&row.pool_address),
            Entity::Borrow_Debt_Crosschain(row) => Some(&row.pool_address),
            Entity::Repay_With_Collateral(row) => Some(&row.pool_address),
            Entity::Price_Data_Stream(_) | Entity::Basic_Token_Sender(_) => {
                None
            },
        }
    }

    pub fn amount(&self) -> Option<&Amount> {
        match self {
            Entity::Liquidity_Supply(row) => Some(&row.amount),
            Entity::Liquidity_Withdraw(row) => Some(&row.amount),
            Entity::Collateral_Supply(row) => Some(&row.amount),
            Entity::Borrow_Debt(row) => Some(&row.amount),
            Entity::Borrow_Debt_Crosschain(row) => Some(&row.amount),
            Entity::Repay_With_Collateral(row) => Some(&row.amount),
            Entity::Lending_Pool(_)
            | Entity::Position(_)
            | Entity::Price_Data_Stream(_)
            | Entity::Basic_Token_Sender(_) => None,
        }
    }

    pub fn shares(&self) -> Option<&Amount> {
        match self {
            Entity::Liquidity_Supply(row) => Some(&row.shares),
            Entity::Liquidity_Withdraw(row) => Some(&row.shares),
            Entity::Borrow_Debt(row) => Some(&row.shares),
            Entity::Borrow_Debt_Crosschain(row) => Some(&row.shares),
            Entity::Repay_With_Collateral(row) => Some(&row.shares),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Entity::Lending_Pool(row) => Some(row.created_at),
            Entity::Position(row) => Some(row.timestamp),
            Entity::Liquidity_Supply(row) => Some(row.timestamp),
            Entity::Liquidity_Withdraw(row) => Some(row.timestamp),
            Entity::Collateral_Supply(row) => Some(row.timestamp),
            Entity::Borrow_Debt(row) => Some(row.timestamp),
            Entity::Borrow_Debt_Crosschain(row) => Some(row.timestamp),
            Entity::Repay_With_Collateral(row) => Some(row.timestamp),
            Entity::Price_Data_Stream(_) | Entity::Basic_Token_Sender(_) => {
                None
            },
        }
    }
}
