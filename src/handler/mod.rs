//! Event handlers
//!
//! One module per stored event kind. Each handler is a pure translation of
//! a decoded log into the row it produces; `map_event` is the dispatch
//! table the ingestor runs every log through.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::{
    error::Error, helpers::EventsType, model::Entity, types::Chain_Event,
};

pub mod basic_token_sender_added;
pub mod borrow_debt;
pub mod borrow_debt_crosschain;
pub mod create_position;
pub mod lending_pool_created;
pub mod repay_with_collateral;
pub mod supply_collateral;
pub mod supply_liquidity;
pub mod token_data_stream_added;
pub mod withdraw_liquidity;

/// Maps one log to the row it produces. `Ok(None)` marks an
/// informational event.
pub fn map_event(event: &Chain_Event) -> Result<Option<Entity>, Error> {
    let kind = EventsType::from_str(&event.name)
        .map_err(|_| Error::UnsupportedEvent(event.name.to_owned()))?;

    let entity = match kind {
        EventsType::LendingPoolCreated => lending_pool_created::parse(event)?,
        EventsType::BasicTokenSenderAdded => {
            basic_token_sender_added::parse(event)?
        },
        EventsType::TokenDataStreamAdded => {
            token_data_stream_added::parse(event)?
        },
        EventsType::CreatePosition => create_position::parse(event)?,
        EventsType::SupplyLiquidity => supply_liquidity::parse(event)?,
        EventsType::WithdrawLiquidity => withdraw_liquidity::parse(event)?,
        EventsType::SupplyCollateral => supply_collateral::parse(event)?,
        EventsType::BorrowDebt => borrow_debt::parse(event)?,
        EventsType::BorrowDebtCrosschain => {
            borrow_debt_crosschain::parse(event)?
        },
        EventsType::RepayWithCollateralByPosition => {
            repay_with_collateral::parse(event)?
        },
        EventsType::Liquidate
        | EventsType::SwapToken
        | EventsType::SwapTokenByPosition
        | EventsType::WithdrawCollateral => return Ok(None),
    };

    Ok(Some(entity))
}

pub(crate) fn block_time(event: &Chain_Event) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(event.block_timestamp, 0).ok_or_else(|| {
        Error::DecodeDateTimeError(format!(
            "{} block timestamp {}",
            event.name, event.block_timestamp
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{custom_uint::Amount, model::EntityType};

    fn supply(amount: &str) -> Chain_Event {
        Chain_Event::new("SupplyLiquidity", "0xPool", 101, 1_700_000_101, "0xh1", 0)
            .with_arg("user", "0xU1")
            .with_arg("amount", amount)
            .with_arg("shares", "1000")
    }

    #[test]
    fn maps_pool_creation() {
        let event = Chain_Event::new(
            "LendingPoolCreated",
            "0xFactory",
            100,
            1_700_000_100,
            "0xh0",
            3,
        )
        .with_arg("collateralToken", "0xT1")
        .with_arg("borrowToken", "0xT2")
        .with_arg("lendingPool", "0xP1")
        .with_arg("ltv", "7000");

        let entity = map_event(&event).unwrap().unwrap();
        match entity {
            Entity::Lending_Pool(pool) => {
                assert_eq!(pool.id, "0xP1");
                assert_eq!(pool.collateral_token, "0xT1");
                assert_eq!(pool.borrow_token, "0xT2");
                assert_eq!(pool.ltv, Amount::from(7000_u64));
                assert_eq!(pool.block_number, 100);
                assert_eq!(pool.log_index, 3);
                assert_eq!(pool.created_at.timestamp(), 1_700_000_100);
            },
            other => panic!("unexpected entity {:?}", other),
        }
    }

    #[test]
    fn pool_events_take_the_emitter_as_pool() {
        let entity = map_event(&supply("1000")).unwrap().unwrap();
        assert_eq!(entity.entity_type(), EntityType::Liquidity_Supply);
        assert_eq!(entity.id(), "0xh1-0");
        assert_eq!(entity.pool_address(), Some("0xPool"));
        assert_eq!(entity.amount(), Some(&Amount::from(1000_u64)));
    }

    #[test]
    fn informational_events_produce_nothing() {
        for name in
            ["Liquidate", "SwapToken", "SwapTokenByPosition", "WithdrawCollateral"]
        {
            let event = Chain_Event::new(name, "0xPos", 5, 1, "0xh", 0)
                .with_arg("user", "0xU1");
            assert_eq!(map_event(&event).unwrap(), None);
        }
    }

    #[test]
    fn malformed_payloads_are_mapping_errors() {
        let err = map_event(&supply("12.5")).unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
        assert!(err.is_mapping());

        let missing = Chain_Event::new("BorrowDebt", "0xPool", 5, 1, "0xh", 0)
            .with_arg("user", "0xU1");
        assert!(matches!(
            map_event(&missing).unwrap_err(),
            Error::FieldNotExist(_)
        ));

        let unknown = Chain_Event::new("Transfer", "0xPool", 5, 1, "0xh", 0);
        let err = map_event(&unknown).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEvent(_)));
        assert!(err.is_mapping());
    }

    #[test]
    fn mapping_is_deterministic() {
        let event = supply("340282366920938463463374607431768211457");
        assert_eq!(map_event(&event).unwrap(), map_event(&event).unwrap());
    }
}
