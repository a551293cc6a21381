use std::str::FromStr;

use crate::{
    custom_uint::Amount,
    error::Error,
    helpers::{composite_id, parse_pool_flow},
    model::{Entity, Repay_With_Collateral},
    types::Chain_Event,
};

use super::block_time;

pub fn parse(event: &Chain_Event) -> Result<Entity, Error> {
    let item = parse_pool_flow(&event.args, true)?;
    let shares = item.shares.unwrap_or_default();

    let repay = Repay_With_Collateral {
        id: composite_id(&event.transaction_hash, event.log_index),
        user: item.user,
        pool_address: event.contract.to_owned(),
        amount: Amount::from_str(&item.amount)?,
        shares: Amount::from_str(&shares)?,
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.to_owned(),
        timestamp: block_time(event)?,
    };

    Ok(Entity::Repay_With_Collateral(repay))
}
