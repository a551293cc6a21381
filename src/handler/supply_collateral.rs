use std::str::FromStr;

use crate::{
    custom_uint::Amount,
    error::Error,
    helpers::{composite_id, parse_pool_flow},
    model::{Collateral_Supply, Entity},
    types::Chain_Event,
};

use super::block_time;

pub fn parse(event: &Chain_Event) -> Result<Entity, Error> {
    let item = parse_pool_flow(&event.args, false)?;

    let collateral_supply = Collateral_Supply {
        id: composite_id(&event.transaction_hash, event.log_index),
        user: item.user,
        pool_address: event.contract.to_owned(),
        amount: Amount::from_str(&item.amount)?,
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.to_owned(),
        timestamp: block_time(event)?,
    };

    Ok(Entity::Collateral_Supply(collateral_supply))
}
