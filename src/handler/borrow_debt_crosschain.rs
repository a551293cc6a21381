use std::str::FromStr;

use crate::{
    custom_uint::Amount,
    error::Error,
    helpers::{composite_id, parse_borrow_crosschain},
    model::{Borrow_Debt_Crosschain, Entity},
    types::Chain_Event,
};

use super::block_time;

pub fn parse(event: &Chain_Event) -> Result<Entity, Error> {
    let item = parse_borrow_crosschain(&event.args)?;

    let borrow = Borrow_Debt_Crosschain {
        id: composite_id(&event.transaction_hash, event.log_index),
        user: item.user,
        pool_address: event.contract.to_owned(),
        amount: Amount::from_str(&item.amount)?,
        shares: Amount::from_str(&item.shares)?,
        chain_id: Amount::from_str(&item.chain_id)?,
        bridge_token_sender: item.bridge_token_sender,
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.to_owned(),
        timestamp: block_time(event)?,
    };

    Ok(Entity::Borrow_Debt_Crosschain(borrow))
}
