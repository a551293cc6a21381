use std::str::FromStr;

use crate::{
    custom_uint::Amount,
    error::Error,
    helpers::parse_lending_pool_created,
    model::{Entity, Lending_Pool},
    types::Chain_Event,
};

use super::block_time;

pub fn parse(event: &Chain_Event) -> Result<Entity, Error> {
    let item = parse_lending_pool_created(&event.args)?;

    let lending_pool = Lending_Pool {
        id: item.lending_pool,
        collateral_token: item.collateral_token,
        borrow_token: item.borrow_token,
        ltv: Amount::from_str(&item.ltv)?,
        created_at: block_time(event)?,
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.to_owned(),
    };

    Ok(Entity::Lending_Pool(lending_pool))
}
