use crate::{
    error::Error,
    helpers::parse_create_position,
    model::{Entity, Position},
    types::Chain_Event,
};

use super::block_time;

pub fn parse(event: &Chain_Event) -> Result<Entity, Error> {
    let item = parse_create_position(&event.args)?;

    let position = Position {
        id: item.position_address.to_owned(),
        user: item.user,
        position_address: item.position_address,
        pool_address: event.contract.to_owned(),
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.to_owned(),
        timestamp: block_time(event)?,
    };

    Ok(Entity::Position(position))
}
