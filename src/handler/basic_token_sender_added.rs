use std::str::FromStr;

use crate::{
    custom_uint::Amount,
    error::Error,
    helpers::{composite_id, parse_basic_token_sender_added},
    model::{Basic_Token_Sender, Entity},
    types::Chain_Event,
};

pub fn parse(event: &Chain_Event) -> Result<Entity, Error> {
    let item = parse_basic_token_sender_added(&event.args)?;

    let basic_token_sender = Basic_Token_Sender {
        id: composite_id(&item.chain_id, &item.basic_token_sender),
        chain_id: Amount::from_str(&item.chain_id)?,
        basic_token_sender: item.basic_token_sender,
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.to_owned(),
    };

    Ok(Entity::Basic_Token_Sender(basic_token_sender))
}
