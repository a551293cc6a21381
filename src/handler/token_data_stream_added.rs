use crate::{
    error::Error,
    helpers::{composite_id, parse_token_data_stream_added},
    model::{Entity, Price_Data_Stream},
    types::Chain_Event,
};

pub fn parse(event: &Chain_Event) -> Result<Entity, Error> {
    let item = parse_token_data_stream_added(&event.args)?;

    let price_data_stream = Price_Data_Stream {
        id: composite_id(&item.token, &item.data_stream),
        token: item.token,
        data_stream: item.data_stream,
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.to_owned(),
    };

    Ok(Entity::Price_Data_Stream(price_data_stream))
}
