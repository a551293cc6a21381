pub use self::{
    basic_token_sender_type::Basic_Token_Sender_Type,
    borrow_crosschain_type::Borrow_Crosschain_Type,
    chain_event::{Block_Events, Chain_Event},
    create_position_type::Create_Position_Type,
    lending_pool_created_type::Lending_Pool_Created_Type,
    pool_flow_type::Pool_Flow_Type,
    token_data_stream_type::Token_Data_Stream_Type,
};

mod basic_token_sender_type;
mod borrow_crosschain_type;
mod chain_event;
mod create_position_type;
mod lending_pool_created_type;
mod pool_flow_type;
mod token_data_stream_type;
