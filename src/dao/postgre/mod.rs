pub use self::{
    path::{get_path, read_migration, MIGRATIONS},
    types::{DBRow, DataBase, PoolOption, PoolType},
};

mod basic_token_sender;
mod borrow_debt;
mod borrow_debt_crosschain;
mod checkpoint;
mod collateral_supply;
mod lending_pool;
mod liquidity_supply;
mod liquidity_withdraw;
mod path;
mod position;
mod price_data_stream;
mod repay_with_collateral;
mod types;
