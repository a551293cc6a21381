use std::{fs, path::PathBuf};

use crate::error::Error;

/// Schema files, applied in this order.
pub const MIGRATIONS: [&str; 11] = [
    "lending_pool.sql",
    "position.sql",
    "liquidity_supply.sql",
    "liquidity_withdraw.sql",
    "collateral_supply.sql",
    "borrow_debt.sql",
    "borrow_debt_crosschain.sql",
    "repay_with_collateral.sql",
    "price_data_stream.sql",
    "basic_token_sender.sql",
    "checkpoint.sql",
];

pub fn get_path(dir: &str, file: &str) -> PathBuf {
    let mut buf = PathBuf::new();

    for chunk in [dir, "migration", "postgresql", file] {
        buf.push(chunk);
    }

    buf
}

pub fn read_migration(dir: &str, file: &str) -> Result<String, Error> {
    let data = fs::read_to_string(get_path(dir, file))?;
    Ok(data)
}
