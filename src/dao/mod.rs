mod memory;
mod postgre;
mod store;

pub use memory::MemoryStore;
pub use postgre::{
    get_path, read_migration, DBRow, DataBase, PoolOption, PoolType,
    MIGRATIONS,
};
pub use store::{Cursor, EntityStore, Order, ScanFilter};
