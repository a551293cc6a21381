//! Database models module
//!
//! Entity structs live in models.rs; `Entity` wraps any of them for the
//! store and the query layer.

mod entity;
mod models;
mod table;

pub use entity::{Entity, EntityType};
pub use models::*;
pub use table::{Stored, Table};
