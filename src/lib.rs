#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

pub mod aggregation;
pub mod cache;
pub mod cli;
pub mod configuration;
pub mod controller;
pub mod custom_uint;
pub mod dao;
pub mod error;
pub mod handler;
pub mod helpers;
pub mod model;
pub mod provider;
pub mod query;
pub mod server;
pub mod types;
