pub use self::{
    database::DatabasePool,
    endpoint_pool::{Endpoint, EndpointPool, EndpointStatus},
    feed::{EventFeed, ScriptedFeed},
    ingestor::{IngestOptions, IngestReport, Ingestor},
    rpc::RpcFeed,
};

mod database;
mod endpoint_pool;
mod feed;
mod ingestor;
mod rpc;
