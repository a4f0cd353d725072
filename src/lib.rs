pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod server;
pub mod types;
