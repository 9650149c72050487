pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod report;
pub mod scrapers;
pub mod storage;
pub mod types;
