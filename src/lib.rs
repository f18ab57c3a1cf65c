// firecache - Offline-resilience layer for the forest-fire monitoring dashboard
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod models;
pub mod platform;
pub mod server;
pub mod strategy;
pub mod utils;
pub mod worker;
