//! Utility functions and helpers for the firecache offline layer.
//!
//! # Submodules
//!
//! - `logging`: Tracing subscriber initialization.
//! - `retry`: Connectivity probing with backoff for deferred sync.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
