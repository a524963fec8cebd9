//! Inventory Forecast API Client
//!
//! This library wraps the remote inventory demand-forecast model service:
//! parameter normalization, uniform error classification, and
//! exponential-backoff retry for transient failures.

pub mod config;
pub mod models;
pub mod services;
