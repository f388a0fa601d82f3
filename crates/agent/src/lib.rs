//! Process wiring for the node telemetry agent
//!
//! Exposes the configuration layer, tracing setup and the health/metrics
//! HTTP API so the binary and the integration tests share them.

pub mod api;
pub mod config;
pub mod logging;
