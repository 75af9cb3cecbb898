//! Node infrastructure for the sonar pingpong probe.
//!
//! - [`args`] - CLI argument structs
//! - [`cli`] - Top-level command line parser
//! - [`commands`] - `listen` and `ping` command implementations
//! - [`config`] - TOML configuration loading
//! - [`logging`] - Logging initialization
//! - [`metrics`] - Prometheus exporter
//! - [`network`] - libp2p swarm construction and event loop
//! - [`version`] - Version information

pub mod args;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod logging;
pub mod metrics;
pub mod network;
pub mod version;
