//! cf-mysql: reach MySQL databases that live inside Cloud Foundry.
//!
//! Discovers bound database services through the v2 API, tunnels to them
//! through a running app with `cf ssh`, and starts the mysql clients.
//! Everything is re-exported for integration tests in `tests/`.

pub mod cf;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod mysql;
pub mod plugin;
pub mod tunnel;
