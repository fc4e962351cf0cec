//! Core domain types for the subtensor ledger client.
//!
//! This crate provides:
//! - Network names and shared enums (`types` module)
//! - Exact rao/tao balances (`balance` module)
//! - IP encoding used by peer records (`net` module)
//! - Client configuration (`config` module)
//!
//! With the `persistence` feature enabled the configuration can be loaded
//! from and saved to disk.

pub mod balance;
pub mod config;
pub mod net;
pub mod types;

pub use balance::*;
pub use config::*;
pub use net::*;
pub use types::*;
