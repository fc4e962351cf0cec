//! Ledger client for the subtensor chain.
//!
//! This crate provides:
//! - Endpoint catalog and failover selection (`catalog`, `selector` modules)
//! - The connection seam and its subxt implementation (`connection`, `rpc` modules)
//! - `ChainClient` lifecycle, storage reads and submission (`client`, `queries` modules)
//! - Extrinsic composition and signing (`extrinsic`, `wallet`, `transactions` modules)

pub mod catalog;
pub mod client;
pub mod connection;
pub mod error;
pub mod extrinsic;
pub mod queries;
pub mod rpc;
pub mod selector;
pub mod submission;
pub mod transactions;
pub mod wallet;

pub use catalog::{NetworkCatalog, get_entrypoints, to_ws_url};
pub use client::*;
pub use connection::{Connection, Connector, StorageEntry, StorageValue, TxWatch};
pub use error::*;
pub use extrinsic::{CALL_SHAPES, CallData, CallShape, Extrinsic, ExtrinsicBuilder, KeyRole};
pub use queries::mapper::{PeerRecord, WeightVector};
pub use queries::storage::{StorageItem, StorageMap};
pub use rpc::{RpcConnection, RpcConnector};
pub use selector::{EndpointSelector, Resolution};
pub use submission::{SubmissionOutcome, TxStatus};
pub use transactions::Registration;
pub use wallet::Wallet;
