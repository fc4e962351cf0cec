//! The transport seam between the client façade and a live node.
//!
//! [`Connection`] owns one link to one node and the encoding of ledger calls
//! and storage reads. [`Connector`] opens connections for the client's
//! failover loop. The subxt-backed implementations live in [`crate::rpc`];
//! tests plug in stubs.

use async_trait::async_trait;
use subtensor_core::BlockHash;
use subxt::dynamic::Value;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::error::ChainError;
use crate::extrinsic::CallData;
use crate::queries::storage::{StorageItem, StorageMap};
use crate::submission::TxStatus;

/// A decoded storage value with type information stripped.
pub type StorageValue = Value<()>;

/// One `(raw key, value)` entry of an iterated storage map.
pub type StorageEntry = (Vec<u8>, StorageValue);

#[async_trait]
pub trait Connection: Send + Sync {
    /// The websocket URL this connection is bound to.
    fn endpoint(&self) -> &str;

    /// Read one storage entry. `None` means the key has no entry.
    async fn fetch(
        &self,
        item: &StorageItem,
        at: Option<BlockHash>,
    ) -> Result<Option<StorageValue>, ChainError>;

    /// Read every entry of a storage map.
    async fn iter(
        &self,
        map: StorageMap,
        at: Option<BlockHash>,
    ) -> Result<Vec<StorageEntry>, ChainError>;

    /// Number of the latest block, or of the block with hash `at`.
    async fn block_number(&self, at: Option<BlockHash>) -> Result<u64, ChainError>;

    async fn block_hash(&self, number: u64) -> Result<Option<BlockHash>, ChainError>;

    /// Next usable nonce for `account`, including transactions still in the pool.
    async fn account_nonce(&self, account: &AccountId32) -> Result<u64, ChainError>;

    /// Encode and sign `call` offline with an explicit nonce.
    fn sign(&self, call: &CallData, signer: &Keypair, nonce: u64) -> Result<Vec<u8>, ChainError>;

    /// Hand an encoded extrinsic to the node. Returns once the node accepted
    /// it into its pool; the watch reports later progress.
    async fn submit(&self, encoded: &[u8]) -> Result<Box<dyn TxWatch>, ChainError>;
}

/// Progress of one submitted extrinsic.
#[async_trait]
pub trait TxWatch: Send {
    /// Next status update. `None` once the node stops reporting.
    async fn next_status(&mut self) -> Option<Result<TxStatus, ChainError>>;
}

/// Opens connections to websocket URLs.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    async fn open(&self, url: &str) -> Result<Self::Connection, ChainError>;
}
