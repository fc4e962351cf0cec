//! Block queries.

use crate::ChainClient;
use crate::connection::Connector;
use crate::error::ChainError;
use subtensor_core::BlockHash;

impl<K: Connector> ChainClient<K> {
    /// Get the current block number on the chain.
    pub async fn get_current_block(&mut self) -> Result<u64, ChainError> {
        self.fetch_block_number(None).await
    }

    /// Get the hash of block `number`, if the chain has produced it.
    pub async fn get_block_hash(&mut self, number: u64) -> Result<Option<BlockHash>, ChainError> {
        self.fetch_block_hash(number).await
    }

    /// Get the number of the block with `hash`.
    pub async fn get_block_number(&mut self, hash: BlockHash) -> Result<u64, ChainError> {
        self.fetch_block_number(Some(hash)).await
    }
}
