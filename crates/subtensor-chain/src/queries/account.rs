//! Account-related chain queries.

use crate::ChainClient;
use crate::connection::Connector;
use crate::error::ChainError;
use crate::queries::mapper::decode_balance;
use crate::queries::storage::StorageItem;
use subtensor_core::Balance;
use subxt::utils::AccountId32;

impl<K: Connector> ChainClient<K> {
    /// Get the free balance of an account.
    ///
    /// An account with no record on chain holds nothing, so this returns
    /// [`Balance::ZERO`] rather than a not-found result.
    pub async fn get_balance(&mut self, account: &AccountId32) -> Result<Balance, ChainError> {
        let item = StorageItem::Account(account.clone());
        let Some(value) = self.query(&item, None).await? else {
            tracing::debug!("No account record for {}", account);
            return Ok(Balance::ZERO);
        };
        decode_balance(&value)
    }
}
